/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! # bridge-stats
//!
//! Statistics primitives for the bridge: a bounded-memory streaming
//! approximate [`Histogram`] for latency distributions and the per-connector
//! counter record [`ConnectorStats`] aggregated by the supervisor into
//! [`BridgeStats`].

mod histogram;
mod stats;

pub use histogram::{Bin, Histogram};
pub use stats::{BridgeStats, ConnectorStats, REQUEST_TIME_BINS};
