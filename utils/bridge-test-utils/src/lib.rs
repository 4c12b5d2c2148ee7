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

//! # bridge-test-utils
//!
//! In-memory implementations of the bridge's broker seams, plus a
//! [`TestFixture`] that wires a full supervisor over them. Used by the
//! integration suites; behavior mimics the real brokers closely enough for
//! end-to-end scenarios (sync-point requeue on backout, manual STAN acks,
//! put-date/put-time stamping, connection-loss events).

mod fixture;
mod mq_server;
mod nats_server;
mod stan_server;

pub use fixture::TestFixture;
pub use mq_server::{MemoryMqServer, StoredMessage};
pub use nats_server::{MemoryNatsConnection, MemoryNatsServer};
pub use stan_server::{MemoryStanConnection, MemoryStanServer};
