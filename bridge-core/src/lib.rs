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

//! # bridge-core
//!
//! `bridge-core` moves messages between an MQ-style broker and NATS (core or
//! streaming). A [`Bridge`] supervisor owns the shared NATS and STAN
//! connections and a set of [`Connector`]s, each pinning one endpoint on each
//! side; connectors convert between the broker's descriptor-plus-handle
//! representation and the wire envelope from `bridge-message`.
//!
//! The broker client libraries are consumed through trait seams ([`mq`],
//! [`nats`]) injected into [`Bridge::new`]; production wiring supplies the
//! vendor clients, tests supply in-memory implementations.
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events. Library code emits
//! events/spans and does not unconditionally initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

pub mod config;
pub mod connectors;
pub mod convert;
pub mod mq;
pub mod nats;

mod bridge;
mod error;
mod observability;

pub use bridge::{Bridge, BridgeRuntime};
pub use config::{BridgeConfig, ConnectorConfig, ConnectorKind, MqConfig, NatsConfig, StanConfig};
pub use connectors::{Connector, ConnectorState};
pub use error::BridgeError;
