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

//! The per-connector state machines.
//!
//! A connector pins one endpoint on each side and moves every message from
//! its input to its output. MQ-side inputs are callback-driven through the
//! queue manager's dispatcher; NATS/STAN-side inputs are subscription-driven.
//! Both collapse into the same convert-then-publish path, executed under the
//! connector's lock so the sync-point pairing stays sequential.

mod base;
mod nats2queue;
mod queue2nats;
mod queue2stan;
mod stan2queue;
mod topic2nats;
mod topic2stan;

pub use nats2queue::Nats2QueueConnector;
pub use queue2nats::Queue2NatsConnector;
pub use queue2stan::Queue2StanConnector;
pub use stan2queue::Stan2QueueConnector;
pub use topic2nats::Topic2NatsConnector;
pub use topic2stan::Topic2StanConnector;

use crate::bridge::BridgeRuntime;
use crate::config::{ConnectorConfig, ConnectorKind};
use crate::error::BridgeError;
use async_trait::async_trait;
use bridge_stats::ConnectorStats;
use std::fmt;
use std::sync::Arc;

/// Lifecycle states of a connector.
///
/// `start` is valid from `New` or `Stopped`; `shutdown` from `Running` or
/// `Starting` and is a no-op from anywhere else. Transitions are guarded by
/// the connector's lock, so concurrent starts and shutdowns serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    New,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// One input-side / output-side pairing with its own lifecycle and
/// statistics.
#[async_trait]
pub trait Connector: fmt::Display + Send + Sync {
    /// Opens the MQ handles and registers the callback or subscription.
    async fn start(&self) -> Result<(), BridgeError>;

    /// Releases everything `start` acquired, in reverse order. Idempotent.
    async fn shutdown(&self) -> Result<(), BridgeError>;

    /// Reports whether this connector's NATS or STAN prerequisite is
    /// currently satisfied.
    async fn check_connections(&self) -> Result<(), BridgeError>;

    /// Value copy of the current statistics.
    async fn stats(&self) -> ConnectorStats;

    async fn state(&self) -> ConnectorState;

    fn config(&self) -> &ConnectorConfig;
}

/// Builds the connector for a configuration entry. Unrepresentable connector
/// types are rejected earlier, when the configuration is parsed.
pub fn create_connector(
    bridge: Arc<dyn BridgeRuntime>,
    config: ConnectorConfig,
) -> Arc<dyn Connector> {
    match config.kind {
        ConnectorKind::Queue2Nats => Queue2NatsConnector::new(bridge, config),
        ConnectorKind::Queue2Stan => Queue2StanConnector::new(bridge, config),
        ConnectorKind::Nats2Queue => Nats2QueueConnector::new(bridge, config),
        ConnectorKind::Stan2Queue => Stan2QueueConnector::new(bridge, config),
        ConnectorKind::Topic2Nats => Topic2NatsConnector::new(bridge, config),
        ConnectorKind::Topic2Stan => Topic2StanConnector::new(bridge, config),
    }
}
