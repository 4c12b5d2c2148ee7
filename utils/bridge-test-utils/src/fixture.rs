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

use crate::mq_server::{MemoryMqServer, StoredMessage};
use crate::nats_server::MemoryNatsServer;
use crate::stan_server::MemoryStanServer;
use bridge_core::config::{BridgeConfig, ConnectorConfig, NatsConfig, StanConfig};
use bridge_core::mq::MqMessageDescriptor;
use bridge_core::nats::{NatsConnection, StanConnection};
use bridge_core::{Bridge, BridgeError, BridgeRuntime};
use std::sync::Arc;

/// A full bridge over in-memory brokers, for end-to-end scenarios.
pub struct TestFixture {
    pub mq: Arc<MemoryMqServer>,
    pub nats_server: Arc<MemoryNatsServer>,
    pub stan_server: Arc<MemoryStanServer>,
    pub bridge: Arc<Bridge>,
}

impl TestFixture {
    /// A configuration wired for the in-memory brokers.
    pub fn config_for(connectors: Vec<ConnectorConfig>) -> BridgeConfig {
        BridgeConfig {
            nats: NatsConfig {
                servers: vec!["memory://localhost:4222".to_string()],
                ..NatsConfig::default()
            },
            stan: StanConfig {
                cluster_id: "test-cluster".to_string(),
                client_id: "mq-bridge-test".to_string(),
                ..StanConfig::default()
            },
            connect: connectors,
        }
    }

    /// Builds the brokers, creates a supervisor over them and starts it.
    pub async fn start(connectors: Vec<ConnectorConfig>) -> Result<Self, BridgeError> {
        let mq = MemoryMqServer::new();
        let nats_server = MemoryNatsServer::new();
        let stan_server = MemoryStanServer::new();

        let bridge = Bridge::new(
            Self::config_for(connectors),
            mq.clone(),
            nats_server.clone(),
            stan_server.clone(),
        );
        bridge.start().await?;

        Ok(Self {
            mq,
            nats_server,
            stan_server,
            bridge,
        })
    }

    /// The bridge's NATS connection; panics when the bridge is not running.
    pub async fn nats(&self) -> Arc<dyn NatsConnection> {
        self.bridge.nats().await.expect("nats connection is up")
    }

    /// The bridge's STAN connection; panics when the bridge is not running.
    pub async fn stan(&self) -> Arc<dyn StanConnection> {
        self.bridge.stan().await.expect("stan connection is up")
    }

    pub async fn put_message_on_queue(
        &self,
        queue: &str,
        descriptor: MqMessageDescriptor,
        payload: &[u8],
    ) {
        self.mq.put_on_queue(queue, descriptor, Vec::new(), payload).await;
    }

    pub async fn put_message_on_topic(
        &self,
        topic: &str,
        descriptor: MqMessageDescriptor,
        payload: &[u8],
    ) {
        self.mq.put_on_topic(topic, descriptor, Vec::new(), payload).await;
    }

    pub async fn browse_queue(&self, queue: &str) -> Vec<StoredMessage> {
        self.mq.browse_queue(queue).await
    }

    /// Simulates the NATS server going away for good, which fires the
    /// connection's closed event.
    pub async fn simulate_nats_connection_loss(&self) {
        if let Some(connection) = self.nats_server.last_connection().await {
            connection.drop_from_server().await;
        }
    }

    /// Toggles the simulated STAN outage.
    pub fn set_stan_available(&self, available: bool) {
        self.stan_server.set_available(available);
    }

    pub async fn close(&self) {
        self.bridge.stop().await;
    }
}
