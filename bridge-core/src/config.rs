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

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};

/// Process-wide bridge configuration: the two broker blocks plus the declared
/// connectors.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub nats: NatsConfig,
    pub stan: StanConfig,
    #[serde(default)]
    pub connect: Vec<ConnectorConfig>,
}

impl BridgeConfig {
    /// Loads a configuration from a JSON5 file.
    pub fn load(path: &str) -> Result<Self, BridgeError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| BridgeError::Config(format!("unable to read {path}: {err}")))?;
        Self::parse(&contents)
    }

    /// Parses a configuration from a JSON5 string.
    pub fn parse(contents: &str) -> Result<Self, BridgeError> {
        json5::from_str(contents).map_err(|err| BridgeError::Config(err.to_string()))
    }
}

/// NATS core connection options.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct NatsConfig {
    pub servers: Vec<String>,
    #[serde(default = "default_max_reconnects")]
    pub max_reconnects: i32,
    #[serde(default = "default_reconnect_wait_ms")]
    pub reconnect_wait_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_max_reconnects() -> i32 {
    60
}

fn default_reconnect_wait_ms() -> u64 {
    2000
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            max_reconnects: default_max_reconnects(),
            reconnect_wait_ms: default_reconnect_wait_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// NATS Streaming connection options, nested on the core connection.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct StanConfig {
    pub cluster_id: String,
    pub client_id: String,
    #[serde(default = "default_pub_ack_wait_ms")]
    pub pub_ack_wait_ms: u64,
    #[serde(default = "default_max_pub_acks_inflight")]
    pub max_pub_acks_inflight: usize,
    #[serde(default = "default_connect_wait_ms")]
    pub connect_wait_ms: u64,
    #[serde(default)]
    pub discover_prefix: String,
}

fn default_pub_ack_wait_ms() -> u64 {
    5000
}

fn default_max_pub_acks_inflight() -> usize {
    16384
}

fn default_connect_wait_ms() -> u64 {
    2000
}

impl Default for StanConfig {
    fn default() -> Self {
        Self {
            cluster_id: String::new(),
            client_id: String::new(),
            pub_ack_wait_ms: default_pub_ack_wait_ms(),
            max_pub_acks_inflight: default_max_pub_acks_inflight(),
            connect_wait_ms: default_connect_wait_ms(),
            discover_prefix: String::new(),
        }
    }
}

/// The six supported input/output pairings.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    #[serde(rename = "Queue2NATS", alias = "Queue2Nats")]
    Queue2Nats,
    #[serde(rename = "Queue2STAN", alias = "Queue2Stan")]
    Queue2Stan,
    #[serde(rename = "NATS2Queue", alias = "Nats2Queue")]
    Nats2Queue,
    #[serde(rename = "Stan2Queue", alias = "STAN2Queue")]
    Stan2Queue,
    #[serde(rename = "Topic2NATS", alias = "Topic2Nats")]
    Topic2Nats,
    #[serde(rename = "Topic2STAN", alias = "Topic2Stan")]
    Topic2Stan,
}

/// One declared connector: the endpoint on each side plus conversion and
/// subscription options.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConnectorConfig {
    #[serde(rename = "type")]
    pub kind: ConnectorKind,
    /// Stable id for stats; generated when empty.
    #[serde(default)]
    pub id: String,
    /// NATS subject (NATS-side endpoint of NATS connectors).
    #[serde(default)]
    pub subject: String,
    /// STAN channel (STAN-side endpoint of STAN connectors).
    #[serde(default)]
    pub channel: String,
    /// MQ queue name (MQ-side endpoint of queue connectors).
    #[serde(default)]
    pub queue: String,
    /// MQ topic string (MQ-side endpoint of topic connectors).
    #[serde(default)]
    pub topic: String,
    /// When set the envelope is skipped: raw payloads cross the bridge and
    /// descriptor plus properties are dropped.
    #[serde(default)]
    pub exclude_headers: bool,
    #[serde(default)]
    pub durable_name: String,
    #[serde(default)]
    pub start_at_sequence: Option<u64>,
    #[serde(default)]
    pub deliver_all_available: bool,
    #[serde(default)]
    pub mq: MqConfig,
}

/// Connection block for one MQ queue manager.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct MqConfig {
    #[serde(default)]
    pub queue_manager: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub connection_name: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
    /// Reserved for future use; the read path currently relies on the
    /// client library's wait interval.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::{BridgeConfig, ConnectorKind};

    const EXAMPLE: &str = r#"{
        nats: {
            servers: ["nats://localhost:4222"],
            max_reconnects: 5,
            reconnect_wait_ms: 1000,
            connect_timeout_ms: 5000,
        },
        stan: {
            cluster_id: "test-cluster",
            client_id: "mq-bridge",
        },
        connect: [
            {
                type: "Topic2STAN",
                channel: "test",
                topic: "dev/",
                exclude_headers: true,
                mq: {
                    queue_manager: "QM1",
                    channel_name: "DEV.APP.SVRCONN",
                    connection_name: "localhost(1414)",
                },
            },
        ],
    }"#;

    #[test]
    fn parses_a_full_configuration() {
        let config = BridgeConfig::parse(EXAMPLE).unwrap();
        assert_eq!(config.nats.servers.len(), 1);
        assert_eq!(config.stan.cluster_id, "test-cluster");
        assert_eq!(config.connect.len(), 1);

        let connector = &config.connect[0];
        assert_eq!(connector.kind, ConnectorKind::Topic2Stan);
        assert!(connector.exclude_headers);
        assert_eq!(connector.mq.queue_manager, "QM1");
        assert!(connector.mq.read_timeout_ms.is_none());
    }

    #[test]
    fn unknown_connector_type_is_a_config_error() {
        let bad = r#"{
            nats: { servers: [] },
            stan: { cluster_id: "c", client_id: "i" },
            connect: [ { type: "Queue2Kafka" } ],
        }"#;
        assert!(BridgeConfig::parse(bad).is_err());
    }

    #[test]
    fn stan_defaults_apply_when_omitted() {
        let minimal = r#"{
            nats: { servers: ["nats://localhost:4222"] },
            stan: { cluster_id: "c", client_id: "i" },
        }"#;
        let config = BridgeConfig::parse(minimal).unwrap();
        assert_eq!(config.stan.pub_ack_wait_ms, 5000);
        assert_eq!(config.stan.max_pub_acks_inflight, 16384);
        assert_eq!(config.nats.max_reconnects, 60);
        assert!(config.connect.is_empty());
    }
}
