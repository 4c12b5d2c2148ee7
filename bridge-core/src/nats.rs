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

//! Trait seams over the NATS core and NATS Streaming client libraries.
//!
//! Consumed as plain pub/sub with connection-event callbacks; the supervisor
//! owns one connection of each kind and shares them across connectors.

use crate::config::{NatsConfig, StanConfig};
use crate::error::BridgeError;
use async_trait::async_trait;
use std::sync::Arc;

/// One message delivered by a NATS subscription.
#[derive(Debug, Clone)]
pub struct NatsMessage {
    pub subject: String,
    /// Reply subject; empty when the publisher did not set one.
    pub reply: String,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait NatsMessageHandler: Send + Sync {
    async fn on_message(&self, msg: NatsMessage);
}

/// Connection-event callbacks registered at connect time. All default to
/// no-ops so implementors override only what they watch.
#[async_trait]
pub trait NatsEventHandler: Send + Sync {
    async fn on_error(&self, _err: String) {}
    async fn on_discovered_servers(&self, _servers: Vec<String>) {}
    async fn on_disconnected(&self) {}
    async fn on_reconnected(&self) {}
    async fn on_closed(&self) {}
}

#[async_trait]
pub trait NatsSubscription: Send + Sync {
    async fn unsubscribe(&self) -> Result<(), BridgeError>;
}

/// A NATS core connection. Publish and subscribe are safe to call
/// concurrently; handlers run on the client's dispatcher.
#[async_trait]
pub trait NatsConnection: Send + Sync {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), BridgeError>;

    async fn subscribe(
        &self,
        subject: &str,
        handler: Arc<dyn NatsMessageHandler>,
    ) -> Result<Arc<dyn NatsSubscription>, BridgeError>;

    fn is_connected(&self) -> bool;

    async fn close(&self);
}

/// Entry point into the NATS client library.
#[async_trait]
pub trait NatsClient: Send + Sync {
    async fn connect(
        &self,
        config: &NatsConfig,
        events: Arc<dyn NatsEventHandler>,
    ) -> Result<Arc<dyn NatsConnection>, BridgeError>;
}

/// Subscription options for a STAN channel.
#[derive(Debug, Clone, Default)]
pub struct StanSubscriptionOptions {
    pub durable_name: Option<String>,
    pub start_at_sequence: Option<u64>,
    pub deliver_all_available: bool,
    /// When set the subscriber acknowledges explicitly via
    /// [`StanMessage::ack`].
    pub manual_acks: bool,
}

/// Acknowledgement path handed to manual-ack subscribers.
#[async_trait]
pub trait StanAcker: Send + Sync {
    async fn ack(&self, sequence: u64) -> Result<(), BridgeError>;
}

/// One message delivered by a STAN subscription.
pub struct StanMessage {
    pub sequence: u64,
    pub payload: Vec<u8>,
    acker: Option<Arc<dyn StanAcker>>,
}

impl StanMessage {
    pub fn new(sequence: u64, payload: Vec<u8>, acker: Option<Arc<dyn StanAcker>>) -> Self {
        Self {
            sequence,
            payload,
            acker,
        }
    }

    /// Acknowledges this delivery. A no-op for auto-ack subscriptions.
    pub async fn ack(&self) -> Result<(), BridgeError> {
        match &self.acker {
            Some(acker) => acker.ack(self.sequence).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
pub trait StanMessageHandler: Send + Sync {
    async fn on_message(&self, msg: StanMessage);
}

#[async_trait]
pub trait StanSubscription: Send + Sync {
    async fn unsubscribe(&self) -> Result<(), BridgeError>;
}

/// A NATS Streaming connection, nested on a core connection.
#[async_trait]
pub trait StanConnection: Send + Sync {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), BridgeError>;

    async fn subscribe(
        &self,
        channel: &str,
        options: StanSubscriptionOptions,
        handler: Arc<dyn StanMessageHandler>,
    ) -> Result<Arc<dyn StanSubscription>, BridgeError>;

    async fn close(&self);
}

/// Entry point into the STAN client library.
#[async_trait]
pub trait StanClient: Send + Sync {
    async fn connect(
        &self,
        config: &StanConfig,
        nats: Arc<dyn NatsConnection>,
    ) -> Result<Arc<dyn StanConnection>, BridgeError>;
}
