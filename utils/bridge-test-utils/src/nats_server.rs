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

//! In-memory NATS core: exact-subject fan-out with connection events.

use async_trait::async_trait;
use bridge_core::config::NatsConfig;
use bridge_core::nats::{
    NatsClient, NatsConnection, NatsEventHandler, NatsMessage, NatsMessageHandler,
    NatsSubscription,
};
use bridge_core::BridgeError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory stand-in for the NATS client library.
pub struct MemoryNatsServer {
    connections: Mutex<Vec<Arc<MemoryNatsConnection>>>,
}

impl MemoryNatsServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(Vec::new()),
        })
    }

    pub async fn last_connection(&self) -> Option<Arc<MemoryNatsConnection>> {
        self.connections.lock().await.last().cloned()
    }
}

#[async_trait]
impl NatsClient for MemoryNatsServer {
    async fn connect(
        &self,
        _config: &NatsConfig,
        events: Arc<dyn NatsEventHandler>,
    ) -> Result<Arc<dyn NatsConnection>, BridgeError> {
        let connection = Arc::new(MemoryNatsConnection {
            connected: AtomicBool::new(true),
            next_id: AtomicUsize::new(0),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            events,
        });
        self.connections.lock().await.push(connection.clone());
        Ok(connection)
    }
}

struct SubEntry {
    id: usize,
    subject: String,
    handler: Arc<dyn NatsMessageHandler>,
}

/// One live connection. Delivery is serial per publish, preserving order.
pub struct MemoryNatsConnection {
    connected: AtomicBool,
    next_id: AtomicUsize,
    subscriptions: Arc<Mutex<Vec<SubEntry>>>,
    events: Arc<dyn NatsEventHandler>,
}

impl MemoryNatsConnection {
    /// Simulates the server dropping the connection for good: marks it closed
    /// and fires the closed event, as the client library does after
    /// exhausting its reconnects.
    pub async fn drop_from_server(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.events.on_closed().await;
        }
    }
}

#[async_trait]
impl NatsConnection for MemoryNatsConnection {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), BridgeError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(BridgeError::Publish("nats connection is closed".into()));
        }
        let handlers: Vec<Arc<dyn NatsMessageHandler>> = {
            let subscriptions = self.subscriptions.lock().await;
            subscriptions
                .iter()
                .filter(|entry| entry.subject == subject)
                .map(|entry| entry.handler.clone())
                .collect()
        };
        for handler in handlers {
            handler
                .on_message(NatsMessage {
                    subject: subject.to_string(),
                    reply: String::new(),
                    payload: payload.to_vec(),
                })
                .await;
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        subject: &str,
        handler: Arc<dyn NatsMessageHandler>,
    ) -> Result<Arc<dyn NatsSubscription>, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions.lock().await.push(SubEntry {
            id,
            subject: subject.to_string(),
            handler,
        });
        Ok(Arc::new(MemoryNatsSubscription {
            subscriptions: self.subscriptions.clone(),
            id,
        }))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.events.on_closed().await;
        }
    }
}

struct MemoryNatsSubscription {
    subscriptions: Arc<Mutex<Vec<SubEntry>>>,
    id: usize,
}

#[async_trait]
impl NatsSubscription for MemoryNatsSubscription {
    async fn unsubscribe(&self) -> Result<(), BridgeError> {
        self.subscriptions
            .lock()
            .await
            .retain(|entry| entry.id != self.id);
        Ok(())
    }
}
