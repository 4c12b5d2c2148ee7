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

//! In-memory NATS Streaming: per-channel sequences, manual acks, and an
//! outage toggle for failure-path tests.

use async_trait::async_trait;
use bridge_core::config::StanConfig;
use bridge_core::nats::{
    NatsConnection, StanAcker, StanClient, StanConnection, StanMessage, StanMessageHandler,
    StanSubscription, StanSubscriptionOptions,
};
use bridge_core::BridgeError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory stand-in for the STAN client library.
pub struct MemoryStanServer {
    available: Arc<AtomicBool>,
    connections: Mutex<Vec<Arc<MemoryStanConnection>>>,
}

impl MemoryStanServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            available: Arc::new(AtomicBool::new(true)),
            connections: Mutex::new(Vec::new()),
        })
    }

    /// Toggles a simulated outage: while unavailable every publish fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn last_connection(&self) -> Option<Arc<MemoryStanConnection>> {
        self.connections.lock().await.last().cloned()
    }
}

#[async_trait]
impl StanClient for MemoryStanServer {
    async fn connect(
        &self,
        _config: &StanConfig,
        _nats: Arc<dyn NatsConnection>,
    ) -> Result<Arc<dyn StanConnection>, BridgeError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(BridgeError::Connect("stan server unavailable".into()));
        }
        let connection = Arc::new(MemoryStanConnection {
            available: self.available.clone(),
            sequences: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            acked: Arc::new(Mutex::new(Vec::new())),
        });
        self.connections.lock().await.push(connection.clone());
        Ok(connection)
    }
}

struct StanSubEntry {
    id: usize,
    channel: String,
    options: StanSubscriptionOptions,
    handler: Arc<dyn StanMessageHandler>,
}

/// One live STAN connection.
pub struct MemoryStanConnection {
    available: Arc<AtomicBool>,
    sequences: Mutex<HashMap<String, u64>>,
    next_id: AtomicUsize,
    subscriptions: Arc<Mutex<Vec<StanSubEntry>>>,
    acked: Arc<Mutex<Vec<(String, u64)>>>,
}

impl MemoryStanConnection {
    /// Channel/sequence pairs acknowledged by manual-ack subscribers.
    pub async fn acked(&self) -> Vec<(String, u64)> {
        self.acked.lock().await.clone()
    }
}

#[async_trait]
impl StanConnection for MemoryStanConnection {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), BridgeError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(BridgeError::Publish("stan server unavailable".into()));
        }

        let sequence = {
            let mut sequences = self.sequences.lock().await;
            let next = sequences.entry(channel.to_string()).or_insert(0);
            *next += 1;
            *next
        };

        let targets: Vec<(Arc<dyn StanMessageHandler>, bool)> = {
            let subscriptions = self.subscriptions.lock().await;
            subscriptions
                .iter()
                .filter(|entry| entry.channel == channel)
                .map(|entry| (entry.handler.clone(), entry.options.manual_acks))
                .collect()
        };

        for (handler, manual_acks) in targets {
            let acker: Option<Arc<dyn StanAcker>> = manual_acks.then(|| {
                Arc::new(MemoryStanAcker {
                    channel: channel.to_string(),
                    acked: self.acked.clone(),
                }) as Arc<dyn StanAcker>
            });
            handler
                .on_message(StanMessage::new(sequence, payload.to_vec(), acker))
                .await;
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        options: StanSubscriptionOptions,
        handler: Arc<dyn StanMessageHandler>,
    ) -> Result<Arc<dyn StanSubscription>, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions.lock().await.push(StanSubEntry {
            id,
            channel: channel.to_string(),
            options,
            handler,
        });
        Ok(Arc::new(MemoryStanSubscription {
            subscriptions: self.subscriptions.clone(),
            id,
        }))
    }

    async fn close(&self) {}
}

struct MemoryStanAcker {
    channel: String,
    acked: Arc<Mutex<Vec<(String, u64)>>>,
}

#[async_trait]
impl StanAcker for MemoryStanAcker {
    async fn ack(&self, sequence: u64) -> Result<(), BridgeError> {
        self.acked.lock().await.push((self.channel.clone(), sequence));
        Ok(())
    }
}

struct MemoryStanSubscription {
    subscriptions: Arc<Mutex<Vec<StanSubEntry>>>,
    id: usize,
}

#[async_trait]
impl StanSubscription for MemoryStanSubscription {
    async fn unsubscribe(&self) -> Result<(), BridgeError> {
        self.subscriptions
            .lock()
            .await
            .retain(|entry| entry.id != self.id);
        Ok(())
    }
}
