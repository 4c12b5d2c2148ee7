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

//! The process-wide supervisor.
//!
//! A [`Bridge`] owns the shared NATS and STAN connections and the configured
//! connectors. It is created once, started once and stopped once; a stop
//! triggered from the NATS closed callback is dispatched on its own task so
//! the callback never re-enters the supervisor lock.

use crate::config::BridgeConfig;
use crate::connectors::{self, Connector};
use crate::error::BridgeError;
use crate::mq::MqClient;
use crate::nats::{NatsClient, NatsConnection, NatsEventHandler, StanClient, StanConnection};
use crate::observability as events;
use async_trait::async_trait;
use bridge_stats::BridgeStats;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// The surface connectors use to reach back into the supervisor: shared
/// connection handles, the MQ client entry point and error escalation.
#[async_trait]
pub trait BridgeRuntime: Send + Sync {
    async fn nats(&self) -> Option<Arc<dyn NatsConnection>>;

    async fn stan(&self) -> Option<Arc<dyn StanConnection>>;

    /// True iff the NATS connection exists and is currently connected.
    async fn check_nats(&self) -> bool;

    fn mq_client(&self) -> Arc<dyn MqClient>;

    /// Escalates a fatal connector error. Logs and schedules an asynchronous
    /// supervisor stop; safe to call from a message callback.
    async fn connector_error(&self, connector: &str, err: BridgeError);
}

#[derive(Default)]
struct Connections {
    nats: Option<Arc<dyn NatsConnection>>,
    stan: Option<Arc<dyn StanConnection>>,
}

/// Coordinator owning the broker connections and the connector set.
pub struct Bridge {
    config: BridgeConfig,
    mq_client: Arc<dyn MqClient>,
    nats_client: Arc<dyn NatsClient>,
    stan_client: Arc<dyn StanClient>,
    weak_self: Weak<Bridge>,
    running: AtomicBool,
    start_time: AtomicI64,
    // Connection handles live outside the lifecycle lock so message handlers
    // can read them while a stop is shutting connectors down.
    connections: RwLock<Connections>,
    // Serializes start and stop; holds the connector set.
    lifecycle: Mutex<Vec<Arc<dyn Connector>>>,
}

impl Bridge {
    /// Creates a supervisor from a configuration and the three injected
    /// client libraries.
    pub fn new(
        config: BridgeConfig,
        mq_client: Arc<dyn MqClient>,
        nats_client: Arc<dyn NatsClient>,
        stan_client: Arc<dyn StanClient>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            config,
            mq_client,
            nats_client,
            stan_client,
            weak_self: weak.clone(),
            running: AtomicBool::new(false),
            start_time: AtomicI64::new(0),
            connections: RwLock::new(Connections::default()),
            lifecycle: Mutex::new(Vec::new()),
        })
    }

    /// Connects to NATS then STAN, instantiates the configured connectors and
    /// starts each one.
    ///
    /// A connector failure aborts the start and is returned to the caller;
    /// connectors started before the failure stay up until [`Bridge::stop`].
    pub async fn start(&self) -> Result<(), BridgeError> {
        let mut connectors = self.lifecycle.lock().await;
        if self.running.load(Ordering::SeqCst) || !connectors.is_empty() {
            return Err(BridgeError::Lifecycle(
                "bridge has already been started".into(),
            ));
        }

        info!(event = events::BRIDGE_START, "connecting to NATS core");
        let relay: Arc<dyn NatsEventHandler> = Arc::new(ConnectionEventRelay {
            bridge: self.weak_self.clone(),
        });
        let nats = self.nats_client.connect(&self.config.nats, relay).await?;
        info!(
            event = events::NATS_CONNECTED,
            servers = self.config.nats.servers.join(",").as_str(),
            "connected to NATS core"
        );

        info!("connecting to NATS streaming");
        let stan = self
            .stan_client
            .connect(&self.config.stan, nats.clone())
            .await?;
        info!(
            event = events::STAN_CONNECTED,
            cluster_id = self.config.stan.cluster_id.as_str(),
            "connected to NATS streaming"
        );

        {
            let mut connections = self.connections.write().await;
            connections.nats = Some(nats);
            connections.stan = Some(stan);
        }

        let runtime: Arc<dyn BridgeRuntime> = self
            .weak_self
            .upgrade()
            .ok_or_else(|| BridgeError::Lifecycle("supervisor has been dropped".into()))?;
        for connector_config in &self.config.connect {
            connectors.push(connectors::create_connector(
                runtime.clone(),
                connector_config.clone(),
            ));
        }

        for connector in connectors.iter() {
            connector.start().await?;
        }

        self.start_time
            .store(chrono::Utc::now().timestamp(), Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        info!(
            event = events::BRIDGE_START_OK,
            connectors = connectors.len(),
            "bridge running"
        );
        Ok(())
    }

    /// Shuts every connector down, then closes STAN and NATS. Connector
    /// errors are logged without aborting the rest. Idempotent; concurrent
    /// stops serialize on the lifecycle lock.
    pub async fn stop(&self) {
        let connectors = self.lifecycle.lock().await;
        self.running.store(false, Ordering::SeqCst);
        info!(event = events::BRIDGE_STOP, "stopping bridge");

        for connector in connectors.iter() {
            if let Err(err) = connector.shutdown().await {
                warn!(
                    connector = %connector,
                    err = %err,
                    "error shutting down connector"
                );
            }
        }

        let (stan, nats) = {
            let mut connections = self.connections.write().await;
            (connections.stan.take(), connections.nats.take())
        };
        if let Some(stan) = stan {
            stan.close().await;
        }
        if let Some(nats) = nats {
            nats.close().await;
        }

        info!(event = events::BRIDGE_STOP_OK, "bridge stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The connectors this supervisor created, in configuration order.
    pub async fn connectors(&self) -> Vec<Arc<dyn Connector>> {
        self.lifecycle.lock().await.clone()
    }

    /// Aggregates a value-copied statistics snapshot from every connector.
    pub async fn stats(&self) -> BridgeStats {
        let connectors = self.lifecycle.lock().await;
        let mut stats = BridgeStats {
            start_time: self.start_time.load(Ordering::SeqCst),
            connectors: Vec::with_capacity(connectors.len()),
        };
        for connector in connectors.iter() {
            stats.connectors.push(connector.stats().await);
        }
        stats
    }

    // Clears the running flag first so repeated triggers are idempotent, then
    // runs the stop on its own task: the caller may be a connection callback
    // that must not re-enter the lifecycle lock.
    fn schedule_stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            if let Some(bridge) = self.weak_self.upgrade() {
                tokio::spawn(async move {
                    bridge.stop().await;
                });
            }
        }
    }
}

#[async_trait]
impl BridgeRuntime for Bridge {
    async fn nats(&self) -> Option<Arc<dyn NatsConnection>> {
        self.connections.read().await.nats.clone()
    }

    async fn stan(&self) -> Option<Arc<dyn StanConnection>> {
        self.connections.read().await.stan.clone()
    }

    async fn check_nats(&self) -> bool {
        self.connections
            .read()
            .await
            .nats
            .as_ref()
            .map(|nats| nats.is_connected())
            .unwrap_or(false)
    }

    fn mq_client(&self) -> Arc<dyn MqClient> {
        self.mq_client.clone()
    }

    async fn connector_error(&self, connector: &str, err: BridgeError) {
        error!(
            event = events::CONNECTOR_ERROR,
            connector,
            err = %err,
            "fatal connector error, shutting down bridge"
        );
        self.schedule_stop();
    }
}

/// Receives the NATS connection events registered at connect time.
struct ConnectionEventRelay {
    bridge: Weak<Bridge>,
}

#[async_trait]
impl NatsEventHandler for ConnectionEventRelay {
    async fn on_error(&self, err: String) {
        error!(err = err.as_str(), "nats error");
    }

    async fn on_discovered_servers(&self, servers: Vec<String>) {
        debug!(servers = servers.join(",").as_str(), "discovered servers");
    }

    async fn on_disconnected(&self) {
        let Some(bridge) = self.bridge.upgrade() else {
            return;
        };
        // Skip the lock; worst case we log something extra during a stop.
        if bridge.is_running() {
            debug!(event = events::NATS_DISCONNECTED, "nats connection disconnected");
        }
    }

    async fn on_reconnected(&self) {
        debug!(event = events::NATS_RECONNECTED, "nats connection reconnected");
    }

    async fn on_closed(&self) {
        let Some(bridge) = self.bridge.upgrade() else {
            return;
        };
        if bridge.is_running() {
            debug!(
                event = events::NATS_CLOSED,
                "nats connection closed, shutting down bridge"
            );
            bridge.schedule_stop();
        }
    }
}
