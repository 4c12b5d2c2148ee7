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

//! State and message paths shared by every connector variant.

use crate::bridge::BridgeRuntime;
use crate::config::ConnectorConfig;
use crate::connectors::{Connector, ConnectorState};
use crate::convert::{bridge_message_to_mq, mq_to_bridge_message};
use crate::error::BridgeError;
use crate::mq::{
    MqCallbackError, MqDelivery, MqDispatchControl, MqMessageListener, MqObject, MqPutOptions,
    QueueManager,
};
use crate::nats::{
    NatsMessage, NatsMessageHandler, NatsSubscription, StanMessage, StanMessageHandler,
    StanSubscription,
};
use crate::observability as events;
use async_trait::async_trait;
use bridge_stats::ConnectorStats;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Handles a connector owns while running; released in reverse order on
/// shutdown.
pub(crate) struct ConnectorRuntime {
    pub state: ConnectorState,
    pub stats: ConnectorStats,
    pub qmgr: Option<Arc<dyn QueueManager>>,
    pub object: Option<Arc<dyn MqObject>>,
    pub dispatch: Option<Arc<dyn MqDispatchControl>>,
    pub nats_sub: Option<Arc<dyn NatsSubscription>>,
    pub stan_sub: Option<Arc<dyn StanSubscription>>,
}

/// Shared core of every connector variant: immutable configuration, the
/// supervisor handle, and the single lock serializing the critical sections.
pub(crate) struct ConnectorCore {
    pub config: ConnectorConfig,
    pub bridge: Arc<dyn BridgeRuntime>,
    pub name: String,
    pub inner: Mutex<ConnectorRuntime>,
}

impl ConnectorCore {
    pub(crate) fn new(
        bridge: Arc<dyn BridgeRuntime>,
        config: ConnectorConfig,
        name: String,
    ) -> Arc<Self> {
        let mut stats = ConnectorStats::new();
        stats.name = name.clone();
        stats.id = if config.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            config.id.clone()
        };

        Arc::new(Self {
            config,
            bridge,
            name,
            inner: Mutex::new(ConnectorRuntime {
                state: ConnectorState::New,
                stats,
                qmgr: None,
                object: None,
                dispatch: None,
                nats_sub: None,
                stan_sub: None,
            }),
        })
    }
}

/// Handles taken out of a connector so they can be released without holding
/// its lock: stopping the dispatcher waits for an in-flight callback, and the
/// callback needs the lock to finish.
struct TakenHandles {
    dispatch: Option<Arc<dyn MqDispatchControl>>,
    object: Option<Arc<dyn MqObject>>,
    qmgr: Option<Arc<dyn QueueManager>>,
    nats_sub: Option<Arc<dyn NatsSubscription>>,
    stan_sub: Option<Arc<dyn StanSubscription>>,
}

impl TakenHandles {
    fn take_from(inner: &mut ConnectorRuntime) -> Self {
        Self {
            dispatch: inner.dispatch.take(),
            object: inner.object.take(),
            qmgr: inner.qmgr.take(),
            nats_sub: inner.nats_sub.take(),
            stan_sub: inner.stan_sub.take(),
        }
    }
}

/// Releases a connector's handles in reverse start order. Step failures are
/// logged without aborting the rest; only the object-close error propagates.
async fn release_handles(name: &str, mut inner: TakenHandles) -> Result<(), BridgeError> {
    let mut result = Ok(());

    if let Some(dispatch) = inner.dispatch.take() {
        if let Err(err) = dispatch.stop().await {
            warn!(
                event = events::CONNECTOR_SHUTDOWN_STEP_FAILED,
                connector = name,
                step = "stop_dispatch",
                err = %err,
                "unable to stop callbacks"
            );
        }
    }

    if let Some(object) = inner.object.take() {
        if let Err(err) = object.close().await {
            warn!(
                event = events::CONNECTOR_SHUTDOWN_STEP_FAILED,
                connector = name,
                step = "close_object",
                err = %err,
                "error closing object"
            );
            result = Err(err);
        }
    }

    if let Some(qmgr) = inner.qmgr.take() {
        if let Err(err) = qmgr.disconnect().await {
            warn!(
                event = events::CONNECTOR_SHUTDOWN_STEP_FAILED,
                connector = name,
                step = "disconnect",
                err = %err,
                "error disconnecting from queue manager"
            );
        } else {
            trace!(connector = name, "disconnected from queue manager");
        }
    }

    if let Some(sub) = inner.nats_sub.take() {
        if let Err(err) = sub.unsubscribe().await {
            warn!(
                event = events::CONNECTOR_SHUTDOWN_STEP_FAILED,
                connector = name,
                step = "unsubscribe",
                err = %err,
                "error unsubscribing"
            );
        }
    }

    if let Some(sub) = inner.stan_sub.take() {
        if let Err(err) = sub.unsubscribe().await {
            warn!(
                event = events::CONNECTOR_SHUTDOWN_STEP_FAILED,
                connector = name,
                step = "unsubscribe",
                err = %err,
                "error unsubscribing"
            );
        }
    }

    result
}

/// Variant-specific pieces of a connector; the [`Connector`] surface is
/// derived from this in one place.
#[async_trait]
pub(crate) trait ManagedConnector: fmt::Display + Send + Sync {
    fn core(&self) -> &ConnectorCore;

    /// Acquires this variant's handles. Runs with the connector lock held and
    /// the state already at `Starting`; handles must be stored into `inner`
    /// as they are acquired so a failed start releases them.
    async fn start_locked(&self, inner: &mut ConnectorRuntime) -> Result<(), BridgeError>;

    /// Whether this variant's prerequisite broker is STAN rather than NATS
    /// core.
    fn needs_stan(&self) -> bool {
        false
    }
}

#[async_trait]
impl<T: ManagedConnector> Connector for T {
    async fn start(&self) -> Result<(), BridgeError> {
        let core = self.core();
        let mut inner = core.inner.lock().await;
        match inner.state {
            ConnectorState::New | ConnectorState::Stopped => {}
            state => {
                return Err(BridgeError::Lifecycle(format!(
                    "{} cannot start from {:?}",
                    self, state
                )))
            }
        }
        inner.state = ConnectorState::Starting;
        debug!(event = events::CONNECTOR_START, connector = %self, "starting connection");

        match self.start_locked(&mut inner).await {
            Ok(()) => {
                inner.state = ConnectorState::Running;
                inner.stats.add_connect();
                info!(event = events::CONNECTOR_START_OK, connector = %self, "started connection");
                Ok(())
            }
            Err(err) => {
                inner.stats.record_error(&err.to_string());
                // No dispatcher is running on this path (it is acquired
                // last), so releasing under the lock cannot block.
                let _ = release_handles(&core.name, TakenHandles::take_from(&mut inner)).await;
                inner.state = ConnectorState::Stopped;
                warn!(
                    event = events::CONNECTOR_START_FAILED,
                    connector = %self,
                    err = %err,
                    "failed to start connection"
                );
                Err(err)
            }
        }
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        let core = self.core();
        let taken = {
            let mut inner = core.inner.lock().await;
            match inner.state {
                ConnectorState::Running | ConnectorState::Starting => {}
                _ => return Ok(()),
            }
            inner.state = ConnectorState::Stopping;
            inner.stats.add_disconnect();
            TakenHandles::take_from(&mut inner)
        };
        info!(event = events::CONNECTOR_SHUTDOWN, connector = %self, "shutting down connection");

        // The lock is free here: the dispatcher can drain an in-flight
        // callback (which sees `Stopping` and drops its delivery) before we
        // close the object underneath it.
        let result = release_handles(&core.name, taken).await;
        core.inner.lock().await.state = ConnectorState::Stopped;
        result
    }

    async fn check_connections(&self) -> Result<(), BridgeError> {
        if self.needs_stan() {
            if self.core().bridge.stan().await.is_some() {
                Ok(())
            } else {
                Err(BridgeError::Connect(format!(
                    "{} connector requires nats streaming to be available",
                    self
                )))
            }
        } else if self.core().bridge.check_nats().await {
            Ok(())
        } else {
            Err(BridgeError::Connect(format!(
                "{} connector requires nats to be available",
                self
            )))
        }
    }

    async fn stats(&self) -> ConnectorStats {
        self.core().inner.lock().await.stats.clone()
    }

    async fn state(&self) -> ConnectorState {
        self.core().inner.lock().await.state
    }

    fn config(&self) -> &ConnectorConfig {
        &self.core().config
    }
}

/// Where an MQ-input connector publishes.
#[derive(Clone, Copy)]
pub(crate) enum OutputSide {
    Nats,
    Stan,
}

/// Callback target for the MQ-input variants. Conversion, publish and the
/// commit/back-out pairing all run under the connector lock, keeping them
/// sequential with any concurrent lifecycle call.
pub(crate) struct MqSourceListener {
    core: Arc<ConnectorCore>,
    output: OutputSide,
    /// Queue inputs commit after a successful publish and back out on a
    /// failed one; topic inputs are non-transactional.
    transactional: bool,
}

impl MqSourceListener {
    pub(crate) fn new(core: Arc<ConnectorCore>, output: OutputSide, transactional: bool) -> Self {
        Self {
            core,
            output,
            transactional,
        }
    }

    async fn backout(&self, inner: &mut ConnectorRuntime) {
        if !self.transactional {
            return;
        }
        if let Some(qmgr) = inner.qmgr.clone() {
            if let Err(err) = qmgr.backout().await {
                warn!(
                    event = events::BACKOUT_FAILED,
                    connector = self.core.name.as_str(),
                    err = %err,
                    "unable to back out message"
                );
            }
        }
    }
}

#[async_trait]
impl MqMessageListener for MqSourceListener {
    async fn on_delivery(&self, delivery: Result<MqDelivery, MqCallbackError>) {
        let core = &self.core;

        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(err) if err.is_no_message() => {
                trace!(
                    event = events::MQ_CALLBACK_HEARTBEAT,
                    connector = core.name.as_str(),
                    "message timeout"
                );
                return;
            }
            Err(err) => {
                warn!(
                    event = events::MQ_CALLBACK_ERROR,
                    connector = core.name.as_str(),
                    err = %err,
                    "mq error in callback"
                );
                core.bridge
                    .connector_error(&core.name, BridgeError::Mq(err.to_string()))
                    .await;
                return;
            }
        };

        let mut inner = core.inner.lock().await;
        if inner.state != ConnectorState::Running {
            // Racing a shutdown; the handles are gone. Sync-point deliveries
            // return to the queue when the manager disconnects.
            return;
        }
        let start = Instant::now();
        let payload_len = delivery.payload.len();
        trace!(
            event = events::MESSAGE_RECEIVED,
            connector = core.name.as_str(),
            bytes = payload_len,
            "got message"
        );
        inner.stats.add_message_in(payload_len as u64);

        let qmgr = if core.config.exclude_headers {
            None
        } else {
            inner.qmgr.clone()
        };
        let data = match mq_to_bridge_message(
            &delivery.descriptor,
            delivery.handle.as_ref(),
            &delivery.payload,
            qmgr.as_ref(),
        )
        .await
        {
            Ok(data) => data,
            Err(err) => {
                warn!(
                    event = events::CONVERT_FAILED,
                    connector = core.name.as_str(),
                    err = %err,
                    "failed to convert message"
                );
                inner.stats.record_error(&err.to_string());
                self.backout(&mut inner).await;
                return;
            }
        };

        let publish_result = match self.output {
            OutputSide::Nats => match core.bridge.nats().await {
                Some(nats) => nats.publish(&core.config.subject, &data).await,
                None => Err(BridgeError::Publish("nats connection unavailable".into())),
            },
            OutputSide::Stan => match core.bridge.stan().await {
                Some(stan) => stan.publish(&core.config.channel, &data).await,
                None => Err(BridgeError::Publish("stan connection unavailable".into())),
            },
        };

        match publish_result {
            Err(err) => {
                warn!(
                    event = events::PUBLISH_FAILED,
                    connector = core.name.as_str(),
                    err = %err,
                    "publish failure"
                );
                inner.stats.record_error(&err.to_string());
                self.backout(&mut inner).await;
            }
            Ok(()) => {
                if self.transactional {
                    if let Some(qmgr) = inner.qmgr.clone() {
                        if let Err(err) = qmgr.commit().await {
                            warn!(
                                connector = core.name.as_str(),
                                err = %err,
                                "unable to commit message"
                            );
                        }
                    }
                }
                inner.stats.add_message_out(data.len() as u64);
                inner.stats.add_request_time(start.elapsed());
                trace!(
                    event = events::PUBLISH_OK,
                    connector = core.name.as_str(),
                    bytes = data.len(),
                    "published message"
                );
            }
        }
    }
}

/// Converts one inbound NATS/STAN payload and puts it to the connector's
/// queue with no-sync-point semantics, the converted handle riding along as
/// the original message handle. Returns whether the put succeeded.
async fn forward_to_queue(core: &Arc<ConnectorCore>, payload: &[u8], reply: &str) -> bool {
    let mut inner = core.inner.lock().await;
    if inner.state != ConnectorState::Running {
        return false;
    }
    let start = Instant::now();
    trace!(
        event = events::MESSAGE_RECEIVED,
        connector = core.name.as_str(),
        bytes = payload.len(),
        "got message"
    );
    inner.stats.add_message_in(payload.len() as u64);

    let qmgr = if core.config.exclude_headers {
        None
    } else {
        inner.qmgr.clone()
    };
    let (descriptor, handle, body) = match bridge_message_to_mq(payload, reply, qmgr.as_ref()).await
    {
        Ok(parts) => parts,
        Err(err) => {
            warn!(
                event = events::CONVERT_FAILED,
                connector = core.name.as_str(),
                err = %err,
                "failed to convert message"
            );
            inner.stats.record_error(&err.to_string());
            return false;
        }
    };

    // Shutdown may have released the object between delivery and now.
    let Some(object) = inner.object.clone() else {
        return false;
    };

    let options = MqPutOptions {
        sync_point: false,
        original_msg_handle: handle,
    };
    match object.put(&descriptor, options, &body).await {
        Err(err) => {
            warn!(
                event = events::MQ_PUT_FAILED,
                connector = core.name.as_str(),
                err = %err,
                "MQ publish failure"
            );
            inner.stats.record_error(&err.to_string());
            false
        }
        Ok(()) => {
            inner.stats.add_message_out(body.len() as u64);
            inner.stats.add_request_time(start.elapsed());
            true
        }
    }
}

/// Subscription target for the NATS-input variant.
pub(crate) struct NatsSourceListener {
    core: Arc<ConnectorCore>,
}

impl NatsSourceListener {
    pub(crate) fn new(core: Arc<ConnectorCore>) -> Self {
        Self { core }
    }
}

#[async_trait]
impl NatsMessageHandler for NatsSourceListener {
    async fn on_message(&self, msg: NatsMessage) {
        forward_to_queue(&self.core, &msg.payload, &msg.reply).await;
    }
}

/// Subscription target for the STAN-input variant. The subscription runs in
/// manual-ack mode; a delivery is acknowledged only after the put succeeds,
/// so unput messages are redelivered.
pub(crate) struct StanSourceListener {
    core: Arc<ConnectorCore>,
}

impl StanSourceListener {
    pub(crate) fn new(core: Arc<ConnectorCore>) -> Self {
        Self { core }
    }
}

#[async_trait]
impl StanMessageHandler for StanSourceListener {
    async fn on_message(&self, msg: StanMessage) {
        if forward_to_queue(&self.core, &msg.payload, "").await {
            if let Err(err) = msg.ack().await {
                warn!(
                    connector = self.core.name.as_str(),
                    err = %err,
                    "unable to ack message"
                );
            }
        }
    }
}
