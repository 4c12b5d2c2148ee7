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

use crate::bridge::BridgeRuntime;
use crate::config::ConnectorConfig;
use crate::connectors::base::{
    ConnectorCore, ConnectorRuntime, ManagedConnector, NatsSourceListener,
};
use crate::connectors::Connector;
use crate::error::BridgeError;
use crate::mq::{MqObjectDescriptor, MqObjectKind, MqOpenOptions};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Connects a NATS subject to an MQ queue. Puts are no-sync-point.
pub struct Nats2QueueConnector {
    core: Arc<ConnectorCore>,
}

impl Nats2QueueConnector {
    pub fn new(bridge: Arc<dyn BridgeRuntime>, config: ConnectorConfig) -> Arc<Self> {
        let name = format!("NATS:{} to Queue:{}", config.subject, config.queue);
        Arc::new(Self {
            core: ConnectorCore::new(bridge, config, name),
        })
    }
}

impl fmt::Display for Nats2QueueConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.core.name)
    }
}

#[async_trait]
impl ManagedConnector for Nats2QueueConnector {
    fn core(&self) -> &ConnectorCore {
        &self.core
    }

    async fn start_locked(&self, inner: &mut ConnectorRuntime) -> Result<(), BridgeError> {
        let core = &self.core;
        self.check_connections().await?;

        let qmgr = core.bridge.mq_client().connect(&core.config.mq).await?;
        trace!(
            connector = core.name.as_str(),
            queue_manager = core.config.mq.queue_manager.as_str(),
            "connected to queue manager"
        );
        inner.qmgr = Some(qmgr.clone());

        let descriptor = MqObjectDescriptor {
            kind: MqObjectKind::Queue,
            name: core.config.queue.clone(),
        };
        let queue = qmgr.open(&descriptor, MqOpenOptions::Output).await?;
        inner.object = Some(queue);

        let nats = core
            .bridge
            .nats()
            .await
            .ok_or_else(|| BridgeError::Connect("nats connection unavailable".into()))?;
        let listener = Arc::new(NatsSourceListener::new(core.clone()));
        inner.nats_sub = Some(nats.subscribe(&core.config.subject, listener).await?);

        trace!(
            connector = core.name.as_str(),
            subject = core.config.subject.as_str(),
            "subscribed and writing"
        );
        Ok(())
    }
}
