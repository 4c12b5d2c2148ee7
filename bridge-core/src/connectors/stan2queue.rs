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
    ConnectorCore, ConnectorRuntime, ManagedConnector, StanSourceListener,
};
use crate::connectors::Connector;
use crate::error::BridgeError;
use crate::mq::{MqObjectDescriptor, MqObjectKind, MqOpenOptions};
use crate::nats::StanSubscriptionOptions;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Connects a STAN channel to an MQ queue. The subscription runs in
/// manual-ack mode, optionally durable; deliveries are acknowledged only
/// after the put succeeds.
pub struct Stan2QueueConnector {
    core: Arc<ConnectorCore>,
}

impl Stan2QueueConnector {
    pub fn new(bridge: Arc<dyn BridgeRuntime>, config: ConnectorConfig) -> Arc<Self> {
        let name = format!("STAN:{} to Queue:{}", config.channel, config.queue);
        Arc::new(Self {
            core: ConnectorCore::new(bridge, config, name),
        })
    }
}

impl fmt::Display for Stan2QueueConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.core.name)
    }
}

#[async_trait]
impl ManagedConnector for Stan2QueueConnector {
    fn core(&self) -> &ConnectorCore {
        &self.core
    }

    fn needs_stan(&self) -> bool {
        true
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

        let stan = core
            .bridge
            .stan()
            .await
            .ok_or_else(|| BridgeError::Connect("stan connection unavailable".into()))?;
        let options = StanSubscriptionOptions {
            durable_name: (!core.config.durable_name.is_empty())
                .then(|| core.config.durable_name.clone()),
            start_at_sequence: core.config.start_at_sequence,
            deliver_all_available: core.config.deliver_all_available,
            manual_acks: true,
        };
        let listener = Arc::new(StanSourceListener::new(core.clone()));
        inner.stan_sub = Some(
            stan.subscribe(&core.config.channel, options, listener)
                .await?,
        );

        trace!(
            connector = core.name.as_str(),
            channel = core.config.channel.as_str(),
            "subscribed and writing"
        );
        Ok(())
    }
}
