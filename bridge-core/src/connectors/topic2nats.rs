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
    ConnectorCore, ConnectorRuntime, ManagedConnector, MqSourceListener, OutputSide,
};
use crate::connectors::Connector;
use crate::error::BridgeError;
use crate::mq::{MqGetOptions, MqObjectDescriptor, MqObjectKind, MqOpenOptions};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Connects an MQ topic subscription to a NATS subject. Non-transactional.
pub struct Topic2NatsConnector {
    core: Arc<ConnectorCore>,
}

impl Topic2NatsConnector {
    pub fn new(bridge: Arc<dyn BridgeRuntime>, config: ConnectorConfig) -> Arc<Self> {
        let name = format!("Topic:{} to NATS:{}", config.topic, config.subject);
        Arc::new(Self {
            core: ConnectorCore::new(bridge, config, name),
        })
    }
}

impl fmt::Display for Topic2NatsConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.core.name)
    }
}

#[async_trait]
impl ManagedConnector for Topic2NatsConnector {
    fn core(&self) -> &ConnectorCore {
        &self.core
    }

    async fn start_locked(&self, inner: &mut ConnectorRuntime) -> Result<(), BridgeError> {
        let core = &self.core;
        self.check_connections().await?;

        let qmgr = core.bridge.mq_client().connect(&core.config.mq).await?;
        inner.qmgr = Some(qmgr.clone());

        let descriptor = MqObjectDescriptor {
            kind: MqObjectKind::Topic,
            name: core.config.topic.clone(),
        };
        let topic = qmgr.open(&descriptor, MqOpenOptions::Subscribe).await?;
        inner.object = Some(topic.clone());

        let options = MqGetOptions {
            wait: true,
            sync_point: false,
            fail_if_quiescing: true,
        };
        let listener = Arc::new(MqSourceListener::new(
            core.clone(),
            OutputSide::Nats,
            false,
        ));
        topic.register_callback(options, listener).await?;
        inner.dispatch = Some(qmgr.start_dispatch().await?);

        trace!(
            connector = core.name.as_str(),
            topic = core.config.topic.as_str(),
            "subscribed and reading"
        );
        Ok(())
    }
}
