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

/// Connects an MQ queue to a STAN channel. The only transactional path: the
/// get runs under sync-point, committed after the STAN publish is
/// acknowledged and backed out when it fails.
pub struct Queue2StanConnector {
    core: Arc<ConnectorCore>,
}

impl Queue2StanConnector {
    pub fn new(bridge: Arc<dyn BridgeRuntime>, config: ConnectorConfig) -> Arc<Self> {
        let name = format!("Queue:{} to STAN:{}", config.queue, config.channel);
        Arc::new(Self {
            core: ConnectorCore::new(bridge, config, name),
        })
    }
}

impl fmt::Display for Queue2StanConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.core.name)
    }
}

#[async_trait]
impl ManagedConnector for Queue2StanConnector {
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
        let queue = qmgr.open(&descriptor, MqOpenOptions::InputShared).await?;
        inner.object = Some(queue.clone());

        let options = MqGetOptions {
            wait: true,
            sync_point: true,
            fail_if_quiescing: true,
        };
        let listener = Arc::new(MqSourceListener::new(
            core.clone(),
            OutputSide::Stan,
            true,
        ));
        queue.register_callback(options, listener).await?;
        inner.dispatch = Some(qmgr.start_dispatch().await?);

        trace!(
            connector = core.name.as_str(),
            queue = core.config.queue.as_str(),
            "opened and reading"
        );
        Ok(())
    }
}
