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

//! In-memory queue manager.
//!
//! Mimics the slice of the MQ client library the bridge consumes: shared
//! queues and topics, message handles with typed properties, callback
//! registration with a started/stopped dispatcher, sync-point get with
//! commit/backout requeue, and put-date/put-time stamping.

use async_trait::async_trait;
use bridge_core::config::MqConfig;
use bridge_core::mq::{
    MessageHandle, MqCallbackError, MqClient, MqDelivery, MqDispatchControl, MqGetOptions,
    MqMessageDescriptor, MqMessageListener, MqObject, MqObjectDescriptor, MqObjectKind,
    MqOpenOptions, MqPutOptions, MqReason, PropertyCursor, QueueManager,
};
use bridge_core::BridgeError;
use bridge_message::PropertyValue;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// One message held by the in-memory broker.
#[derive(Clone)]
pub struct StoredMessage {
    pub descriptor: MqMessageDescriptor,
    pub properties: Vec<(String, PropertyValue)>,
    pub payload: Vec<u8>,
}

struct TopicRegistration {
    topic: String,
    listener: Arc<dyn MqMessageListener>,
    qmgr: Arc<QmgrShared>,
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, VecDeque<StoredMessage>>,
    topic_subs: Vec<TopicRegistration>,
    object_closes: HashMap<String, usize>,
}

/// In-memory stand-in for the MQ client library. One instance is one broker;
/// every queue manager connected through it shares the queues and topics.
pub struct MemoryMqServer {
    broker: Arc<Mutex<BrokerState>>,
}

impl MemoryMqServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            broker: Arc::new(Mutex::new(BrokerState::default())),
        })
    }

    /// Puts a message directly on a queue, as an external application would.
    pub async fn put_on_queue(
        &self,
        queue: &str,
        mut descriptor: MqMessageDescriptor,
        properties: Vec<(String, PropertyValue)>,
        payload: &[u8],
    ) {
        stamp_put_fields(&mut descriptor);
        self.broker
            .lock()
            .await
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(StoredMessage {
                descriptor,
                properties,
                payload: payload.to_vec(),
            });
    }

    /// Publishes a message on a topic, delivering it to every subscription
    /// whose dispatcher is running.
    pub async fn put_on_topic(
        &self,
        topic: &str,
        mut descriptor: MqMessageDescriptor,
        properties: Vec<(String, PropertyValue)>,
        payload: &[u8],
    ) {
        stamp_put_fields(&mut descriptor);
        let message = StoredMessage {
            descriptor,
            properties,
            payload: payload.to_vec(),
        };
        publish_to_topic(&self.broker, topic, &message).await;
    }

    /// Browses a queue without consuming it.
    pub async fn browse_queue(&self, queue: &str) -> Vec<StoredMessage> {
        self.broker
            .lock()
            .await
            .queues
            .get(queue)
            .map(|messages| messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn queue_depth(&self, queue: &str) -> usize {
        self.broker
            .lock()
            .await
            .queues
            .get(queue)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// How many times an object with this name has been closed.
    pub async fn object_close_count(&self, name: &str) -> usize {
        self.broker
            .lock()
            .await
            .object_closes
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl MqClient for MemoryMqServer {
    async fn connect(&self, _config: &MqConfig) -> Result<Arc<dyn QueueManager>, BridgeError> {
        Ok(Arc::new(MemoryQueueManager {
            shared: Arc::new(QmgrShared {
                broker: self.broker.clone(),
                registrations: Mutex::new(Vec::new()),
                uncommitted: Mutex::new(Vec::new()),
                dispatching: AtomicBool::new(false),
            }),
        }))
    }
}

fn stamp_put_fields(descriptor: &mut MqMessageDescriptor) {
    let now = Utc::now();
    descriptor.put_date = now.format("%Y%m%d").to_string();
    let millis = now.timestamp_subsec_millis();
    descriptor.put_time = format!(
        "{}{}{}",
        now.format("%H%M%S"),
        millis / 100,
        (millis / 10) % 10
    );
}

fn delivery_from(message: &StoredMessage) -> MqDelivery {
    MqDelivery {
        descriptor: message.descriptor.clone(),
        handle: Some(Arc::new(MemoryMessageHandle::with_properties(
            message.properties.clone(),
        ))),
        payload: message.payload.clone(),
    }
}

async fn publish_to_topic(broker: &Arc<Mutex<BrokerState>>, topic: &str, message: &StoredMessage) {
    // Snapshot listeners before delivering: handlers take their connector
    // locks and may call back into the broker.
    let targets: Vec<Arc<dyn MqMessageListener>> = {
        let broker = broker.lock().await;
        broker
            .topic_subs
            .iter()
            .filter(|sub| sub.topic == topic && sub.qmgr.dispatching.load(Ordering::SeqCst))
            .map(|sub| sub.listener.clone())
            .collect()
    };
    for listener in targets {
        listener.on_delivery(Ok(delivery_from(message))).await;
    }
}

struct QueueRegistration {
    queue: String,
    options: MqGetOptions,
    listener: Arc<dyn MqMessageListener>,
}

struct QmgrShared {
    broker: Arc<Mutex<BrokerState>>,
    registrations: Mutex<Vec<QueueRegistration>>,
    // Sync-point unit of work: messages taken but not yet committed.
    uncommitted: Mutex<Vec<(String, StoredMessage)>>,
    dispatching: AtomicBool,
}

struct MemoryQueueManager {
    shared: Arc<QmgrShared>,
}

#[async_trait]
impl QueueManager for MemoryQueueManager {
    async fn open(
        &self,
        descriptor: &MqObjectDescriptor,
        _options: MqOpenOptions,
    ) -> Result<Arc<dyn MqObject>, BridgeError> {
        if descriptor.kind == MqObjectKind::Queue {
            self.shared
                .broker
                .lock()
                .await
                .queues
                .entry(descriptor.name.clone())
                .or_default();
        }
        Ok(Arc::new(MemoryMqObject {
            shared: self.shared.clone(),
            kind: descriptor.kind,
            name: descriptor.name.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    async fn create_message_handle(&self) -> Result<Arc<dyn MessageHandle>, BridgeError> {
        Ok(Arc::new(MemoryMessageHandle::new()))
    }

    async fn start_dispatch(&self) -> Result<Arc<dyn MqDispatchControl>, BridgeError> {
        let shared = self.shared.clone();
        shared.dispatching.store(true, Ordering::SeqCst);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(dispatch_loop(shared.clone(), stop_rx));
        Ok(Arc::new(MemoryDispatchControl {
            shared,
            stop_tx,
            handle: Mutex::new(Some(handle)),
        }))
    }

    async fn commit(&self) -> Result<(), BridgeError> {
        self.shared.uncommitted.lock().await.clear();
        Ok(())
    }

    async fn backout(&self) -> Result<(), BridgeError> {
        requeue_uncommitted(&self.shared).await;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BridgeError> {
        // An open unit of work is implicitly backed out on disconnect.
        requeue_uncommitted(&self.shared).await;
        self.shared.registrations.lock().await.clear();
        Ok(())
    }
}

async fn requeue_uncommitted(shared: &Arc<QmgrShared>) {
    let mut uncommitted = shared.uncommitted.lock().await;
    let mut broker = shared.broker.lock().await;
    for (queue, message) in uncommitted.drain(..).rev() {
        broker.queues.entry(queue).or_default().push_front(message);
    }
}

async fn next_delivery(
    shared: &Arc<QmgrShared>,
) -> Option<(Arc<dyn MqMessageListener>, MqDelivery)> {
    let registrations = shared.registrations.lock().await;
    let mut found: Option<(usize, StoredMessage)> = None;
    {
        let mut broker = shared.broker.lock().await;
        for (i, registration) in registrations.iter().enumerate() {
            if let Some(queue) = broker.queues.get_mut(&registration.queue) {
                if let Some(message) = queue.pop_front() {
                    found = Some((i, message));
                    break;
                }
            }
        }
    }

    let (i, message) = found?;
    let registration = &registrations[i];
    if registration.options.sync_point {
        shared
            .uncommitted
            .lock()
            .await
            .push((registration.queue.clone(), message.clone()));
    }
    Some((registration.listener.clone(), delivery_from(&message)))
}

async fn dispatch_loop(shared: Arc<QmgrShared>, mut stop_rx: watch::Receiver<bool>) {
    let mut idle_polls = 0u32;
    loop {
        if *stop_rx.borrow() {
            break;
        }
        match next_delivery(&shared).await {
            Some((listener, delivery)) => {
                idle_polls = 0;
                listener.on_delivery(Ok(delivery)).await;
                sleep(Duration::from_millis(1)).await;
            }
            None => {
                idle_polls += 1;
                if idle_polls % 25 == 0 {
                    // Get-wait expiry: surface the no-message heartbeat.
                    let listeners: Vec<Arc<dyn MqMessageListener>> = shared
                        .registrations
                        .lock()
                        .await
                        .iter()
                        .map(|registration| registration.listener.clone())
                        .collect();
                    for listener in listeners {
                        listener
                            .on_delivery(Err(MqCallbackError {
                                completion_code: 2,
                                reason: MqReason::NoMsgAvailable,
                            }))
                            .await;
                    }
                }
                tokio::select! {
                    _ = stop_rx.changed() => {}
                    _ = sleep(Duration::from_millis(2)) => {}
                }
            }
        }
    }
}

struct MemoryDispatchControl {
    shared: Arc<QmgrShared>,
    stop_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl MqDispatchControl for MemoryDispatchControl {
    async fn stop(&self) -> Result<(), BridgeError> {
        self.shared.dispatching.store(false, Ordering::SeqCst);
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
        Ok(())
    }
}

struct MemoryMqObject {
    shared: Arc<QmgrShared>,
    kind: MqObjectKind,
    name: String,
    closed: AtomicBool,
}

#[async_trait]
impl MqObject for MemoryMqObject {
    async fn put(
        &self,
        descriptor: &MqMessageDescriptor,
        options: MqPutOptions,
        payload: &[u8],
    ) -> Result<(), BridgeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BridgeError::Mq(format!("object {} is closed", self.name)));
        }

        let mut descriptor = descriptor.clone();
        stamp_put_fields(&mut descriptor);

        let properties = match &options.original_msg_handle {
            Some(handle) => drain_properties(handle).await?,
            None => Vec::new(),
        };
        let message = StoredMessage {
            descriptor,
            properties,
            payload: payload.to_vec(),
        };

        match self.kind {
            MqObjectKind::Queue => {
                self.shared
                    .broker
                    .lock()
                    .await
                    .queues
                    .entry(self.name.clone())
                    .or_default()
                    .push_back(message);
            }
            MqObjectKind::Topic => {
                publish_to_topic(&self.shared.broker, &self.name, &message).await;
            }
        }
        Ok(())
    }

    async fn register_callback(
        &self,
        options: MqGetOptions,
        listener: Arc<dyn MqMessageListener>,
    ) -> Result<(), BridgeError> {
        match self.kind {
            MqObjectKind::Queue => {
                self.shared.registrations.lock().await.push(QueueRegistration {
                    queue: self.name.clone(),
                    options,
                    listener,
                });
            }
            MqObjectKind::Topic => {
                self.shared.broker.lock().await.topic_subs.push(TopicRegistration {
                    topic: self.name.clone(),
                    listener,
                    qmgr: self.shared.clone(),
                });
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), BridgeError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let mut broker = self.shared.broker.lock().await;
            *broker.object_closes.entry(self.name.clone()).or_default() += 1;
        }
        Ok(())
    }
}

async fn drain_properties(
    handle: &Arc<dyn MessageHandle>,
) -> Result<Vec<(String, PropertyValue)>, BridgeError> {
    let mut cursor = handle.properties().await?;
    let mut properties = Vec::new();
    while let Some(entry) = cursor.next().await? {
        properties.push(entry);
    }
    Ok(properties)
}

/// Message handle holding typed properties in insertion order.
pub(crate) struct MemoryMessageHandle {
    properties: Mutex<Vec<(String, PropertyValue)>>,
}

impl MemoryMessageHandle {
    pub(crate) fn new() -> Self {
        Self {
            properties: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_properties(properties: Vec<(String, PropertyValue)>) -> Self {
        Self {
            properties: Mutex::new(properties),
        }
    }
}

#[async_trait]
impl MessageHandle for MemoryMessageHandle {
    async fn set_property(&self, key: &str, value: &PropertyValue) -> Result<(), BridgeError> {
        let mut properties = self.properties.lock().await;
        match properties.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, existing)) => *existing = value.clone(),
            None => properties.push((key.to_string(), value.clone())),
        }
        Ok(())
    }

    async fn properties(&self) -> Result<Box<dyn PropertyCursor>, BridgeError> {
        let snapshot = self.properties.lock().await.clone();
        Ok(Box::new(MemoryPropertyCursor {
            entries: snapshot.into_iter(),
        }))
    }
}

struct MemoryPropertyCursor {
    entries: std::vec::IntoIter<(String, PropertyValue)>,
}

#[async_trait]
impl PropertyCursor for MemoryPropertyCursor {
    async fn next(&mut self) -> Result<Option<(String, PropertyValue)>, BridgeError> {
        Ok(self.entries.next())
    }
}
