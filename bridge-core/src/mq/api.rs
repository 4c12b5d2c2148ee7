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

use crate::config::MqConfig;
use crate::error::BridgeError;
use crate::mq::descriptor::MqMessageDescriptor;
use async_trait::async_trait;
use bridge_message::PropertyValue;
use std::fmt;
use std::sync::Arc;

/// Entry point into the MQ client library: connects to a queue manager from a
/// configuration block.
#[async_trait]
pub trait MqClient: Send + Sync {
    async fn connect(&self, config: &MqConfig) -> Result<Arc<dyn QueueManager>, BridgeError>;
}

/// What an open object names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MqObjectKind {
    Queue,
    Topic,
}

/// Object descriptor passed to [`QueueManager::open`].
#[derive(Debug, Clone)]
pub struct MqObjectDescriptor {
    pub kind: MqObjectKind,
    pub name: String,
}

/// How an object is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MqOpenOptions {
    /// Read from a queue, shared with other consumers.
    InputShared,
    /// Put to a queue.
    Output,
    /// Managed subscription on a topic string.
    Subscribe,
}

/// Get-message options for a registered callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct MqGetOptions {
    pub wait: bool,
    pub sync_point: bool,
    pub fail_if_quiescing: bool,
}

/// Put-message options.
#[derive(Clone, Default)]
pub struct MqPutOptions {
    /// `false` puts with no-sync-point semantics.
    pub sync_point: bool,
    /// Carries the converted message handle so its properties travel with the
    /// put.
    pub original_msg_handle: Option<Arc<dyn MessageHandle>>,
}

/// Reason code attached to a failed callback delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MqReason {
    /// Get-wait expired with nothing to read; a heartbeat, not a failure.
    NoMsgAvailable,
    Other(i32),
}

impl fmt::Display for MqReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MqReason::NoMsgAvailable => write!(f, "no message available"),
            MqReason::Other(code) => write!(f, "reason code {code}"),
        }
    }
}

/// Non-OK completion reported to a message callback.
#[derive(Debug, Clone, thiserror::Error)]
#[error("mq error in callback: completion code {completion_code}, {reason}")]
pub struct MqCallbackError {
    pub completion_code: i32,
    pub reason: MqReason,
}

impl MqCallbackError {
    pub fn is_no_message(&self) -> bool {
        self.reason == MqReason::NoMsgAvailable
    }
}

/// One message handed to a registered callback.
pub struct MqDelivery {
    pub descriptor: MqMessageDescriptor,
    /// Handle carrying the message's user properties, when the library
    /// supplied one.
    pub handle: Option<Arc<dyn MessageHandle>>,
    pub payload: Vec<u8>,
}

/// Receiver side of a callback registration. Invoked serially on a task owned
/// by the client library's dispatcher.
#[async_trait]
pub trait MqMessageListener: Send + Sync {
    async fn on_delivery(&self, delivery: Result<MqDelivery, MqCallbackError>);
}

/// An open queue or topic object.
#[async_trait]
pub trait MqObject: Send + Sync {
    async fn put(
        &self,
        descriptor: &MqMessageDescriptor,
        options: MqPutOptions,
        payload: &[u8],
    ) -> Result<(), BridgeError>;

    /// Registers `listener` to receive messages read from this object.
    /// Deliveries begin once the queue manager's dispatcher is started.
    async fn register_callback(
        &self,
        options: MqGetOptions,
        listener: Arc<dyn MqMessageListener>,
    ) -> Result<(), BridgeError>;

    async fn close(&self) -> Result<(), BridgeError>;
}

/// Control handle for the queue manager's callback dispatcher. Stopping it
/// waits for in-flight callbacks to drain.
#[async_trait]
pub trait MqDispatchControl: Send + Sync {
    async fn stop(&self) -> Result<(), BridgeError>;
}

/// Cursor over a message handle's user properties, yielding one name/value
/// pair at a time until exhausted. Values arrive in the caller's native
/// representation: integers at the narrowest signed width they were set with,
/// byte sequences intact, and null as a typed-null entry.
#[async_trait]
pub trait PropertyCursor: Send {
    async fn next(&mut self) -> Result<Option<(String, PropertyValue)>, BridgeError>;
}

/// An MQ message handle: holds a message's user properties independently of
/// the descriptor.
#[async_trait]
pub trait MessageHandle: Send + Sync {
    async fn set_property(&self, key: &str, value: &PropertyValue) -> Result<(), BridgeError>;

    /// Opens a property cursor with value conversion enabled.
    async fn properties(&self) -> Result<Box<dyn PropertyCursor>, BridgeError>;
}

/// A connection to one queue manager. Single-owner: each connector holds its
/// own, never shared.
#[async_trait]
pub trait QueueManager: Send + Sync {
    async fn open(
        &self,
        descriptor: &MqObjectDescriptor,
        options: MqOpenOptions,
    ) -> Result<Arc<dyn MqObject>, BridgeError>;

    async fn create_message_handle(&self) -> Result<Arc<dyn MessageHandle>, BridgeError>;

    /// Starts the callback dispatcher for this connection's registered
    /// callbacks.
    async fn start_dispatch(&self) -> Result<Arc<dyn MqDispatchControl>, BridgeError>;

    /// Commits the current sync-point unit of work.
    async fn commit(&self) -> Result<(), BridgeError>;

    /// Backs out the current sync-point unit of work.
    async fn backout(&self) -> Result<(), BridgeError>;

    async fn disconnect(&self) -> Result<(), BridgeError>;
}
