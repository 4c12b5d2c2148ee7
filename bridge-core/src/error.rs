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

use bridge_message::EnvelopeError;
use thiserror::Error;

/// Failures surfaced by the bridge runtime.
///
/// Decode, convert and publish failures are per-message: the affected message
/// is backed out (under sync-point) or dropped and the connector stays up.
/// Connect and lifecycle failures abort the operation that raised them; fatal
/// MQ callback errors escalate to a supervisor-wide stop.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Invalid or incomplete configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A broker was unreachable, rejected authentication or timed out.
    #[error("connection failed: {0}")]
    Connect(String),

    /// An inbound envelope failed structural validation.
    #[error("envelope decode failed: {0}")]
    Decode(#[from] EnvelopeError),

    /// A message could not be translated between representations.
    #[error("message conversion failed: {0}")]
    Convert(String),

    /// The output side rejected a message.
    #[error("publish failed: {0}")]
    Publish(String),

    /// An MQ primitive reported a non-OK completion.
    #[error("mq error: {0}")]
    Mq(String),

    /// A start or shutdown was requested from a state that does not allow it.
    #[error("invalid lifecycle transition: {0}")]
    Lifecycle(String),
}
