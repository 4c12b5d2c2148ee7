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

//! Trait seam over the MQ client library.
//!
//! The bridge consumes a queue-manager API — connect, open, put,
//! register-callback, message handles with typed properties, sync-point
//! commit/backout — without depending on a vendor crate. Production wiring
//! implements these traits over the real client; tests use the in-memory
//! implementation from `bridge-test-utils`.

mod api;
mod descriptor;

pub use api::{
    MqCallbackError, MqClient, MqDelivery, MqDispatchControl, MqGetOptions, MqMessageListener,
    MqObject, MqObjectDescriptor, MqObjectKind, MqOpenOptions, MqPutOptions, MqReason,
    MessageHandle, PropertyCursor, QueueManager,
};
pub use descriptor::{
    MqMessageDescriptor, CCSID_QUEUE_MANAGER, DESCRIPTOR_VERSION_1, ENCODING_NATIVE,
    EXPIRY_UNLIMITED, FORMAT_NONE, MSG_TYPE_DATAGRAM, ORIGINAL_LENGTH_UNDEFINED,
    PERSISTENCE_AS_QUEUE_DEFAULT, PERSISTENCE_NOT_PERSISTENT, PERSISTENCE_PERSISTENT,
    PRIORITY_AS_QUEUE_DEFAULT,
};
