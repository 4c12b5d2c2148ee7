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

//! # bridge-message
//!
//! `bridge-message` implements the wire envelope used to carry an MQ message
//! across NATS without losing anything material: the fixed message descriptor,
//! the typed user properties attached to the message handle, and the original
//! payload bytes.
//!
//! The envelope is self-describing. A decoder consuming only the byte slice
//! recovers every header field and every property with exactly the type it was
//! set with; inputs that fail structural validation decode to an
//! [`EnvelopeError`].
//!
//! ## Quick start
//!
//! ```
//! use bridge_message::{BridgeMessage, PropertyValue};
//!
//! let mut msg = BridgeMessage::new(b"hello world".to_vec());
//! msg.header.report = 2;
//! msg.set_property("trace", "enabled");
//! msg.set_property("attempt", 3i64);
//!
//! let encoded = msg.encode().unwrap();
//! let decoded = BridgeMessage::decode(&encoded).unwrap();
//!
//! assert_eq!(decoded.body, b"hello world");
//! assert_eq!(decoded.header.report, 2);
//! assert_eq!(decoded.get_string_property("trace"), Some("enabled"));
//! assert_eq!(
//!     decoded.get_typed_property("attempt"),
//!     Some(&PropertyValue::Int64(3))
//! );
//! ```

mod error;
mod header;
mod message;
mod properties;
mod wire;

pub use error::EnvelopeError;
pub use header::{identifier_from_slice, BridgeHeader, ID_LEN};
pub use message::BridgeMessage;
pub use properties::PropertyValue;
