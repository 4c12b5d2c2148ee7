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

//! Translation between the MQ representation (descriptor + message handle +
//! payload) and the wire envelope.
//!
//! Passing `None` for the queue manager on either direction disables the
//! envelope entirely: the payload crosses unchanged and descriptor plus
//! properties are dropped. That is the `exclude_headers` path.

use crate::error::BridgeError;
use crate::mq::{MessageHandle, MqMessageDescriptor, QueueManager};
use bridge_message::{BridgeHeader, BridgeMessage};
use std::sync::Arc;

/// Builds the outbound wire form of one MQ message.
///
/// With a queue manager present the descriptor is mirrored into the envelope
/// header field-for-field (identifiers byte-for-byte), every user property on
/// `handle` is drained through its cursor, and the payload becomes the body.
pub async fn mq_to_bridge_message(
    descriptor: &MqMessageDescriptor,
    handle: Option<&Arc<dyn MessageHandle>>,
    payload: &[u8],
    qmgr: Option<&Arc<dyn QueueManager>>,
) -> Result<Vec<u8>, BridgeError> {
    if qmgr.is_none() {
        return Ok(payload.to_vec());
    }

    let mut msg = BridgeMessage::new(payload.to_vec());
    msg.header = header_from_descriptor(descriptor);

    if let Some(handle) = handle {
        let mut cursor = handle.properties().await?;
        while let Some((name, value)) = cursor.next().await? {
            msg.set_property(name, value);
        }
    }

    Ok(msg.encode()?)
}

/// Rebuilds the MQ representation of one inbound wire message.
///
/// With a queue manager present the bytes are decoded, a descriptor is
/// materialized from the round-tripped header subset, and a fresh message
/// handle is populated with every decoded property at its stored type. A
/// non-empty `reply_to` supplies the reply queue when the header lacks one.
pub async fn bridge_message_to_mq(
    data: &[u8],
    reply_to: &str,
    qmgr: Option<&Arc<dyn QueueManager>>,
) -> Result<(MqMessageDescriptor, Option<Arc<dyn MessageHandle>>, Vec<u8>), BridgeError> {
    let Some(qmgr) = qmgr else {
        return Ok((MqMessageDescriptor::default(), None, data.to_vec()));
    };

    let mut msg = BridgeMessage::decode(data)?;

    let mut descriptor = descriptor_from_header(&msg.header);
    if descriptor.reply_to_q.is_empty() && !reply_to.is_empty() {
        descriptor.reply_to_q = reply_to.to_string();
    }

    let handle = qmgr.create_message_handle().await?;
    for (key, value) in msg.properties() {
        handle
            .set_property(key, value)
            .await
            .map_err(|err| BridgeError::Convert(format!("unable to set property {key:?}: {err}")))?;
    }

    let body = std::mem::take(&mut msg.body);
    Ok((descriptor, Some(handle), body))
}

/// Mirrors every descriptor field into an envelope header. Nothing is
/// filtered on the way out; the receiving side decides what to honor.
fn header_from_descriptor(descriptor: &MqMessageDescriptor) -> BridgeHeader {
    BridgeHeader {
        version: descriptor.version,
        report: descriptor.report,
        msg_type: descriptor.msg_type,
        expiry: descriptor.expiry,
        feedback: descriptor.feedback,
        encoding: descriptor.encoding,
        coded_char_set_id: descriptor.coded_char_set_id,
        format: descriptor.format.clone(),
        priority: descriptor.priority,
        persistence: descriptor.persistence,
        msg_id: descriptor.msg_id,
        correl_id: descriptor.correl_id,
        backout_count: descriptor.backout_count,
        reply_to_q: descriptor.reply_to_q.clone(),
        reply_to_q_mgr: descriptor.reply_to_q_mgr.clone(),
        user_identifier: descriptor.user_identifier.clone(),
        accounting_token: descriptor.accounting_token,
        appl_identity_data: descriptor.appl_identity_data.clone(),
        put_appl_type: descriptor.put_appl_type,
        put_appl_name: descriptor.put_appl_name.clone(),
        put_date: descriptor.put_date.clone(),
        put_time: descriptor.put_time.clone(),
        appl_origin_data: descriptor.appl_origin_data.clone(),
        group_id: descriptor.group_id,
        msg_seq_number: descriptor.msg_seq_number,
        offset: descriptor.offset,
        msg_flags: descriptor.msg_flags,
        original_length: descriptor.original_length,
    }
}

/// Materializes a descriptor from the header, honoring only the round-tripped
/// subset. Version, message type, expiry, backout count and the put
/// date/time stay at their defaults: the receiving queue manager overwrites
/// them on put.
fn descriptor_from_header(header: &BridgeHeader) -> MqMessageDescriptor {
    let mut descriptor = MqMessageDescriptor {
        report: header.report,
        feedback: header.feedback,
        encoding: header.encoding,
        coded_char_set_id: header.coded_char_set_id,
        priority: header.priority,
        persistence: header.persistence,
        msg_id: header.msg_id,
        correl_id: header.correl_id,
        reply_to_q: header.reply_to_q.clone(),
        reply_to_q_mgr: header.reply_to_q_mgr.clone(),
        user_identifier: header.user_identifier.clone(),
        accounting_token: header.accounting_token,
        appl_identity_data: header.appl_identity_data.clone(),
        put_appl_type: header.put_appl_type,
        put_appl_name: header.put_appl_name.clone(),
        appl_origin_data: header.appl_origin_data.clone(),
        group_id: header.group_id,
        msg_seq_number: header.msg_seq_number,
        offset: header.offset,
        msg_flags: header.msg_flags,
        original_length: header.original_length,
        ..MqMessageDescriptor::default()
    };
    // An all-blank format decodes to empty; that is the descriptor default.
    if !header.format.is_empty() {
        descriptor.format = header.format.clone();
    }
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mq::{EXPIRY_UNLIMITED, FORMAT_NONE};

    #[tokio::test]
    async fn without_a_queue_manager_the_payload_is_untouched() {
        let msg = b"hello world";
        let descriptor = MqMessageDescriptor::default();

        let outbound = mq_to_bridge_message(&descriptor, None, msg, None)
            .await
            .unwrap();
        assert_eq!(outbound, msg);

        let (inbound_descriptor, handle, payload) =
            bridge_message_to_mq(msg, "", None).await.unwrap();
        assert_eq!(payload, msg);
        assert!(handle.is_none());

        let expected = MqMessageDescriptor::default();
        assert_eq!(inbound_descriptor.expiry, expected.expiry);
        assert_eq!(inbound_descriptor.version, expected.version);
        assert_eq!(inbound_descriptor.original_length, expected.original_length);
        assert_eq!(inbound_descriptor.format, expected.format);
        assert_eq!(inbound_descriptor.expiry, EXPIRY_UNLIMITED);
        assert_eq!(inbound_descriptor.format, FORMAT_NONE);
    }

    #[test]
    fn header_mirror_carries_every_field() {
        let descriptor = MqMessageDescriptor {
            report: 2,
            msg_type: 3,
            expiry: 4,
            format: "8".to_string(),
            put_date: "20260319".to_string(),
            put_time: "10221577".to_string(),
            ..MqMessageDescriptor::default()
        };

        let header = header_from_descriptor(&descriptor);
        assert_eq!(header.report, 2);
        assert_eq!(header.msg_type, 3);
        assert_eq!(header.expiry, 4);
        assert_eq!(header.format, "8");
        assert_eq!(header.put_date, "20260319");
        assert_eq!(header.put_time, "10221577");
    }

    #[test]
    fn broker_owned_fields_are_not_materialized() {
        let header = BridgeHeader {
            version: 9,
            msg_type: 77,
            expiry: 1234,
            backout_count: 11,
            put_date: "18".to_string(),
            put_time: "19".to_string(),
            report: 2,
            priority: 9,
            ..BridgeHeader::default()
        };

        let descriptor = descriptor_from_header(&header);
        let defaults = MqMessageDescriptor::default();

        assert_eq!(descriptor.version, defaults.version);
        assert_eq!(descriptor.msg_type, defaults.msg_type);
        assert_eq!(descriptor.expiry, defaults.expiry);
        assert_eq!(descriptor.backout_count, defaults.backout_count);
        assert_eq!(descriptor.put_date, defaults.put_date);
        assert_eq!(descriptor.put_time, defaults.put_time);

        assert_eq!(descriptor.report, 2);
        assert_eq!(descriptor.priority, 9);
    }
}
