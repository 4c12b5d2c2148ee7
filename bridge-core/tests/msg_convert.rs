//! Conversion round-trips against the in-memory queue manager: the copied
//! descriptor subset and all eleven property inputs must survive an
//! MQ -> envelope -> MQ pass intact.

use bridge_core::config::MqConfig;
use bridge_core::convert::{bridge_message_to_mq, mq_to_bridge_message};
use bridge_core::mq::{MessageHandle, MqClient, MqMessageDescriptor, QueueManager};
use bridge_message::{identifier_from_slice, PropertyValue};
use bridge_test_utils::MemoryMqServer;
use std::collections::HashMap;
use std::sync::Arc;

async fn properties_of(handle: &Arc<dyn MessageHandle>) -> HashMap<String, PropertyValue> {
    let mut cursor = handle.properties().await.unwrap();
    let mut properties = HashMap::new();
    while let Some((key, value)) = cursor.next().await.unwrap() {
        properties.insert(key, value);
    }
    properties
}

async fn connect() -> Arc<dyn QueueManager> {
    let server = MemoryMqServer::new();
    server.connect(&MqConfig::default()).await.unwrap()
}

#[tokio::test]
async fn descriptor_and_properties_round_trip() {
    let qmgr = connect().await;
    let msg = b"hello world";

    // Values are not valid MQ values, but they are testable.
    let expected = MqMessageDescriptor {
        report: 2,
        feedback: 5,
        encoding: 6,
        coded_char_set_id: 7,
        format: "8".to_string(),
        priority: 9,
        msg_id: identifier_from_slice(msg),
        correl_id: identifier_from_slice(msg),
        reply_to_q: "12".to_string(),
        reply_to_q_mgr: "13".to_string(),
        user_identifier: "14".to_string(),
        accounting_token: identifier_from_slice(msg),
        appl_identity_data: "15".to_string(),
        put_appl_type: 16,
        put_appl_name: "17".to_string(),
        appl_origin_data: "20".to_string(),
        group_id: identifier_from_slice(msg),
        msg_seq_number: 21,
        offset: 22,
        msg_flags: 23,
        original_length: 24,
        ..MqMessageDescriptor::default()
    };

    let handle_in = qmgr.create_message_handle().await.unwrap();
    handle_in
        .set_property("one", &PropertyValue::from("alpha"))
        .await
        .unwrap();
    handle_in
        .set_property("two", &PropertyValue::from(356isize))
        .await
        .unwrap();
    handle_in
        .set_property("two8", &PropertyValue::from(17i8))
        .await
        .unwrap();
    handle_in
        .set_property("two16", &PropertyValue::from(129i16))
        .await
        .unwrap();
    handle_in
        .set_property("two32", &PropertyValue::from(356i32))
        .await
        .unwrap();
    handle_in
        .set_property("two64", &PropertyValue::from(11_123_123_123i64))
        .await
        .unwrap();
    handle_in
        .set_property("three32", &PropertyValue::from(3.0f32))
        .await
        .unwrap();
    handle_in
        .set_property("three64", &PropertyValue::from(322_222.0f64))
        .await
        .unwrap();
    handle_in
        .set_property("four", &PropertyValue::from(b"alpha".as_slice()))
        .await
        .unwrap();
    handle_in
        .set_property("five", &PropertyValue::from(true))
        .await
        .unwrap();
    handle_in
        .set_property("six", &PropertyValue::Null)
        .await
        .unwrap();

    let encoded = mq_to_bridge_message(&expected, Some(&handle_in), msg, Some(&qmgr))
        .await
        .unwrap();
    assert_ne!(encoded.as_slice(), msg.as_slice());

    let (descriptor, handle_out, payload) = bridge_message_to_mq(&encoded, "", Some(&qmgr))
        .await
        .unwrap();
    assert_eq!(payload, msg);

    let properties = properties_of(&handle_out.unwrap()).await;
    assert_eq!(properties.get("one"), Some(&PropertyValue::from("alpha")));
    assert_eq!(properties.get("two"), Some(&PropertyValue::Int64(356)));
    assert_eq!(properties.get("two8"), Some(&PropertyValue::Int8(17)));
    assert_eq!(properties.get("two16"), Some(&PropertyValue::Int16(129)));
    assert_eq!(properties.get("two32"), Some(&PropertyValue::Int32(356)));
    assert_eq!(
        properties.get("two64"),
        Some(&PropertyValue::Int64(11_123_123_123))
    );
    assert_eq!(properties.get("three32"), Some(&PropertyValue::Float32(3.0)));
    assert_eq!(
        properties.get("three64"),
        Some(&PropertyValue::Float64(322_222.0))
    );
    assert_eq!(
        properties.get("four"),
        Some(&PropertyValue::from(b"alpha".as_slice()))
    );
    assert_eq!(properties.get("five"), Some(&PropertyValue::Bool(true)));
    assert_eq!(properties.get("six"), Some(&PropertyValue::Null));

    assert_eq!(descriptor.persistence, expected.persistence);
    assert_eq!(descriptor.report, expected.report);
    assert_eq!(descriptor.feedback, expected.feedback);
    assert_eq!(descriptor.encoding, expected.encoding);
    assert_eq!(descriptor.coded_char_set_id, expected.coded_char_set_id);
    assert_eq!(descriptor.format, expected.format);
    assert_eq!(descriptor.priority, expected.priority);
    assert_eq!(descriptor.reply_to_q, expected.reply_to_q);
    assert_eq!(descriptor.reply_to_q_mgr, expected.reply_to_q_mgr);
    assert_eq!(descriptor.user_identifier, expected.user_identifier);
    assert_eq!(descriptor.appl_identity_data, expected.appl_identity_data);
    assert_eq!(descriptor.put_appl_type, expected.put_appl_type);
    assert_eq!(descriptor.put_appl_name, expected.put_appl_name);
    assert_eq!(descriptor.appl_origin_data, expected.appl_origin_data);
    assert_eq!(descriptor.msg_seq_number, expected.msg_seq_number);
    assert_eq!(descriptor.offset, expected.offset);
    assert_eq!(descriptor.msg_flags, expected.msg_flags);
    assert_eq!(descriptor.original_length, expected.original_length);

    assert_eq!(descriptor.msg_id, expected.msg_id);
    assert_eq!(descriptor.correl_id, expected.correl_id);
    assert_eq!(descriptor.accounting_token, expected.accounting_token);
    assert_eq!(descriptor.group_id, expected.group_id);
}

#[tokio::test]
async fn broker_owned_fields_reset_on_the_receiving_side() {
    let qmgr = connect().await;

    let sent = MqMessageDescriptor {
        version: 9,
        msg_type: 77,
        expiry: 1234,
        backout_count: 11,
        put_date: "19991231".to_string(),
        put_time: "23595999".to_string(),
        ..MqMessageDescriptor::default()
    };

    let encoded = mq_to_bridge_message(&sent, None, b"x", Some(&qmgr))
        .await
        .unwrap();
    let (descriptor, _, _) = bridge_message_to_mq(&encoded, "", Some(&qmgr))
        .await
        .unwrap();

    let defaults = MqMessageDescriptor::default();
    assert_eq!(descriptor.version, defaults.version);
    assert_eq!(descriptor.msg_type, defaults.msg_type);
    assert_eq!(descriptor.expiry, defaults.expiry);
    assert_eq!(descriptor.backout_count, defaults.backout_count);
    assert_eq!(descriptor.put_date, defaults.put_date);
    assert_eq!(descriptor.put_time, defaults.put_time);
}

#[tokio::test]
async fn reply_to_fills_an_empty_reply_queue() {
    let qmgr = connect().await;

    let encoded = mq_to_bridge_message(&MqMessageDescriptor::default(), None, b"x", Some(&qmgr))
        .await
        .unwrap();
    let (descriptor, _, _) = bridge_message_to_mq(&encoded, "DEV.REPLY.QUEUE", Some(&qmgr))
        .await
        .unwrap();
    assert_eq!(descriptor.reply_to_q, "DEV.REPLY.QUEUE");

    let explicit = MqMessageDescriptor {
        reply_to_q: "EXPLICIT.QUEUE".to_string(),
        ..MqMessageDescriptor::default()
    };
    let encoded = mq_to_bridge_message(&explicit, None, b"x", Some(&qmgr))
        .await
        .unwrap();
    let (descriptor, _, _) = bridge_message_to_mq(&encoded, "DEV.REPLY.QUEUE", Some(&qmgr))
        .await
        .unwrap();
    assert_eq!(descriptor.reply_to_q, "EXPLICIT.QUEUE");
}
