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

use crate::error::EnvelopeError;
use crate::header::BridgeHeader;
use crate::properties::PropertyValue;
use crate::wire;
use bytes::{Buf, BufMut, BytesMut};
use std::collections::HashMap;

/// A bridged message: descriptor mirror, typed user properties and the
/// original payload, convertible to and from the self-describing wire form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeMessage {
    pub header: BridgeHeader,
    properties: HashMap<String, PropertyValue>,
    pub body: Vec<u8>,
}

impl BridgeMessage {
    /// Creates a message wrapping `body` with an empty header and no
    /// properties.
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            header: BridgeHeader::default(),
            properties: HashMap::new(),
            body,
        }
    }

    /// Sets a property, replacing any previous value under the same key.
    ///
    /// Accepts any of the supported value types through [`PropertyValue`]'s
    /// `From` impls; values outside that set are unrepresentable.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Removes a property, returning the previous value or
    /// [`PropertyValue::Null`] when the key was absent.
    pub fn delete_property(&mut self, key: &str) -> PropertyValue {
        self.properties.remove(key).unwrap_or(PropertyValue::Null)
    }

    pub fn get_typed_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn get_string_property(&self, key: &str) -> Option<&str> {
        match self.properties.get(key) {
            Some(PropertyValue::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_bool_property(&self, key: &str) -> Option<bool> {
        match self.properties.get(key) {
            Some(PropertyValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_int8_property(&self, key: &str) -> Option<i8> {
        match self.properties.get(key) {
            Some(PropertyValue::Int8(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_int16_property(&self, key: &str) -> Option<i16> {
        match self.properties.get(key) {
            Some(PropertyValue::Int16(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_int32_property(&self, key: &str) -> Option<i32> {
        match self.properties.get(key) {
            Some(PropertyValue::Int32(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_int64_property(&self, key: &str) -> Option<i64> {
        match self.properties.get(key) {
            Some(PropertyValue::Int64(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_float32_property(&self, key: &str) -> Option<f32> {
        match self.properties.get(key) {
            Some(PropertyValue::Float32(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_float64_property(&self, key: &str) -> Option<f64> {
        match self.properties.get(key) {
            Some(PropertyValue::Float64(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_bytes_property(&self, key: &str) -> Option<&[u8]> {
        match self.properties.get(key) {
            Some(PropertyValue::Bytes(value)) => Some(value),
            _ => None,
        }
    }

    /// Iterates over all properties in unspecified order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Encodes the message into its wire form.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        let mut header = BytesMut::new();
        wire::encode_header(&self.header, &mut header);

        let mut properties = BytesMut::new();
        properties.put_u32(self.properties.len() as u32);
        for (key, value) in &self.properties {
            wire::encode_property(key, value, &mut properties)?;
        }

        let mut out =
            BytesMut::with_capacity(wire::MIN_ENVELOPE_LEN + header.len() + properties.len() + self.body.len());
        out.put_u8(wire::ENVELOPE_VERSION);
        out.put_u32(header.len() as u32);
        out.put_slice(&header);
        out.put_u32(properties.len() as u32);
        out.put_slice(&properties);
        out.put_u32(self.body.len() as u32);
        out.put_slice(&self.body);
        Ok(out.to_vec())
    }

    /// Decodes a message from its wire form.
    pub fn decode(data: &[u8]) -> Result<Self, EnvelopeError> {
        if data.len() < wire::MIN_ENVELOPE_LEN {
            return Err(EnvelopeError::TooShort(data.len()));
        }

        let mut buf = data;
        let version = buf.get_u8();
        if version != wire::ENVELOPE_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(version));
        }

        let header_section = wire::get_section(&mut buf, "header")?;
        let header = wire::decode_header(header_section)?;

        let mut properties_section = wire::get_section(&mut buf, "properties")?;
        if properties_section.len() < 4 {
            return Err(EnvelopeError::Truncated("properties"));
        }
        let count = properties_section.get_u32() as usize;
        let mut properties = HashMap::with_capacity(count);
        for _ in 0..count {
            let (key, value) = wire::decode_property(&mut properties_section)?;
            if properties.insert(key.clone(), value).is_some() {
                return Err(EnvelopeError::DuplicateKey(key));
            }
        }
        if properties_section.has_remaining() {
            return Err(EnvelopeError::Malformed("properties"));
        }

        let body = wire::get_section(&mut buf, "body")?.to_vec();
        if buf.has_remaining() {
            return Err(EnvelopeError::Malformed("body"));
        }

        Ok(Self {
            header,
            properties,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::identifier_from_slice;

    #[test]
    fn encode_decode_keeps_header_and_body() {
        let mut msg = BridgeMessage::new(b"hello world".to_vec());
        msg.header = BridgeHeader {
            version: 1,
            report: 2,
            ..BridgeHeader::default()
        };

        let encoded = msg.encode().unwrap();
        let decoded = BridgeMessage::decode(&encoded).unwrap();

        assert_eq!(decoded.body, b"hello world");
        assert_eq!(decoded.header.version, msg.header.version);
        assert_eq!(decoded.header.report, msg.header.report);
    }

    #[test]
    fn decoding_arbitrary_bytes_fails() {
        assert!(BridgeMessage::decode(b"hello world").is_err());
    }

    #[test]
    fn all_property_types_round_trip() {
        let mut msg = BridgeMessage::new(Vec::new());

        let expected: Vec<(&str, PropertyValue)> = vec![
            ("string", PropertyValue::from("hello world")),
            ("int8", PropertyValue::from(9i8)),
            ("int16", PropertyValue::from(259i16)),
            ("int32", PropertyValue::from(222_222_222i32)),
            ("int64", PropertyValue::from(222_222_222_222_222_222i64)),
            ("float32", PropertyValue::from(3.14f32)),
            ("float64", PropertyValue::from(6.4999f64)),
            ("bool", PropertyValue::from(true)),
            ("bytes", PropertyValue::from(b"one two three four".as_slice())),
            ("null", PropertyValue::Null),
        ];

        for (key, value) in &expected {
            msg.set_property(*key, value.clone());
            assert_eq!(msg.get_typed_property(key), Some(value));
            assert!(msg.has_property(key));
        }

        assert_eq!(msg.get_string_property("string"), Some("hello world"));
        assert_eq!(msg.get_int8_property("int8"), Some(9));
        assert_eq!(msg.get_int16_property("int16"), Some(259));
        assert_eq!(msg.get_int32_property("int32"), Some(222_222_222));
        assert_eq!(msg.get_int64_property("int64"), Some(222_222_222_222_222_222));
        assert_eq!(msg.get_float32_property("float32"), Some(3.14));
        assert_eq!(msg.get_float64_property("float64"), Some(6.4999));
        assert_eq!(msg.get_bool_property("bool"), Some(true));
        assert_eq!(
            msg.get_bytes_property("bytes"),
            Some(b"one two three four".as_slice())
        );
        assert!(msg.get_string_property("bad").is_none());
        assert!(msg.get_bytes_property("bad").is_none());

        let encoded = msg.encode().unwrap();
        let decoded = BridgeMessage::decode(&encoded).unwrap();
        for (key, value) in &expected {
            assert_eq!(decoded.get_typed_property(key), Some(value));
        }
    }

    #[test]
    fn native_int_property_is_64_bit() {
        let mut msg = BridgeMessage::new(Vec::new());
        msg.set_property("test", 3333isize);

        assert_eq!(
            msg.get_typed_property("test"),
            Some(&PropertyValue::Int64(3333))
        );
        assert!(msg.has_property("test"));

        let decoded = BridgeMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded.get_int64_property("test"), Some(3333));
    }

    #[test]
    fn null_property_is_present_and_typed() {
        let mut msg = BridgeMessage::new(Vec::new());
        msg.set_property("test", ());

        assert_eq!(msg.get_typed_property("test"), Some(&PropertyValue::Null));
        assert!(msg.has_property("test"));
        assert!(msg.get_typed_property("bad").is_none());
    }

    #[test]
    fn delete_property_returns_previous_value() {
        let mut msg = BridgeMessage::new(Vec::new());
        msg.set_property("test", "hello");
        assert!(msg.has_property("test"));

        let old = msg.delete_property("test");
        assert_eq!(old, PropertyValue::from("hello"));
        assert!(!msg.has_property("test"));

        let old = msg.delete_property("test");
        assert!(old.is_null());
    }

    #[test]
    fn mismatched_getter_returns_none() {
        let mut msg = BridgeMessage::new(Vec::new());
        msg.set_property("test", "hello");
        assert!(msg.get_int32_property("test").is_none());
    }

    #[test]
    fn resetting_a_property_replaces_it() {
        let mut msg = BridgeMessage::new(Vec::new());
        msg.set_property("test", 1i32);
        msg.set_property("test", 2i64);
        assert_eq!(msg.property_count(), 1);
        assert_eq!(msg.get_int64_property("test"), Some(2));
    }

    #[test]
    fn identifiers_and_large_bodies_survive_the_wire() {
        let mut msg = BridgeMessage::new(vec![0x5A; 64 * 1024]);
        msg.header.msg_id = identifier_from_slice(b"hello world");
        msg.header.correl_id = identifier_from_slice(&[0xFF; 24]);

        let decoded = BridgeMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded.header.msg_id, msg.header.msg_id);
        assert_eq!(decoded.header.correl_id, msg.header.correl_id);
        assert_eq!(decoded.body.len(), 64 * 1024);
    }

    #[test]
    fn truncated_envelope_sections_fail() {
        let mut msg = BridgeMessage::new(b"payload".to_vec());
        msg.set_property("key", "value");
        let encoded = msg.encode().unwrap();

        for end in [1usize, 5, encoded.len() - 1] {
            assert!(BridgeMessage::decode(&encoded[..end]).is_err());
        }
    }

    #[test]
    fn unsupported_version_byte_fails() {
        let mut encoded = BridgeMessage::new(Vec::new()).encode().unwrap();
        encoded[0] = 9;
        assert_eq!(
            BridgeMessage::decode(&encoded),
            Err(EnvelopeError::UnsupportedVersion(9))
        );
    }
}
