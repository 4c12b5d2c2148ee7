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

//! Byte-level layout of the envelope.
//!
//! The envelope is a one-byte format version followed by three length-prefixed
//! sections (header, properties, body). Integers are big-endian. Fixed-width
//! identifier fields travel raw; string fields travel length-prefixed after
//! truncation to their declared width; each property entry is
//! `key-len | key | tag | value` with fixed-width numerics and length-prefixed
//! string/bytes values.

use crate::error::EnvelopeError;
use crate::header::{
    BridgeHeader, APPL_IDENTITY_LEN, APPL_NAME_LEN, APPL_ORIGIN_LEN, FORMAT_LEN, ID_LEN,
    PUT_DATE_LEN, PUT_TIME_LEN, QUEUE_NAME_LEN, USER_IDENTIFIER_LEN,
};
use crate::properties::{tag, PropertyValue};
use bytes::{Buf, BufMut, BytesMut};

pub(crate) const ENVELOPE_VERSION: u8 = 1;

// Version byte plus three empty length-prefixed sections.
pub(crate) const MIN_ENVELOPE_LEN: usize = 1 + 3 * 4;

/// Splits the next `u32`-length-prefixed section off the front of `buf`.
pub(crate) fn get_section<'a>(
    buf: &mut &'a [u8],
    name: &'static str,
) -> Result<&'a [u8], EnvelopeError> {
    if buf.len() < 4 {
        return Err(EnvelopeError::Truncated(name));
    }
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    let rest = &buf[4..];
    if rest.len() < len {
        return Err(EnvelopeError::Truncated(name));
    }
    let (section, remainder) = rest.split_at(len);
    *buf = remainder;
    Ok(section)
}

fn ensure(buf: &[u8], needed: usize, section: &'static str) -> Result<(), EnvelopeError> {
    if buf.remaining() < needed {
        return Err(EnvelopeError::Truncated(section));
    }
    Ok(())
}

/// Truncates `value` to at most `width` bytes without splitting a character.
fn clip(value: &str, width: usize) -> &str {
    if value.len() <= width {
        return value;
    }
    let mut end = width;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

fn put_field_str(buf: &mut BytesMut, value: &str, width: usize) {
    let clipped = clip(value, width);
    buf.put_u16(clipped.len() as u16);
    buf.put_slice(clipped.as_bytes());
}

fn get_field_str(buf: &mut &[u8], section: &'static str) -> Result<String, EnvelopeError> {
    ensure(buf, 2, section)?;
    let len = buf.get_u16() as usize;
    ensure(buf, len, section)?;
    let raw = &buf[..len];
    let value = std::str::from_utf8(raw).map_err(|_| EnvelopeError::InvalidUtf8(section))?;
    let trimmed = value.trim_end_matches(['\0', ' ']).to_string();
    buf.advance(len);
    Ok(trimmed)
}

fn get_identifier(buf: &mut &[u8]) -> Result<[u8; ID_LEN], EnvelopeError> {
    ensure(buf, ID_LEN, "header")?;
    let mut id = [0u8; ID_LEN];
    id.copy_from_slice(&buf[..ID_LEN]);
    buf.advance(ID_LEN);
    Ok(id)
}

pub(crate) fn encode_header(header: &BridgeHeader, buf: &mut BytesMut) {
    buf.put_i32(header.version);
    buf.put_i32(header.report);
    buf.put_i32(header.msg_type);
    buf.put_i32(header.expiry);
    buf.put_i32(header.feedback);
    buf.put_i32(header.encoding);
    buf.put_i32(header.coded_char_set_id);
    put_field_str(buf, &header.format, FORMAT_LEN);
    buf.put_i32(header.priority);
    buf.put_i32(header.persistence);
    buf.put_slice(&header.msg_id);
    buf.put_slice(&header.correl_id);
    buf.put_i32(header.backout_count);
    put_field_str(buf, &header.reply_to_q, QUEUE_NAME_LEN);
    put_field_str(buf, &header.reply_to_q_mgr, QUEUE_NAME_LEN);
    put_field_str(buf, &header.user_identifier, USER_IDENTIFIER_LEN);
    buf.put_slice(&header.accounting_token);
    put_field_str(buf, &header.appl_identity_data, APPL_IDENTITY_LEN);
    buf.put_i32(header.put_appl_type);
    put_field_str(buf, &header.put_appl_name, APPL_NAME_LEN);
    put_field_str(buf, &header.put_date, PUT_DATE_LEN);
    put_field_str(buf, &header.put_time, PUT_TIME_LEN);
    put_field_str(buf, &header.appl_origin_data, APPL_ORIGIN_LEN);
    buf.put_slice(&header.group_id);
    buf.put_i32(header.msg_seq_number);
    buf.put_i32(header.offset);
    buf.put_i32(header.msg_flags);
    buf.put_i32(header.original_length);
}

pub(crate) fn decode_header(mut section: &[u8]) -> Result<BridgeHeader, EnvelopeError> {
    let buf = &mut section;

    let mut header = BridgeHeader::default();
    ensure(buf, 4 * 7, "header")?;
    header.version = buf.get_i32();
    header.report = buf.get_i32();
    header.msg_type = buf.get_i32();
    header.expiry = buf.get_i32();
    header.feedback = buf.get_i32();
    header.encoding = buf.get_i32();
    header.coded_char_set_id = buf.get_i32();
    header.format = get_field_str(buf, "header")?;
    ensure(buf, 4 * 2, "header")?;
    header.priority = buf.get_i32();
    header.persistence = buf.get_i32();
    header.msg_id = get_identifier(buf)?;
    header.correl_id = get_identifier(buf)?;
    ensure(buf, 4, "header")?;
    header.backout_count = buf.get_i32();
    header.reply_to_q = get_field_str(buf, "header")?;
    header.reply_to_q_mgr = get_field_str(buf, "header")?;
    header.user_identifier = get_field_str(buf, "header")?;
    header.accounting_token = get_identifier(buf)?;
    header.appl_identity_data = get_field_str(buf, "header")?;
    ensure(buf, 4, "header")?;
    header.put_appl_type = buf.get_i32();
    header.put_appl_name = get_field_str(buf, "header")?;
    header.put_date = get_field_str(buf, "header")?;
    header.put_time = get_field_str(buf, "header")?;
    header.appl_origin_data = get_field_str(buf, "header")?;
    header.group_id = get_identifier(buf)?;
    ensure(buf, 4 * 4, "header")?;
    header.msg_seq_number = buf.get_i32();
    header.offset = buf.get_i32();
    header.msg_flags = buf.get_i32();
    header.original_length = buf.get_i32();

    if buf.has_remaining() {
        return Err(EnvelopeError::Malformed("header"));
    }
    Ok(header)
}

pub(crate) fn encode_property(
    key: &str,
    value: &PropertyValue,
    buf: &mut BytesMut,
) -> Result<(), EnvelopeError> {
    if key.is_empty() {
        return Err(EnvelopeError::EmptyKey);
    }
    if key.len() > u16::MAX as usize {
        return Err(EnvelopeError::PropertyTooLarge(key.to_string()));
    }
    buf.put_u16(key.len() as u16);
    buf.put_slice(key.as_bytes());
    buf.put_u8(value.tag());
    match value {
        PropertyValue::Null => {}
        PropertyValue::Bool(v) => buf.put_u8(u8::from(*v)),
        PropertyValue::Int8(v) => buf.put_i8(*v),
        PropertyValue::Int16(v) => buf.put_i16(*v),
        PropertyValue::Int32(v) => buf.put_i32(*v),
        PropertyValue::Int64(v) => buf.put_i64(*v),
        PropertyValue::Float32(v) => buf.put_f32(*v),
        PropertyValue::Float64(v) => buf.put_f64(*v),
        PropertyValue::String(v) => {
            if v.len() > u32::MAX as usize {
                return Err(EnvelopeError::PropertyTooLarge(key.to_string()));
            }
            buf.put_u32(v.len() as u32);
            buf.put_slice(v.as_bytes());
        }
        PropertyValue::Bytes(v) => {
            if v.len() > u32::MAX as usize {
                return Err(EnvelopeError::PropertyTooLarge(key.to_string()));
            }
            buf.put_u32(v.len() as u32);
            buf.put_slice(v);
        }
    }
    Ok(())
}

pub(crate) fn decode_property(
    buf: &mut &[u8],
) -> Result<(String, PropertyValue), EnvelopeError> {
    ensure(buf, 2, "properties")?;
    let key_len = buf.get_u16() as usize;
    if key_len == 0 {
        return Err(EnvelopeError::EmptyKey);
    }
    ensure(buf, key_len, "properties")?;
    let key = std::str::from_utf8(&buf[..key_len])
        .map_err(|_| EnvelopeError::InvalidUtf8("properties"))?
        .to_string();
    buf.advance(key_len);

    ensure(buf, 1, "properties")?;
    let tag_byte = buf.get_u8();
    let value = match tag_byte {
        tag::NULL => PropertyValue::Null,
        tag::BOOL => {
            ensure(buf, 1, "properties")?;
            PropertyValue::Bool(buf.get_u8() != 0)
        }
        tag::INT8 => {
            ensure(buf, 1, "properties")?;
            PropertyValue::Int8(buf.get_i8())
        }
        tag::INT16 => {
            ensure(buf, 2, "properties")?;
            PropertyValue::Int16(buf.get_i16())
        }
        tag::INT32 => {
            ensure(buf, 4, "properties")?;
            PropertyValue::Int32(buf.get_i32())
        }
        tag::INT64 => {
            ensure(buf, 8, "properties")?;
            PropertyValue::Int64(buf.get_i64())
        }
        tag::FLOAT32 => {
            ensure(buf, 4, "properties")?;
            PropertyValue::Float32(buf.get_f32())
        }
        tag::FLOAT64 => {
            ensure(buf, 8, "properties")?;
            PropertyValue::Float64(buf.get_f64())
        }
        tag::STRING => {
            ensure(buf, 4, "properties")?;
            let len = buf.get_u32() as usize;
            ensure(buf, len, "properties")?;
            let value = std::str::from_utf8(&buf[..len])
                .map_err(|_| EnvelopeError::InvalidUtf8("properties"))?
                .to_string();
            buf.advance(len);
            PropertyValue::String(value)
        }
        tag::BYTES => {
            ensure(buf, 4, "properties")?;
            let len = buf.get_u32() as usize;
            ensure(buf, len, "properties")?;
            let value = buf[..len].to_vec();
            buf.advance(len);
            PropertyValue::Bytes(value)
        }
        other => return Err(EnvelopeError::UnknownTypeTag(other)),
    };
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_field_for_field() {
        let mut header = BridgeHeader {
            version: 2,
            report: 3,
            format: "MQSTR".to_string(),
            reply_to_q: "DEV.REPLY.QUEUE".to_string(),
            user_identifier: "app".to_string(),
            put_date: "20260319".to_string(),
            put_time: "10221577".to_string(),
            original_length: -1,
            ..BridgeHeader::default()
        };
        header.msg_id[..5].copy_from_slice(b"alpha");

        let mut buf = BytesMut::new();
        encode_header(&header, &mut buf);
        let decoded = decode_header(&buf).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn strings_clip_to_declared_width_on_encode() {
        let header = BridgeHeader {
            format: "LONGER-THAN-EIGHT".to_string(),
            ..BridgeHeader::default()
        };
        let mut buf = BytesMut::new();
        encode_header(&header, &mut buf);
        let decoded = decode_header(&buf).unwrap();
        assert_eq!(decoded.format, "LONGER-T");
    }

    #[test]
    fn decode_trims_trailing_nuls_and_spaces() {
        let header = BridgeHeader {
            format: "MQSTR \0 ".to_string(),
            ..BridgeHeader::default()
        };
        let mut buf = BytesMut::new();
        encode_header(&header, &mut buf);
        let decoded = decode_header(&buf).unwrap();
        assert_eq!(decoded.format, "MQSTR");
    }

    #[test]
    fn truncated_header_is_an_error() {
        let mut buf = BytesMut::new();
        encode_header(&BridgeHeader::default(), &mut buf);
        let short = &buf[..buf.len() - 3];
        assert_eq!(decode_header(short), Err(EnvelopeError::Truncated("header")));
    }

    #[test]
    fn header_with_trailing_bytes_is_an_error() {
        let mut buf = BytesMut::new();
        encode_header(&BridgeHeader::default(), &mut buf);
        buf.put_u8(0xFF);
        assert_eq!(decode_header(&buf), Err(EnvelopeError::Malformed("header")));
    }

    #[test]
    fn unknown_property_tag_is_an_error() {
        let mut buf = BytesMut::new();
        buf.put_u16(1);
        buf.put_slice(b"k");
        buf.put_u8(0x7F);
        let mut slice: &[u8] = &buf;
        assert_eq!(
            decode_property(&mut slice),
            Err(EnvelopeError::UnknownTypeTag(0x7F))
        );
    }

    #[test]
    fn zero_length_property_key_is_an_error() {
        let mut buf = BytesMut::new();
        buf.put_u16(0);
        buf.put_u8(tag::NULL);
        let mut slice: &[u8] = &buf;
        assert_eq!(decode_property(&mut slice), Err(EnvelopeError::EmptyKey));
    }

    #[test]
    fn truncated_property_value_is_an_error() {
        let mut buf = BytesMut::new();
        encode_property("count", &PropertyValue::Int64(7), &mut buf).unwrap();
        let mut slice: &[u8] = &buf[..buf.len() - 2];
        assert_eq!(
            decode_property(&mut slice),
            Err(EnvelopeError::Truncated("properties"))
        );
    }
}
