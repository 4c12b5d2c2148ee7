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

use serde::{Deserialize, Serialize};

/// Width of the fixed-length identifier fields (message id, correlation id,
/// accounting token, group id).
pub const ID_LEN: usize = 24;

// Declared widths of the fixed-length string fields. Values are truncated to
// these widths on encode; decode trims trailing NULs and spaces per MQ
// convention.
pub(crate) const FORMAT_LEN: usize = 8;
pub(crate) const QUEUE_NAME_LEN: usize = 48;
pub(crate) const USER_IDENTIFIER_LEN: usize = 12;
pub(crate) const APPL_IDENTITY_LEN: usize = 32;
pub(crate) const APPL_NAME_LEN: usize = 28;
pub(crate) const PUT_DATE_LEN: usize = 8;
pub(crate) const PUT_TIME_LEN: usize = 8;
pub(crate) const APPL_ORIGIN_LEN: usize = 4;

/// Structural mirror of the MQ message descriptor carried inside the envelope.
///
/// Every descriptor field crosses the wire; which of them are replayed onto
/// the receiving queue manager is the converter's policy, not the codec's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeHeader {
    pub version: i32,
    pub report: i32,
    pub msg_type: i32,
    pub expiry: i32,
    pub feedback: i32,
    pub encoding: i32,
    pub coded_char_set_id: i32,
    pub format: String,
    pub priority: i32,
    pub persistence: i32,
    pub msg_id: [u8; ID_LEN],
    pub correl_id: [u8; ID_LEN],
    pub backout_count: i32,
    pub reply_to_q: String,
    pub reply_to_q_mgr: String,
    pub user_identifier: String,
    pub accounting_token: [u8; ID_LEN],
    pub appl_identity_data: String,
    pub put_appl_type: i32,
    pub put_appl_name: String,
    pub put_date: String,
    pub put_time: String,
    pub appl_origin_data: String,
    pub group_id: [u8; ID_LEN],
    pub msg_seq_number: i32,
    pub offset: i32,
    pub msg_flags: i32,
    pub original_length: i32,
}

impl Default for BridgeHeader {
    fn default() -> Self {
        Self {
            version: 0,
            report: 0,
            msg_type: 0,
            expiry: 0,
            feedback: 0,
            encoding: 0,
            coded_char_set_id: 0,
            format: String::new(),
            priority: 0,
            persistence: 0,
            msg_id: [0; ID_LEN],
            correl_id: [0; ID_LEN],
            backout_count: 0,
            reply_to_q: String::new(),
            reply_to_q_mgr: String::new(),
            user_identifier: String::new(),
            accounting_token: [0; ID_LEN],
            appl_identity_data: String::new(),
            put_appl_type: 0,
            put_appl_name: String::new(),
            put_date: String::new(),
            put_time: String::new(),
            appl_origin_data: String::new(),
            group_id: [0; ID_LEN],
            msg_seq_number: 0,
            offset: 0,
            msg_flags: 0,
            original_length: 0,
        }
    }
}

/// Copies up to [`ID_LEN`] bytes from `src` into a fresh identifier,
/// zero-padding the tail. Always a defensive copy; identifiers must never
/// alias a client library's buffers.
pub fn identifier_from_slice(src: &[u8]) -> [u8; ID_LEN] {
    let mut id = [0u8; ID_LEN];
    let len = src.len().min(ID_LEN);
    id[..len].copy_from_slice(&src[..len]);
    id
}

#[cfg(test)]
mod tests {
    use super::{identifier_from_slice, ID_LEN};

    #[test]
    fn short_identifiers_are_zero_padded() {
        let id = identifier_from_slice(b"hello world");
        assert_eq!(&id[..11], b"hello world");
        assert!(id[11..].iter().all(|b| *b == 0));
    }

    #[test]
    fn long_identifiers_are_clipped_to_width() {
        let id = identifier_from_slice(&[0xAB; 64]);
        assert_eq!(id, [0xAB; ID_LEN]);
    }
}
