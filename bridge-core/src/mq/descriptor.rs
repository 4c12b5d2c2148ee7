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

use bridge_message::ID_LEN;

// Descriptor field values matching the MQ client library's defaults.
pub const DESCRIPTOR_VERSION_1: i32 = 1;
pub const MSG_TYPE_DATAGRAM: i32 = 8;
pub const EXPIRY_UNLIMITED: i32 = -1;
pub const ENCODING_NATIVE: i32 = 546;
pub const CCSID_QUEUE_MANAGER: i32 = 0;
pub const PRIORITY_AS_QUEUE_DEFAULT: i32 = -1;
pub const PERSISTENCE_AS_QUEUE_DEFAULT: i32 = 2;
pub const PERSISTENCE_NOT_PERSISTENT: i32 = 0;
pub const PERSISTENCE_PERSISTENT: i32 = 1;
pub const ORIGINAL_LENGTH_UNDEFINED: i32 = -1;
/// Eight blanks: no declared payload format.
pub const FORMAT_NONE: &str = "        ";

/// The fixed-schema record carried alongside every MQ message.
///
/// Identifier fields are fixed 24-byte arrays and are always copied
/// defensively; aliasing the client library's buffers would corrupt data
/// across concurrent messages.
#[derive(Debug, Clone, PartialEq)]
pub struct MqMessageDescriptor {
    pub version: i32,
    /// Report-option bitmask.
    pub report: i32,
    pub msg_type: i32,
    /// Expiry in tenths of a second; negative means unlimited.
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
    /// "YYYYMMDD", stamped by the queue manager on put.
    pub put_date: String,
    /// "HHMMSSTH" (tenths, hundredths), stamped by the queue manager on put.
    pub put_time: String,
    pub appl_origin_data: String,
    pub group_id: [u8; ID_LEN],
    pub msg_seq_number: i32,
    pub offset: i32,
    pub msg_flags: i32,
    pub original_length: i32,
}

impl Default for MqMessageDescriptor {
    fn default() -> Self {
        Self {
            version: DESCRIPTOR_VERSION_1,
            report: 0,
            msg_type: MSG_TYPE_DATAGRAM,
            expiry: EXPIRY_UNLIMITED,
            feedback: 0,
            encoding: ENCODING_NATIVE,
            coded_char_set_id: CCSID_QUEUE_MANAGER,
            format: FORMAT_NONE.to_string(),
            priority: PRIORITY_AS_QUEUE_DEFAULT,
            persistence: PERSISTENCE_AS_QUEUE_DEFAULT,
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
            msg_seq_number: 1,
            offset: 0,
            msg_flags: 0,
            original_length: ORIGINAL_LENGTH_UNDEFINED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_the_client_library_defaults() {
        let descriptor = MqMessageDescriptor::default();
        assert_eq!(descriptor.version, DESCRIPTOR_VERSION_1);
        assert_eq!(descriptor.expiry, EXPIRY_UNLIMITED);
        assert_eq!(descriptor.format, FORMAT_NONE);
        assert_eq!(descriptor.persistence, PERSISTENCE_AS_QUEUE_DEFAULT);
        assert_eq!(descriptor.original_length, ORIGINAL_LENGTH_UNDEFINED);
        assert_eq!(descriptor.msg_seq_number, 1);
        assert_eq!(descriptor.msg_id, [0u8; ID_LEN]);
    }
}
