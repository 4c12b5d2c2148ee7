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

use crate::histogram::Histogram;
use serde::Serialize;
use std::time::Duration;

/// Bin bound for the per-connector request-time histogram.
pub const REQUEST_TIME_BINS: usize = 160;

/// Counters for one connector. The owning connector mutates this under its
/// lock; readers receive a value copy, never a shared reference.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectorStats {
    pub name: String,
    pub id: String,
    pub connects: u64,
    pub disconnects: u64,
    pub messages_in: u64,
    pub messages_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Request latencies in seconds, delivery to post-publish commit.
    pub request_times: Histogram,
}

impl ConnectorStats {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            id: String::new(),
            connects: 0,
            disconnects: 0,
            messages_in: 0,
            messages_out: 0,
            bytes_in: 0,
            bytes_out: 0,
            last_error: None,
            request_times: Histogram::new(REQUEST_TIME_BINS),
        }
    }

    pub fn add_connect(&mut self) {
        self.connects += 1;
    }

    pub fn add_disconnect(&mut self) {
        self.disconnects += 1;
    }

    pub fn add_message_in(&mut self, bytes: u64) {
        self.messages_in += 1;
        self.bytes_in += bytes;
    }

    pub fn add_message_out(&mut self, bytes: u64) {
        self.messages_out += 1;
        self.bytes_out += bytes;
    }

    pub fn add_request_time(&mut self, elapsed: Duration) {
        self.request_times.add(elapsed.as_secs_f64());
    }

    pub fn record_error(&mut self, err: &str) {
        self.last_error = Some(err.to_string());
    }
}

impl Default for ConnectorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide snapshot: bridge start time plus a value copy of every
/// connector's counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BridgeStats {
    /// Unix seconds at supervisor start.
    pub start_time: i64,
    pub connectors: Vec<ConnectorStats>,
}

#[cfg(test)]
mod tests {
    use super::ConnectorStats;
    use std::time::Duration;

    #[test]
    fn counters_track_messages_and_bytes() {
        let mut stats = ConnectorStats::new();
        stats.add_connect();
        stats.add_message_in(11);
        stats.add_message_in(5);
        stats.add_message_out(11);
        stats.add_request_time(Duration::from_millis(3));
        stats.add_disconnect();

        assert_eq!(stats.connects, 1);
        assert_eq!(stats.disconnects, 1);
        assert_eq!(stats.messages_in, 2);
        assert_eq!(stats.bytes_in, 16);
        assert_eq!(stats.messages_out, 1);
        assert_eq!(stats.bytes_out, 11);
        assert_eq!(stats.request_times.count(), 1);
    }

    #[test]
    fn snapshots_are_value_copies() {
        let mut stats = ConnectorStats::new();
        stats.add_message_in(100);

        let snapshot = stats.clone();
        stats.add_message_in(100);

        assert_eq!(snapshot.messages_in, 1);
        assert_eq!(stats.messages_in, 2);
    }

    #[test]
    fn last_error_is_replaced_not_accumulated() {
        let mut stats = ConnectorStats::new();
        assert!(stats.last_error.is_none());
        stats.record_error("first");
        stats.record_error("second");
        assert_eq!(stats.last_error.as_deref(), Some("second"));
    }
}
