//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Per-channel traffic counters.
//!
//! Counters are plain atomics updated on every send and receive and
//! sampled with read-and-reset semantics: each sample reports the
//! traffic since the previous one. How samples are shipped to a
//! telemetry system is the embedding process's concern.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one channel or topic key.
#[derive(Debug, Default)]
struct ChannelCounters {
    sent_bytes: AtomicU64,
    sent_messages: AtomicU64,
    received_bytes: AtomicU64,
    received_messages: AtomicU64,
}

impl ChannelCounters {
    fn record_sent(&self, bytes: u64) {
        self.sent_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.sent_messages.fetch_add(1, Ordering::Relaxed);
    }

    fn record_received(&self, bytes: u64) {
        self.received_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.received_messages.fetch_add(1, Ordering::Relaxed);
    }

    fn sample(&self) -> CounterSample {
        CounterSample {
            sent_bytes: self.sent_bytes.swap(0, Ordering::Relaxed),
            sent_messages: self.sent_messages.swap(0, Ordering::Relaxed),
            received_bytes: self.received_bytes.swap(0, Ordering::Relaxed),
            received_messages: self.received_messages.swap(0, Ordering::Relaxed),
        }
    }
}

/// One telemetry sample for one key: the traffic recorded since the
/// previous sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSample {
    /// Payload bytes sent on the channel.
    pub sent_bytes: u64,
    /// Messages sent on the channel.
    pub sent_messages: u64,
    /// Payload bytes received on the key.
    pub received_bytes: u64,
    /// Messages received on the key.
    pub received_messages: u64,
}

/// The facade's counter table, keyed by channel or topic name and
/// populated lazily on first traffic.
#[derive(Debug, Default)]
pub(crate) struct BusMetrics {
    channels: Mutex<HashMap<String, Arc<ChannelCounters>>>,
}

impl BusMetrics {
    fn counters_for(&self, key: &str) -> Arc<ChannelCounters> {
        self.channels
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    pub fn record_sent(&self, name: &str, bytes: usize) {
        self.counters_for(name).record_sent(bytes as u64);
    }

    pub fn record_received(&self, key: &str, bytes: usize) {
        self.counters_for(key).record_received(bytes as u64);
    }

    /// Samples and zeroes every counter, keyed in lexical order.
    pub fn sample(&self) -> BTreeMap<String, CounterSample> {
        let channels = self.channels.lock();
        channels
            .iter()
            .map(|(key, counters)| (key.clone(), counters.sample()))
            .collect()
    }

    pub fn clear(&self) {
        self.channels.lock().clear();
    }
}
