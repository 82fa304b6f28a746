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

//! Channel configuration records.
//!
//! A [`ChannelRecord`] is one entry of the list handed to
//! [`MessageBus::configure`](crate::MessageBus::configure). Records are
//! plain serde-able values; how the embedding process obtains them
//! (file, service, hard-coded) is its own business.

use serde::{Deserialize, Serialize};

/// One configured channel: a logical name bound to a transport address,
/// optionally advertising topics.
///
/// A record with no topics describes a point-to-point channel; a record
/// with topics describes a pub/sub channel whose messages are filtered
/// by topic on the subscriber side. Records are immutable once the bus
/// is configured.
///
/// The serialized shape is:
///
/// ```json
/// { "name": "tpc", "address": "inproc://tpc", "topics": ["raw", "calib"] }
/// ```
///
/// with `topics` defaulting to empty when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Unique, non-empty channel name.
    pub name: String,
    /// Opaque transport address, e.g. `inproc://tpc` or `tcp://host:port`.
    pub address: String,
    /// Topics this channel publishes; empty for point-to-point channels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
}

impl ChannelRecord {
    /// Creates a point-to-point record.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            topics: Vec::new(),
        }
    }

    /// Adds the advertised topics, turning the record into a pub/sub
    /// channel.
    #[must_use]
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` if this record describes a pub/sub channel.
    #[must_use]
    pub fn is_pubsub(&self) -> bool {
        !self.topics.is_empty()
    }
}
