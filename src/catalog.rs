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

//! The channel catalog: name and topic resolution.
//!
//! A catalog is built atomically from a record list and is immutable
//! afterwards; the facade swaps a whole catalog in on `configure` and
//! swaps an empty one back in on `reset`. Name invariant: the channel
//! name space and the topic name space are disjoint.

use crate::config::ChannelRecord;
use crate::error::BusError;
use std::collections::HashMap;

/// The configured channel table plus the derived topic index.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    /// Channel name to record.
    channels: HashMap<String, ChannelRecord>,
    /// Topic to the names of the channels that publish it, in
    /// configuration order.
    topics: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Builds a catalog from a record list, enforcing the name
    /// invariant. The input is untouched on failure.
    pub fn from_records(records: &[ChannelRecord]) -> Result<Self, BusError> {
        let mut catalog = Self::default();
        for record in records {
            if record.name.is_empty() {
                return Err(BusError::operation_failed("channel name must not be empty"));
            }
            tracing::debug!(channel = %record.name, address = %record.address, "adding channel to catalog");
            if catalog.channels.contains_key(&record.name)
                || catalog.topics.contains_key(&record.name)
            {
                return Err(BusError::NameCollision {
                    name: record.name.clone(),
                });
            }
            catalog
                .channels
                .insert(record.name.clone(), record.clone());
            for topic in &record.topics {
                if catalog.channels.contains_key(topic) {
                    return Err(BusError::NameCollision {
                        name: topic.clone(),
                    });
                }
                let publishers = catalog.topics.entry(topic.clone()).or_default();
                if !publishers.contains(&record.name) {
                    publishers.push(record.name.clone());
                }
            }
        }
        Ok(catalog)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// `true` iff `key` is a channel name (and, by the invariant, not a
    /// topic).
    pub fn is_connection(&self, key: &str) -> bool {
        self.channels.contains_key(key) && !self.topics.contains_key(key)
    }

    /// `true` iff `key` is a topic name (and not a channel).
    pub fn is_topic(&self, key: &str) -> bool {
        self.topics.contains_key(key) && !self.channels.contains_key(key)
    }

    /// `true` iff `key` is a channel that advertises at least one topic.
    pub fn is_pubsub_connection(&self, key: &str) -> bool {
        self.is_connection(key) && self.channels[key].is_pubsub()
    }

    /// `true` iff `key` is either a channel name or a topic name.
    pub fn has_key(&self, key: &str) -> bool {
        self.channels.contains_key(key) || self.topics.contains_key(key)
    }

    pub fn record(&self, name: &str) -> Option<&ChannelRecord> {
        self.channels.get(name)
    }

    /// The address of a channel.
    pub fn connection_string(&self, name: &str) -> Result<String, BusError> {
        self.channels
            .get(name)
            .map(|record| record.address.clone())
            .ok_or_else(|| BusError::connection_not_found(name))
    }

    /// The addresses of every channel publishing `topic`, in
    /// configuration order.
    pub fn connection_strings(&self, topic: &str) -> Result<Vec<String>, BusError> {
        let publishers = self
            .topics
            .get(topic)
            .ok_or_else(|| BusError::topic_not_found(topic))?;
        Ok(publishers
            .iter()
            .map(|name| self.channels[name].address.clone())
            .collect())
    }

    /// The topics advertised by a channel; empty for point-to-point
    /// channels and unknown names.
    pub fn topics_of(&self, name: &str) -> &[String] {
        self.channels
            .get(name)
            .map(|record| record.topics.as_slice())
            .unwrap_or(&[])
    }
}
