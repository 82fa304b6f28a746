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

//! The lazy endpoint cache.
//!
//! The registry guarantees at most one transport endpoint per key.
//! Creation happens under the owning map's mutex (lookup, role
//! selection, connect, post-connect subscription); a failure at any
//! step leaves no entry behind. The returned handles are
//! reference-counted so callers perform I/O without holding a map lock.
//!
//! The registry also owns the per-channel send locks: one lazily
//! created `Arc<Mutex<()>>` per channel name, with a stable identity
//! concurrent senders serialize on.

use crate::bus::Direction;
use crate::catalog::Catalog;
use crate::error::BusError;
use crate::transport::{
    EndpointConfig, ReceiveEndpoint, ReceiveRole, SendEndpoint, SendRole, SubscribeEndpoint,
    Transport, TransportError,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct EndpointRegistry {
    transport: Arc<dyn Transport>,
    receivers: Mutex<HashMap<String, Arc<dyn ReceiveEndpoint>>>,
    senders: Mutex<HashMap<String, Arc<dyn SendEndpoint>>>,
    send_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EndpointRegistry {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            receivers: Mutex::new(HashMap::new()),
            senders: Mutex::new(HashMap::new()),
            send_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the receive endpoint for `key`, creating and connecting
    /// it on first use.
    ///
    /// Role selection: a topic, or a channel advertising topics, gets a
    /// `Subscriber`; any other channel gets a `Receiver`. A topic
    /// endpoint fans in from every channel publishing the topic and is
    /// subscribed to the topic itself; a pub/sub channel endpoint is
    /// subscribed to every topic the channel advertises.
    pub fn receiver(
        &self,
        key: &str,
        catalog: &Catalog,
    ) -> Result<Arc<dyn ReceiveEndpoint>, BusError> {
        let mut receivers = self.receivers.lock();
        if let Some(endpoint) = receivers.get(key) {
            return Ok(Arc::clone(endpoint));
        }

        let role = if catalog.is_topic(key) || catalog.is_pubsub_connection(key) {
            ReceiveRole::Subscriber
        } else {
            ReceiveRole::Receiver
        };
        tracing::debug!(key = %key, ?role, "creating receive endpoint");
        let endpoint = self.transport.make_receiver(role);

        let config = if catalog.is_topic(key) {
            EndpointConfig::fan_in(catalog.connection_strings(key)?)
        } else {
            EndpointConfig::single(catalog.connection_string(key)?)
        };
        endpoint.connect_for_receives(&config)?;

        if catalog.is_topic(key) {
            subscriber_of(endpoint.as_ref())?.subscribe(key)?;
        } else if catalog.is_pubsub_connection(key) {
            let subscriber = subscriber_of(endpoint.as_ref())?;
            for topic in catalog.topics_of(key) {
                subscriber.subscribe(topic)?;
            }
        }

        receivers.insert(key.to_string(), Arc::clone(&endpoint));
        Ok(endpoint)
    }

    /// Returns the send endpoint for `name`, creating and connecting it
    /// on first use. Channels advertising topics get a `Publisher`, the
    /// rest a `Sender`.
    pub fn sender(&self, name: &str, catalog: &Catalog) -> Result<Arc<dyn SendEndpoint>, BusError> {
        let mut senders = self.senders.lock();
        if let Some(endpoint) = senders.get(name) {
            return Ok(Arc::clone(endpoint));
        }

        let role = if catalog.is_pubsub_connection(name) {
            SendRole::Publisher
        } else {
            SendRole::Sender
        };
        tracing::debug!(channel = %name, ?role, "creating send endpoint");
        let endpoint = self.transport.make_sender(role);
        endpoint.connect_for_sends(&EndpointConfig::single(catalog.connection_string(name)?))?;

        senders.insert(name.to_string(), Arc::clone(&endpoint));
        Ok(endpoint)
    }

    /// The send lock for `name`, created on first access. The returned
    /// `Arc` is the stable identity all senders on the channel lock.
    pub fn send_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.send_locks
            .lock()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    pub fn is_open(&self, key: &str, direction: Direction) -> bool {
        match direction {
            Direction::Send => self.senders.lock().contains_key(key),
            Direction::Receive => self.receivers.lock().contains_key(key),
        }
    }

    /// Drops every endpoint and send lock.
    pub fn clear(&self) {
        self.senders.lock().clear();
        self.receivers.lock().clear();
        self.send_locks.lock().clear();
    }
}

fn subscriber_of(
    endpoint: &dyn ReceiveEndpoint,
) -> Result<&dyn SubscribeEndpoint, TransportError> {
    endpoint
        .as_subscriber()
        .ok_or(TransportError::SubscriptionsUnsupported)
}
