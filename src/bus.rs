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

//! The messaging facade.
//!
//! [`MessageBus`] is the single entry point applications use: it owns
//! the channel catalog, the endpoint registry, the listener table, and
//! the per-channel counters. Lock order throughout is registration
//! mutex, then an endpoint map mutex, then a per-channel send lock;
//! listener workers stay off the registration mutex entirely and the
//! per-listener callback mutex is innermost.

use crate::catalog::Catalog;
use crate::config::ChannelRecord;
use crate::error::BusError;
use crate::listener::{Listener, ResponseCallback};
use crate::metrics::{BusMetrics, CounterSample};
use crate::registry::EndpointRegistry;
use crate::transport::{MemoryTransport, Response, Transport};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Which side of a channel an endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The sending side.
    Send,
    /// The receiving side.
    Receive,
}

/// State shared with listener workers: everything the receive path
/// touches, and nothing the registration mutex guards.
pub(crate) struct Shared {
    catalog: RwLock<Catalog>,
    registry: EndpointRegistry,
    metrics: BusMetrics,
}

impl Shared {
    /// The direct receive path: resolve the key, get or create the
    /// receive endpoint, receive, account. No lock is held across the
    /// transport receive.
    pub(crate) fn receive_from(&self, key: &str, timeout: Duration) -> Result<Response, BusError> {
        let receiver = {
            let catalog = self.catalog.read();
            if !catalog.has_key(key) {
                return Err(BusError::connection_not_found(key));
            }
            self.registry.receiver(key, &catalog)?
        };
        let response = receiver.receive(timeout)?;
        self.metrics.record_received(key, response.data.len());
        Ok(response)
    }
}

/// The process-wide messaging facade.
///
/// A `MessageBus` starts *empty*; [`configure`](Self::configure) loads
/// the channel catalog and every other operation becomes legal until
/// [`reset`](Self::reset) empties it again. The bus is meant to be
/// created once by the composition root and handed around by reference;
/// it is neither `Clone` nor copyable. Legacy callers that expect a
/// process-wide instance can use [`MessageBus::global`].
///
/// # Examples
///
/// ```rust
/// use msgbus::{ChannelRecord, MemoryTransport, MessageBus};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), msgbus::BusError> {
/// let bus = MessageBus::new(Arc::new(MemoryTransport::new()));
/// bus.configure(&[ChannelRecord::new("data", "inproc://doc-data")])?;
///
/// bus.send_to("data", b"payload", Duration::from_millis(100), "")?;
/// let response = bus.receive_from("data", Duration::from_millis(100))?;
/// assert_eq!(response.data, b"payload");
/// # Ok(())
/// # }
/// ```
pub struct MessageBus {
    shared: Arc<Shared>,
    /// The listener table behind the registration mutex.
    listeners: Mutex<HashMap<String, Listener>>,
}

impl MessageBus {
    /// Creates an empty bus on top of the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            shared: Arc::new(Shared {
                catalog: RwLock::new(Catalog::default()),
                registry: EndpointRegistry::new(transport),
                metrics: BusMetrics::default(),
            }),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// The lazily created process-wide instance, backed by the
    /// in-process transport.
    ///
    /// New code should own a [`MessageBus`] explicitly and inject it;
    /// this accessor exists for callers written against a singleton.
    pub fn global() -> &'static MessageBus {
        static GLOBAL: OnceLock<MessageBus> = OnceLock::new();
        GLOBAL.get_or_init(|| MessageBus::new(Arc::new(MemoryTransport::new())))
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// Loads the channel catalog from an ordered record list.
    ///
    /// The whole list is validated first and installed atomically: on a
    /// name collision nothing changes and the bus stays empty.
    ///
    /// # Errors
    ///
    /// [`BusError::AlreadyConfigured`] if the bus is configured;
    /// [`BusError::NameCollision`] if the records violate the
    /// channel/topic name disjointness; [`BusError::OperationFailed`]
    /// for an empty channel name.
    pub fn configure(&self, records: &[ChannelRecord]) -> Result<(), BusError> {
        if !self.shared.catalog.read().is_empty() {
            return Err(BusError::AlreadyConfigured);
        }
        let candidate = Catalog::from_records(records)?;
        let mut catalog = self.shared.catalog.write();
        // Re-check under the write lock; two racing configures must not
        // both install.
        if !catalog.is_empty() {
            return Err(BusError::AlreadyConfigured);
        }
        *catalog = candidate;
        tracing::debug!(channels = records.len(), "message bus configured");
        Ok(())
    }

    /// Returns the bus to the empty state: stops every listener, drops
    /// every endpoint, clears the catalog, the send locks, and the
    /// counters. [`configure`](Self::configure) may be called again
    /// afterwards.
    pub fn reset(&self) {
        let mut listeners = self.listeners.lock();
        for listener in listeners.values() {
            listener.shutdown();
        }
        listeners.clear();
        self.shared.registry.clear();
        *self.shared.catalog.write() = Catalog::default();
        self.shared.metrics.clear();
        tracing::debug!("message bus reset");
    }

    /// Sends one message on the named channel.
    ///
    /// Sends on one channel are serialized by the per-channel lock, so
    /// concurrent senders interleave at whole-message granularity. A
    /// non-empty `topic` the channel does not advertise is logged as a
    /// warning and the message is still sent; the transport decides
    /// what to do with it.
    ///
    /// # Errors
    ///
    /// [`BusError::ConnectionNotFound`] for an unknown channel name;
    /// transport errors propagate unchanged.
    pub fn send_to(
        &self,
        name: &str,
        data: &[u8],
        timeout: Duration,
        topic: &str,
    ) -> Result<(), BusError> {
        let send_lock = self.shared.registry.send_lock(name);
        let _serialized = send_lock.lock();

        let sender = {
            let catalog = self.shared.catalog.read();
            let record = catalog
                .record(name)
                .ok_or_else(|| BusError::connection_not_found(name))?;
            if !topic.is_empty() && !record.topics.iter().any(|t| t == topic) {
                tracing::warn!(
                    channel = %name,
                    topic = %topic,
                    "channel does not advertise this topic, sending anyway"
                );
            }
            self.shared.registry.sender(name, &catalog)?
        };
        sender.send(data, timeout, topic)?;
        self.shared.metrics.record_sent(name, data.len());
        Ok(())
    }

    /// Receives one message from a channel or topic, waiting at most
    /// `timeout`. The receive endpoint is created on first use.
    ///
    /// # Errors
    ///
    /// [`BusError::ConnectionNotFound`] if `key` is neither a channel
    /// nor a topic; a transport receive timeout (see
    /// [`BusError::is_timeout`]) if no message arrived in time.
    pub fn receive_from(&self, key: &str, timeout: Duration) -> Result<Response, BusError> {
        self.shared.receive_from(key, timeout)
    }

    /// Starts the background listener for a point-to-point channel.
    /// Install the callback with
    /// [`register_callback`](Self::register_callback).
    ///
    /// # Errors
    ///
    /// [`BusError::ConnectionNotFound`] for an unknown channel;
    /// [`BusError::ListenerAlreadyRegistered`] if the channel already
    /// has an active listener.
    pub fn start_listening(&self, name: &str) -> Result<(), BusError> {
        tracing::debug!(channel = %name, "start listening");
        let mut listeners = self.listeners.lock();
        if !self.shared.catalog.read().is_connection(name) {
            return Err(BusError::connection_not_found(name));
        }
        if is_listening_locked(&listeners, name) {
            return Err(BusError::ListenerAlreadyRegistered {
                key: name.to_string(),
            });
        }
        listeners
            .entry(name.to_string())
            .or_insert_with(|| Listener::new(Arc::clone(&self.shared)))
            .start(name)
    }

    /// Stops the listener for a point-to-point channel and clears its
    /// callback.
    ///
    /// # Errors
    ///
    /// [`BusError::ListenerNotRegistered`] if no listener is active for
    /// `name`.
    pub fn stop_listening(&self, name: &str) -> Result<(), BusError> {
        tracing::debug!(channel = %name, "stop listening");
        let listeners = self.listeners.lock();
        match listeners.get(name) {
            Some(listener) if listener.is_listening() => {
                listener.stop();
                Ok(())
            }
            _ => Err(BusError::ListenerNotRegistered {
                key: name.to_string(),
            }),
        }
    }

    /// Installs the callback invoked by the listener worker for `key`
    /// (a channel or topic with an active listener). Replaces any
    /// previous callback atomically with respect to dispatch.
    ///
    /// # Errors
    ///
    /// [`BusError::ConnectionNotFound`] for an unknown key;
    /// [`BusError::ListenerNotRegistered`] if no listener is active.
    pub fn register_callback<F>(&self, key: &str, callback: F) -> Result<(), BusError>
    where
        F: FnMut(Response) + Send + 'static,
    {
        self.install_callback(key, Some(Box::new(callback)))
    }

    /// Disarms the callback for `key`; the listener keeps draining
    /// messages without dispatching them.
    ///
    /// # Errors
    ///
    /// Same conditions as [`register_callback`](Self::register_callback).
    pub fn clear_callback(&self, key: &str) -> Result<(), BusError> {
        self.install_callback(key, None)
    }

    fn install_callback(
        &self,
        key: &str,
        callback: Option<ResponseCallback>,
    ) -> Result<(), BusError> {
        tracing::debug!(key = %key, armed = callback.is_some(), "installing callback");
        let listeners = self.listeners.lock();
        if !self.shared.catalog.read().has_key(key) {
            return Err(BusError::connection_not_found(key));
        }
        match listeners.get(key) {
            Some(listener) if listener.is_listening() => {
                listener.set_callback(callback);
                Ok(())
            }
            _ => Err(BusError::ListenerNotRegistered {
                key: key.to_string(),
            }),
        }
    }

    /// Starts the background listener for a topic, fanning in from
    /// every channel that publishes it.
    ///
    /// # Errors
    ///
    /// [`BusError::TopicNotFound`] for an unknown topic;
    /// [`BusError::ListenerAlreadyRegistered`] if the topic already has
    /// an active listener.
    pub fn subscribe(&self, topic: &str) -> Result<(), BusError> {
        tracing::debug!(topic = %topic, "subscribing");
        let mut listeners = self.listeners.lock();
        if !self.shared.catalog.read().is_topic(topic) {
            return Err(BusError::topic_not_found(topic));
        }
        if is_listening_locked(&listeners, topic) {
            return Err(BusError::ListenerAlreadyRegistered {
                key: topic.to_string(),
            });
        }
        listeners
            .entry(topic.to_string())
            .or_insert_with(|| Listener::new(Arc::clone(&self.shared)))
            .start(topic)
    }

    /// Stops the listener for a topic.
    ///
    /// # Errors
    ///
    /// [`BusError::ListenerNotRegistered`] if no listener is active for
    /// `topic`.
    pub fn unsubscribe(&self, topic: &str) -> Result<(), BusError> {
        tracing::debug!(topic = %topic, "unsubscribing");
        let listeners = self.listeners.lock();
        match listeners.get(topic) {
            Some(listener) if listener.is_listening() => {
                listener.stop();
                Ok(())
            }
            _ => Err(BusError::ListenerNotRegistered {
                key: topic.to_string(),
            }),
        }
    }

    /// Eagerly creates the publishing endpoint of a pub/sub channel, so
    /// subscribers connected before the first send miss nothing.
    ///
    /// # Errors
    ///
    /// [`BusError::ConnectionNotFound`] for an unknown channel;
    /// [`BusError::OperationFailed`] if the channel is point-to-point.
    pub fn start_publisher(&self, name: &str) -> Result<(), BusError> {
        let send_lock = self.shared.registry.send_lock(name);
        let _serialized = send_lock.lock();

        let catalog = self.shared.catalog.read();
        let record = catalog
            .record(name)
            .ok_or_else(|| BusError::connection_not_found(name))?;
        if record.topics.is_empty() {
            return Err(BusError::operation_failed(format!(
                "channel \"{name}\" is not pub/sub, cannot start its publisher early"
            )));
        }
        self.shared.registry.sender(name, &catalog)?;
        Ok(())
    }

    /// `true` iff `key` is a configured channel name.
    #[must_use]
    pub fn is_connection(&self, key: &str) -> bool {
        self.shared.catalog.read().is_connection(key)
    }

    /// `true` iff `key` is a topic advertised by some configured
    /// channel.
    #[must_use]
    pub fn is_topic(&self, key: &str) -> bool {
        self.shared.catalog.read().is_topic(key)
    }

    /// `true` iff `key` is a channel advertising at least one topic.
    #[must_use]
    pub fn is_pubsub_connection(&self, key: &str) -> bool {
        self.shared.catalog.read().is_pubsub_connection(key)
    }

    /// `true` iff an endpoint for `key` exists in the given direction.
    #[must_use]
    pub fn is_connection_open(&self, key: &str, direction: Direction) -> bool {
        self.shared.registry.is_open(key, direction)
    }

    /// `true` iff a listener is active for the channel or topic.
    #[must_use]
    pub fn is_listening(&self, key: &str) -> bool {
        let listeners = self.listeners.lock();
        is_listening_locked(&listeners, key)
    }

    /// The configured address of a channel.
    ///
    /// # Errors
    ///
    /// [`BusError::ConnectionNotFound`] for an unknown channel name.
    pub fn get_connection_string(&self, name: &str) -> Result<String, BusError> {
        self.shared.catalog.read().connection_string(name)
    }

    /// The addresses of every channel publishing `topic`, in
    /// configuration order.
    ///
    /// # Errors
    ///
    /// [`BusError::TopicNotFound`] for an unknown topic.
    pub fn get_connection_strings(&self, topic: &str) -> Result<Vec<String>, BusError> {
        self.shared.catalog.read().connection_strings(topic)
    }

    /// Samples and zeroes the per-channel traffic counters.
    ///
    /// Each call reports the traffic since the previous one, keyed by
    /// channel (sends and point-to-point receives) or topic (topic
    /// receives).
    #[must_use]
    pub fn sample_counters(&self) -> BTreeMap<String, CounterSample> {
        self.shared.metrics.sample()
    }
}

impl Drop for MessageBus {
    fn drop(&mut self) {
        self.reset();
    }
}

fn is_listening_locked(listeners: &HashMap<String, Listener>, key: &str) -> bool {
    listeners
        .get(key)
        .map(Listener::is_listening)
        .unwrap_or(false)
}
