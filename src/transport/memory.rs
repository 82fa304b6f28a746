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

//! In-process transport implementation.
//!
//! `MemoryTransport` serves `inproc://` addresses from a process-global
//! hub. Point-to-point addresses are buffered MPMC queues: a message
//! sent before any receiver attaches waits in the queue. Published
//! messages are delivered to every live subscription of the publisher's
//! address whose filter set contains the message topic, and are dropped
//! when nothing matches; a subscription attached after a publish does
//! not see it.
//!
//! This is the transport behind
//! [`MessageBus::global`](crate::MessageBus::global) and the one the
//! test suite runs on.

use crate::transport::{
    EndpointConfig, ReceiveEndpoint, ReceiveRole, Response, SendEndpoint, SendRole,
    SubscribeEndpoint, Transport, TransportError,
};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Address scheme served by this transport.
const SCHEME: &str = "inproc://";

/// Process-global hub shared by every `MemoryTransport` endpoint.
static HUB: OnceLock<Hub> = OnceLock::new();

fn hub() -> &'static Hub {
    HUB.get_or_init(Hub::default)
}

fn check_address(address: &str) -> Result<(), TransportError> {
    if address.starts_with(SCHEME) {
        Ok(())
    } else {
        Err(TransportError::ConnectionFailed {
            address: address.to_string(),
            reason: format!("memory transport only serves {SCHEME} addresses"),
        })
    }
}

fn single_address(config: &EndpointConfig) -> Result<String, TransportError> {
    match config.addresses().as_slice() {
        [address] => {
            check_address(address)?;
            Ok((*address).to_string())
        }
        other => Err(TransportError::InvalidConfiguration {
            reason: format!("expected exactly one connection string, got {}", other.len()),
        }),
    }
}

/// One point-to-point queue. The hub keeps both halves alive so the
/// queue buffers across endpoint lifetimes.
struct PointToPointQueue {
    tx: Sender<Response>,
    rx: Receiver<Response>,
}

/// One live subscription: a delivery queue plus its topic filter set.
struct Subscription {
    filters: Mutex<HashSet<String>>,
    tx: Sender<Response>,
}

#[derive(Default)]
struct Hub {
    queues: Mutex<HashMap<String, PointToPointQueue>>,
    subscriptions: Mutex<HashMap<String, Vec<Arc<Subscription>>>>,
}

impl Hub {
    fn queue(&self, address: &str) -> (Sender<Response>, Receiver<Response>) {
        let mut queues = self.queues.lock();
        let queue = queues.entry(address.to_string()).or_insert_with(|| {
            let (tx, rx) = unbounded();
            PointToPointQueue { tx, rx }
        });
        (queue.tx.clone(), queue.rx.clone())
    }

    fn attach(&self, address: &str, subscription: Arc<Subscription>) {
        self.subscriptions
            .lock()
            .entry(address.to_string())
            .or_default()
            .push(subscription);
    }

    fn publish(&self, address: &str, topic: &str, data: &[u8]) {
        let mut subscriptions = self.subscriptions.lock();
        let Some(entry) = subscriptions.get_mut(address) else {
            return;
        };
        // Deliver to matching subscriptions; prune the ones whose
        // receiver side is gone.
        entry.retain(|subscription| {
            if !subscription.filters.lock().contains(topic) {
                return true;
            }
            let response = Response {
                data: data.to_vec(),
                metadata: topic.to_string(),
            };
            subscription.tx.send(response).is_ok()
        });
    }
}

/// In-process transport factory.
///
/// # Examples
///
/// ```rust
/// use msgbus::{MemoryTransport, MessageBus};
/// use std::sync::Arc;
///
/// let bus = MessageBus::new(Arc::new(MemoryTransport::new()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport;

impl MemoryTransport {
    /// Creates the transport factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Transport for MemoryTransport {
    fn make_sender(&self, role: SendRole) -> Arc<dyn SendEndpoint> {
        match role {
            SendRole::Sender => Arc::new(MemorySender::default()),
            SendRole::Publisher => Arc::new(MemoryPublisher::default()),
        }
    }

    fn make_receiver(&self, role: ReceiveRole) -> Arc<dyn ReceiveEndpoint> {
        match role {
            ReceiveRole::Receiver => Arc::new(MemoryReceiver::default()),
            ReceiveRole::Subscriber => Arc::new(MemorySubscriber::default()),
        }
    }
}

/// Point-to-point sender.
#[derive(Default)]
struct MemorySender {
    tx: Mutex<Option<Sender<Response>>>,
}

impl SendEndpoint for MemorySender {
    fn connect_for_sends(&self, config: &EndpointConfig) -> Result<(), TransportError> {
        let address = single_address(config)?;
        let (tx, _rx) = hub().queue(&address);
        *self.tx.lock() = Some(tx);
        Ok(())
    }

    fn send(&self, data: &[u8], _timeout: Duration, _topic: &str) -> Result<(), TransportError> {
        let tx = self.tx.lock().clone().ok_or(TransportError::NotConnected)?;
        let response = Response {
            data: data.to_vec(),
            metadata: String::new(),
        };
        // The hub keeps the receive half alive, so the queue cannot be
        // disconnected while the process runs.
        tx.send(response).map_err(|_| TransportError::NotConnected)
    }
}

/// Publishing sender.
#[derive(Default)]
struct MemoryPublisher {
    address: Mutex<Option<String>>,
}

impl SendEndpoint for MemoryPublisher {
    fn connect_for_sends(&self, config: &EndpointConfig) -> Result<(), TransportError> {
        let address = single_address(config)?;
        *self.address.lock() = Some(address);
        Ok(())
    }

    fn send(&self, data: &[u8], _timeout: Duration, topic: &str) -> Result<(), TransportError> {
        let address = self
            .address
            .lock()
            .clone()
            .ok_or(TransportError::NotConnected)?;
        hub().publish(&address, topic, data);
        Ok(())
    }
}

/// Point-to-point receiver.
#[derive(Default)]
struct MemoryReceiver {
    rx: Mutex<Option<Receiver<Response>>>,
}

impl ReceiveEndpoint for MemoryReceiver {
    fn connect_for_receives(&self, config: &EndpointConfig) -> Result<(), TransportError> {
        let address = single_address(config)?;
        let (_tx, rx) = hub().queue(&address);
        *self.rx.lock() = Some(rx);
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<Response, TransportError> {
        let rx = self.rx.lock().clone().ok_or(TransportError::NotConnected)?;
        recv_with_timeout(&rx, timeout)
    }
}

struct SubscriberInner {
    subscription: Arc<Subscription>,
    rx: Receiver<Response>,
}

/// Fan-in subscriber: one delivery queue attached to every configured
/// address, with a shared topic filter set.
#[derive(Default)]
struct MemorySubscriber {
    inner: Mutex<Option<SubscriberInner>>,
}

impl ReceiveEndpoint for MemorySubscriber {
    fn connect_for_receives(&self, config: &EndpointConfig) -> Result<(), TransportError> {
        let addresses = config.addresses();
        if addresses.is_empty() {
            return Err(TransportError::InvalidConfiguration {
                reason: "subscriber requires at least one connection string".to_string(),
            });
        }
        for address in &addresses {
            check_address(address)?;
        }
        let (tx, rx) = unbounded();
        let subscription = Arc::new(Subscription {
            filters: Mutex::new(HashSet::new()),
            tx,
        });
        for address in addresses {
            hub().attach(address, Arc::clone(&subscription));
        }
        *self.inner.lock() = Some(SubscriberInner { subscription, rx });
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<Response, TransportError> {
        let rx = {
            let inner = self.inner.lock();
            inner
                .as_ref()
                .map(|inner| inner.rx.clone())
                .ok_or(TransportError::NotConnected)?
        };
        recv_with_timeout(&rx, timeout)
    }

    fn as_subscriber(&self) -> Option<&dyn SubscribeEndpoint> {
        Some(self)
    }
}

impl SubscribeEndpoint for MemorySubscriber {
    fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        let inner = self.inner.lock();
        let inner = inner.as_ref().ok_or(TransportError::NotConnected)?;
        inner.subscription.filters.lock().insert(topic.to_string());
        Ok(())
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        let inner = self.inner.lock();
        let inner = inner.as_ref().ok_or(TransportError::NotConnected)?;
        inner.subscription.filters.lock().remove(topic);
        Ok(())
    }
}

fn recv_with_timeout(
    rx: &Receiver<Response>,
    timeout: Duration,
) -> Result<Response, TransportError> {
    match rx.recv_timeout(timeout) {
        Ok(response) => Ok(response),
        Err(RecvTimeoutError::Timeout) => Err(TransportError::ReceiveTimeout { timeout }),
        Err(RecvTimeoutError::Disconnected) => Err(TransportError::NotConnected),
    }
}
