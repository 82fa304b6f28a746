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

//! The transport plugin contract consumed by the facade.
//!
//! A transport is a factory for *endpoints*: senders and receivers in
//! one of four roles. The facade decides the role from the channel
//! catalog (point-to-point channels use `Sender`/`Receiver`, pub/sub
//! channels and topics use `Publisher`/`Subscriber`) and drives the
//! endpoint through the traits defined here. Endpoints are shared,
//! reference-counted values: the facade's registry holds the primary
//! handle and callers borrow one for the duration of a single operation.
//!
//! The crate ships one implementation, [`MemoryTransport`], which serves
//! `inproc://` addresses inside the current process.

mod error;
mod memory;

pub use error::TransportError;
pub use memory::MemoryTransport;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Timeout value meaning "do not block at all".
pub const NO_BLOCK: Duration = Duration::ZERO;

/// Roles a send-side endpoint can be created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendRole {
    /// Point-to-point sender; the `topic` argument of `send` is ignored.
    Sender,
    /// Publishing sender; messages are delivered to matching subscribers.
    Publisher,
}

/// Roles a receive-side endpoint can be created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiveRole {
    /// Point-to-point receiver.
    Receiver,
    /// Subscribing receiver; carries the [`SubscribeEndpoint`] capability.
    Subscriber,
}

/// Connection configuration handed to an endpoint.
///
/// Point-to-point endpoints connect to a single `connection_string`;
/// fan-in subscribers connect to every entry of `connection_strings`.
/// The shape is serde-able so embedding processes can carry it inside
/// their own configuration documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Single address to connect to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    /// Addresses to connect to for fan-in receives.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connection_strings: Vec<String>,
}

impl EndpointConfig {
    /// Configuration for a single address.
    pub fn single(address: impl Into<String>) -> Self {
        Self {
            connection_string: Some(address.into()),
            connection_strings: Vec::new(),
        }
    }

    /// Configuration fanning in from several addresses.
    pub fn fan_in(addresses: Vec<String>) -> Self {
        Self {
            connection_string: None,
            connection_strings: addresses,
        }
    }

    /// All addresses named by this configuration, in order.
    #[must_use]
    pub fn addresses(&self) -> Vec<&str> {
        match &self.connection_string {
            Some(single) => vec![single.as_str()],
            None => self.connection_strings.iter().map(String::as_str).collect(),
        }
    }
}

/// The value produced by a receive: an opaque payload plus the metadata
/// the transport delivered with it (the topic for pub/sub messages, an
/// empty string for point-to-point ones).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// The message payload, byte-for-byte as sent.
    pub data: Vec<u8>,
    /// The delivered topic, or `""` for point-to-point messages.
    pub metadata: String,
}

/// Send side of a transport endpoint.
pub trait SendEndpoint: Send + Sync {
    /// Connects the endpoint for sending.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address cannot be reached or
    /// the configuration is invalid for this endpoint.
    fn connect_for_sends(&self, config: &EndpointConfig) -> Result<(), TransportError>;

    /// Sends one message.
    ///
    /// `topic` is honored by publishers and ignored by point-to-point
    /// senders.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not connected or the message
    /// could not be handed to the transport within `timeout`.
    fn send(&self, data: &[u8], timeout: Duration, topic: &str) -> Result<(), TransportError>;
}

/// Receive side of a transport endpoint.
pub trait ReceiveEndpoint: Send + Sync {
    /// Connects the endpoint for receiving.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured address cannot be reached or
    /// the configuration is invalid for this endpoint.
    fn connect_for_receives(&self, config: &EndpointConfig) -> Result<(), TransportError>;

    /// Receives one message, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ReceiveTimeout`] if no message arrived
    /// in time; other errors indicate the endpoint is unusable.
    fn receive(&self, timeout: Duration) -> Result<Response, TransportError>;

    /// The subscriber capability of this endpoint, if it was created in
    /// [`ReceiveRole::Subscriber`].
    fn as_subscriber(&self) -> Option<&dyn SubscribeEndpoint> {
        None
    }
}

/// Subscriber capability: topic filter management on top of
/// [`ReceiveEndpoint`].
pub trait SubscribeEndpoint: ReceiveEndpoint {
    /// Adds `topic` to the endpoint's filter set.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not connected.
    fn subscribe(&self, topic: &str) -> Result<(), TransportError>;

    /// Removes `topic` from the endpoint's filter set.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not connected.
    fn unsubscribe(&self, topic: &str) -> Result<(), TransportError>;
}

/// Factory for transport endpoints.
///
/// The facade owns one `Transport` and asks it for endpoints as channels
/// are first used. Implementations decide what an address means; the
/// in-crate [`MemoryTransport`] serves `inproc://` addresses.
pub trait Transport: Send + Sync + 'static {
    /// Creates an unconnected send endpoint in the given role.
    fn make_sender(&self, role: SendRole) -> Arc<dyn SendEndpoint>;

    /// Creates an unconnected receive endpoint in the given role.
    ///
    /// Endpoints created in [`ReceiveRole::Subscriber`] must return
    /// `Some` from [`ReceiveEndpoint::as_subscriber`].
    fn make_receiver(&self, role: ReceiveRole) -> Arc<dyn ReceiveEndpoint>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_address() {
        let config = EndpointConfig::single("inproc://a");
        assert_eq!(config.addresses(), vec!["inproc://a"]);
    }

    #[test]
    fn test_fan_in_addresses_keep_order() {
        let config = EndpointConfig::fan_in(vec!["inproc://a".into(), "inproc://b".into()]);
        assert_eq!(config.addresses(), vec!["inproc://a", "inproc://b"]);
    }

    #[test]
    fn test_empty_config_has_no_addresses() {
        assert!(EndpointConfig::default().addresses().is_empty());
    }
}
