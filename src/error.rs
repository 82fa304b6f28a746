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

//! Facade-level error types.
//!
//! [`BusError`] is the error surface of every
//! [`MessageBus`](crate::MessageBus) operation. Semantically invalid
//! calls get their own variants; transport failures other than the
//! internally handled receive timeout are wrapped unchanged in
//! [`BusError::Transport`].

use crate::transport::TransportError;
use thiserror::Error;

/// Errors surfaced by the messaging facade.
///
/// # Examples
///
/// ```rust
/// use msgbus::BusError;
///
/// let error = BusError::ConnectionNotFound {
///     name: "tpc".to_string(),
/// };
/// assert!(error.is_not_found());
/// assert!(error.to_string().contains("tpc"));
/// ```
#[derive(Debug, Error)]
pub enum BusError {
    /// The named channel is not in the catalog.
    #[error("no channel named \"{name}\" is configured")]
    ConnectionNotFound {
        /// The unknown channel name (or key).
        name: String,
    },

    /// The named topic is not advertised by any configured channel.
    #[error("no topic named \"{topic}\" is configured")]
    TopicNotFound {
        /// The unknown topic name.
        topic: String,
    },

    /// A configuration record reuses a string already taken as a channel
    /// name or topic name.
    #[error("name \"{name}\" collides with an existing channel or topic")]
    NameCollision {
        /// The colliding name.
        name: String,
    },

    /// `configure` was called on a bus that is already configured.
    #[error("the message bus has already been configured")]
    AlreadyConfigured,

    /// A listener or subscriber is already active for this key.
    #[error("a listener is already registered for \"{key}\"")]
    ListenerAlreadyRegistered {
        /// The channel or topic the listener is keyed on.
        key: String,
    },

    /// No listener or subscriber is active for this key.
    #[error("no listener is registered for \"{key}\"")]
    ListenerNotRegistered {
        /// The channel or topic the operation was keyed on.
        key: String,
    },

    /// Catch-all for semantically invalid calls.
    #[error("{reason}")]
    OperationFailed {
        /// What went wrong.
        reason: String,
    },

    /// A transport failure, surfaced unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl BusError {
    /// Returns `true` for the unknown-key variants.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ConnectionNotFound { .. } | Self::TopicNotFound { .. }
        )
    }

    /// Returns `true` if this error is a transport receive timeout.
    ///
    /// Receive timeouts are the expected outcome of polling an idle
    /// channel via
    /// [`MessageBus::receive_from`](crate::MessageBus::receive_from).
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    pub(crate) fn connection_not_found(name: impl Into<String>) -> Self {
        Self::ConnectionNotFound { name: name.into() }
    }

    pub(crate) fn topic_not_found(topic: impl Into<String>) -> Self {
        Self::TopicNotFound {
            topic: topic.into(),
        }
    }

    pub(crate) fn operation_failed(reason: impl Into<String>) -> Self {
        Self::OperationFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_not_found_predicates() {
        assert!(BusError::connection_not_found("x").is_not_found());
        assert!(BusError::topic_not_found("t").is_not_found());
        assert!(!BusError::AlreadyConfigured.is_not_found());
    }

    #[test]
    fn test_timeout_predicate_follows_transport_layer() {
        let timeout: BusError = TransportError::ReceiveTimeout {
            timeout: Duration::from_millis(10),
        }
        .into();
        assert!(timeout.is_timeout());

        let other: BusError = TransportError::NotConnected.into();
        assert!(!other.is_timeout());
    }

    #[test]
    fn test_display_identifies_the_offender() {
        let error = BusError::NameCollision {
            name: "raw".to_string(),
        };
        assert!(error.to_string().contains("raw"));

        let error = BusError::ListenerAlreadyRegistered {
            key: "tpc".to_string(),
        };
        assert!(error.to_string().contains("tpc"));
    }
}
