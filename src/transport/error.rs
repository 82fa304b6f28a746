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

//! Transport layer error types.
//!
//! Transport errors are the lowest layer of the crate's error hierarchy.
//! The receive timeout is a distinguished variant: it is the *expected*
//! outcome of a non-blocking receive on an idle channel, and listener
//! workers absorb it silently. Every other variant propagates unchanged
//! through the facade.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by transport endpoints.
///
/// # Examples
///
/// ```rust
/// use msgbus::TransportError;
/// use std::time::Duration;
///
/// let error = TransportError::ReceiveTimeout {
///     timeout: Duration::from_millis(10),
/// };
/// assert!(error.is_timeout());
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// No message arrived within the receive timeout.
    ///
    /// This is the normal outcome of polling an idle channel; callers
    /// driving a receive loop should treat it as "try again later".
    #[error("no message arrived within {timeout:?}")]
    ReceiveTimeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The message could not be handed to the transport within the send
    /// timeout.
    #[error("send did not complete within {timeout:?}")]
    SendTimeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The endpoint could not connect to the given address.
    #[error("failed to connect to {address}: {reason}")]
    ConnectionFailed {
        /// The address that failed to connect.
        address: String,
        /// Why the connection failed.
        reason: String,
    },

    /// An operation was attempted on an endpoint that has not been
    /// connected.
    #[error("endpoint is not connected")]
    NotConnected,

    /// The endpoint configuration was rejected by the transport.
    #[error("invalid endpoint configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error.
        reason: String,
    },

    /// A subscription operation was attempted on an endpoint that does
    /// not carry the subscriber capability.
    #[error("endpoint does not support subscriptions")]
    SubscriptionsUnsupported,
}

impl TransportError {
    /// Returns `true` if this error is a receive timeout.
    ///
    /// Receive timeouts are expected during polling and are handled
    /// internally by listener workers; all other transport errors are
    /// surfaced to the caller.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::ReceiveTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_timeout_is_timeout() {
        let error = TransportError::ReceiveTimeout {
            timeout: Duration::from_millis(10),
        };
        assert!(error.is_timeout());
    }

    #[test]
    fn test_other_errors_are_not_timeouts() {
        assert!(!TransportError::NotConnected.is_timeout());
        assert!(
            !TransportError::SendTimeout {
                timeout: Duration::ZERO,
            }
            .is_timeout()
        );
        assert!(!TransportError::SubscriptionsUnsupported.is_timeout());
    }

    #[test]
    fn test_display_names_the_address() {
        let error = TransportError::ConnectionFailed {
            address: "inproc://missing".to_string(),
            reason: "unknown scheme".to_string(),
        };
        assert!(error.to_string().contains("inproc://missing"));
    }
}
