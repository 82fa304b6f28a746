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

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # Architecture
//!
//! `msgbus` is organized in three layers, leaves first:
//!
//! - **[`transport`]**: the plugin contract consumed by the facade
//!   (sender/receiver/publisher/subscriber endpoints) and the in-process
//!   reference implementation
//! - **Endpoint registry** (internal): the lazy, at-most-one-per-key
//!   endpoint cache and the per-channel send locks
//! - **[`MessageBus`]**: the facade every application talks to —
//!   configure, send, receive, listen, subscribe
//!
//! The facade is an explicit service object meant to be owned by the
//! application's composition root; [`MessageBus::global`] is retained for
//! legacy callers that expect a process-wide instance.
//!
//! # Concurrency
//!
//! All operations may be called from any number of threads. Each
//! listening key owns one dedicated worker thread that drains messages
//! with a non-blocking receive and hands them to the registered callback.
//! Sends on one channel are serialized (per-channel FIFO); distinct
//! channels proceed in parallel. There is no async runtime anywhere in
//! the crate.

pub mod transport;

mod bus;
mod catalog;
mod config;
mod error;
mod listener;
mod metrics;
mod registry;

pub use bus::{Direction, MessageBus};
pub use config::ChannelRecord;
pub use error::BusError;
pub use metrics::CounterSample;
pub use transport::{
    EndpointConfig, MemoryTransport, ReceiveEndpoint, ReceiveRole, Response, SendEndpoint,
    SendRole, SubscribeEndpoint, Transport, TransportError,
};
