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

//! The background worker behind callback-driven receive.
//!
//! One `Listener` owns at most one worker thread, keyed on a channel or
//! topic name. The worker drains messages with a non-blocking receive
//! and hands each one to the installed callback; receive timeouts are
//! normal and put the worker to sleep for one back-off interval, so a
//! stop request is observed within a bounded time. The callback mutex
//! is held across dispatch, making [`Listener::set_callback`] atomic
//! with respect to a running invocation.

use crate::bus::Shared;
use crate::error::BusError;
use crate::transport::{Response, NO_BLOCK};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A user callback invoked with each received message.
pub(crate) type ResponseCallback = Box<dyn FnMut(Response) + Send>;

/// Sleep between polls once a non-blocking receive comes back empty.
const RECEIVE_BACKOFF: Duration = Duration::from_millis(10);

pub(crate) struct Listener {
    shared: Arc<Shared>,
    key: Mutex<Option<String>>,
    callback: Arc<Mutex<Option<ResponseCallback>>>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Listener {
    pub fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            key: Mutex::new(None),
            callback: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Starts the worker for `key`. Starting an already running
    /// listener on the same key is a soft warning; on a different key
    /// it fails.
    pub fn start(&self, key: &str) -> Result<(), BusError> {
        if self.is_listening() {
            let current = self.key.lock().clone().unwrap_or_default();
            if current == key {
                tracing::warn!(key = %key, "listener is already running, ignoring start");
                return Ok(());
            }
            return Err(BusError::operation_failed(format!(
                "listener is running for \"{current}\", cannot start it for \"{key}\""
            )));
        }

        *self.key.lock() = Some(key.to_string());
        self.running.store(true, Ordering::SeqCst);

        let spawn_result = thread::Builder::new()
            .name(format!("msgbus-listen-{key}"))
            .spawn({
                let shared = Arc::clone(&self.shared);
                let callback = Arc::clone(&self.callback);
                let running = Arc::clone(&self.running);
                let key = key.to_string();
                move || worker_loop(&shared, &key, &callback, &running)
            });
        match spawn_result {
            Ok(handle) => {
                *self.worker.lock() = Some(handle);
                Ok(())
            }
            Err(error) => {
                self.running.store(false, Ordering::SeqCst);
                Err(BusError::operation_failed(format!(
                    "failed to spawn listener thread for \"{key}\": {error}"
                )))
            }
        }
    }

    /// Installs, replaces, or (with `None`) disarms the callback. Safe
    /// to call while the worker runs; a disarmed worker keeps draining.
    pub fn set_callback(&self, callback: Option<ResponseCallback>) {
        *self.callback.lock() = callback;
    }

    /// Requests stop, joins the worker, and clears the callback.
    /// Idempotent; stopping an idle listener is a soft warning.
    pub fn stop(&self) {
        if !self.is_listening() {
            let key = self.key.lock().clone().unwrap_or_default();
            tracing::warn!(key = %key, "listener is not running, ignoring stop");
            return;
        }
        self.shutdown();
    }

    /// The silent stop used by `reset` and `Drop`.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
        *self.callback.lock() = None;
    }

    pub fn is_listening(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    shared: &Arc<Shared>,
    key: &str,
    callback: &Mutex<Option<ResponseCallback>>,
    running: &AtomicBool,
) {
    tracing::debug!(key = %key, "listener worker started");
    while running.load(Ordering::Acquire) {
        match shared.receive_from(key, NO_BLOCK) {
            Ok(response) => {
                let mut callback = callback.lock();
                if let Some(callback) = callback.as_mut() {
                    callback(response);
                }
            }
            Err(error) if error.is_timeout() => {
                thread::sleep(RECEIVE_BACKOFF);
            }
            Err(error) => {
                // Transport failures other than timeouts are reported
                // and treated as transient; the worker keeps going.
                tracing::error!(key = %key, %error, "receive failed in listener worker");
                thread::sleep(RECEIVE_BACKOFF);
            }
        }
    }
    tracing::debug!(key = %key, "listener worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelRecord;
    use crate::transport::MemoryTransport;
    use crate::MessageBus;
    use std::time::Instant;

    /// The bus is returned alongside its shared state so the catalog
    /// stays configured for the listener under test.
    fn bus_with_channel(name: &str, address: &str) -> (MessageBus, Arc<Shared>) {
        let bus = MessageBus::new(Arc::new(MemoryTransport::new()));
        bus.configure(&[ChannelRecord::new(name, address)]).unwrap();
        let shared = Arc::clone(bus.shared());
        (bus, shared)
    }

    #[test]
    fn test_start_twice_on_same_key_is_soft() {
        let (_bus, shared) = bus_with_channel("a", "inproc://lst-same");
        let listener = Listener::new(shared);
        listener.start("a").unwrap();
        assert!(listener.is_listening());
        listener.start("a").unwrap();
        listener.stop();
        assert!(!listener.is_listening());
    }

    #[test]
    fn test_start_on_different_key_fails() {
        let (_bus, shared) = bus_with_channel("a", "inproc://lst-diff");
        let listener = Listener::new(shared);
        listener.start("a").unwrap();
        let error = listener.start("b").unwrap_err();
        assert!(matches!(error, BusError::OperationFailed { .. }));
        listener.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (_bus, shared) = bus_with_channel("a", "inproc://lst-stop");
        let listener = Listener::new(shared);
        listener.start("a").unwrap();
        listener.stop();
        listener.stop();
        assert!(!listener.is_listening());
    }

    #[test]
    fn test_stop_latency_is_bounded() {
        let (_bus, shared) = bus_with_channel("a", "inproc://lst-latency");
        let listener = Listener::new(shared);
        listener.start("a").unwrap();
        let start = Instant::now();
        listener.stop();
        // One back-off plus one non-blocking receive, with headroom.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_callback_swap_while_running() {
        let (_bus, shared) = bus_with_channel("a", "inproc://lst-swap");
        let listener = Listener::new(shared);
        listener.start("a").unwrap();
        listener.set_callback(Some(Box::new(|_| {})));
        listener.set_callback(None);
        listener.stop();
    }
}
