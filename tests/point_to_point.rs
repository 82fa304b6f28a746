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

//! Point-to-point channels: the direct and callback receive paths.

use msgbus::{BusError, ChannelRecord, MemoryTransport, MessageBus};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const SEND_TIMEOUT: Duration = Duration::from_millis(100);
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

fn bus_with_channel(name: &str, address: &str) -> MessageBus {
    let bus = MessageBus::new(Arc::new(MemoryTransport::new()));
    bus.configure(&[ChannelRecord::new(name, address)]).unwrap();
    bus
}

/// Polls `condition` until it holds or `deadline` elapses.
fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_direct_send_and_receive() {
    let bus = bus_with_channel("foo", "inproc://ptp-direct");
    bus.send_to("foo", b"hello", SEND_TIMEOUT, "").unwrap();

    let response = bus.receive_from("foo", RECV_TIMEOUT).unwrap();
    assert_eq!(response.data, b"hello");
    assert_eq!(response.metadata, "");
}

#[test]
fn test_receive_from_idle_channel_times_out() {
    let bus = bus_with_channel("foo", "inproc://ptp-idle");
    let error = bus.receive_from("foo", Duration::from_millis(10)).unwrap_err();
    assert!(error.is_timeout());
}

#[test]
fn test_callback_round_trip() {
    let bus = bus_with_channel("foo", "inproc://ptp-callback");
    bus.start_listening("foo").unwrap();

    let captured: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let captured = Arc::clone(&captured);
        bus.register_callback("foo", move |response| {
            captured.lock().push(response.data);
        })
        .unwrap();
    }

    bus.send_to("foo", b"hello", SEND_TIMEOUT, "").unwrap();

    assert!(wait_until(Duration::from_secs(5), || !captured
        .lock()
        .is_empty()));
    assert_eq!(captured.lock().as_slice(), [b"hello".to_vec()]);

    bus.stop_listening("foo").unwrap();
}

#[test]
fn test_second_listener_is_rejected() {
    let bus = bus_with_channel("foo", "inproc://ptp-second");
    bus.start_listening("foo").unwrap();
    assert!(matches!(
        bus.start_listening("foo").unwrap_err(),
        BusError::ListenerAlreadyRegistered { key } if key == "foo"
    ));
    bus.stop_listening("foo").unwrap();
}

#[test]
fn test_listener_restarts_after_stop() {
    let bus = bus_with_channel("foo", "inproc://ptp-restart");
    bus.start_listening("foo").unwrap();
    assert!(bus.is_listening("foo"));

    bus.stop_listening("foo").unwrap();
    assert!(!bus.is_listening("foo"));

    bus.start_listening("foo").unwrap();
    assert!(bus.is_listening("foo"));
    bus.stop_listening("foo").unwrap();
}

#[test]
fn test_clear_callback_disarms_dispatch() {
    let bus = bus_with_channel("foo", "inproc://ptp-disarm");
    bus.start_listening("foo").unwrap();

    let captured: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let captured = Arc::clone(&captured);
        bus.register_callback("foo", move |response| {
            captured.lock().push(response.data);
        })
        .unwrap();
    }

    bus.send_to("foo", b"first", SEND_TIMEOUT, "").unwrap();
    assert!(wait_until(Duration::from_secs(5), || captured.lock().len() == 1));

    // Disarmed: the worker keeps draining, nothing is dispatched.
    bus.clear_callback("foo").unwrap();
    bus.send_to("foo", b"dropped", SEND_TIMEOUT, "").unwrap();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(captured.lock().len(), 1);

    // Re-armed: later messages arrive again.
    {
        let captured = Arc::clone(&captured);
        bus.register_callback("foo", move |response| {
            captured.lock().push(response.data);
        })
        .unwrap();
    }
    bus.send_to("foo", b"second", SEND_TIMEOUT, "").unwrap();
    assert!(wait_until(Duration::from_secs(5), || captured.lock().len() == 2));
    assert_eq!(captured.lock()[1], b"second".to_vec());

    bus.stop_listening("foo").unwrap();
}

#[test]
fn test_one_sender_thread_is_fifo() {
    let bus = bus_with_channel("foo", "inproc://ptp-fifo");
    bus.start_listening("foo").unwrap();

    let captured: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let captured = Arc::clone(&captured);
        bus.register_callback("foo", move |response| {
            captured.lock().push(response.data);
        })
        .unwrap();
    }

    for i in 0..100u32 {
        bus.send_to("foo", &i.to_be_bytes(), SEND_TIMEOUT, "").unwrap();
    }

    assert!(wait_until(Duration::from_secs(10), || captured.lock().len() == 100));
    {
        let captured = captured.lock();
        for (i, data) in captured.iter().enumerate() {
            assert_eq!(data.as_slice(), (i as u32).to_be_bytes());
        }
    }

    bus.stop_listening("foo").unwrap();
}
