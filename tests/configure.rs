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

//! Catalog, lifecycle, and error-taxonomy behavior of the facade.

use msgbus::{BusError, ChannelRecord, Direction, MemoryTransport, MessageBus};
use std::sync::Arc;
use std::time::Duration;

fn bus() -> MessageBus {
    MessageBus::new(Arc::new(MemoryTransport::new()))
}

fn seed_records(prefix: &str) -> Vec<ChannelRecord> {
    vec![
        ChannelRecord::new("foo", format!("inproc://{prefix}-foo")),
        ChannelRecord::new("bar", format!("inproc://{prefix}-bar"))
            .with_topics(["bax", "bay", "baz"]),
        ChannelRecord::new("rab", format!("inproc://{prefix}-rab"))
            .with_topics(["bav", "baw", "baz"]),
    ]
}

#[test]
fn test_catalog_basics() {
    let bus = bus();
    bus.configure(&seed_records("cfg-basics")).unwrap();

    assert!(bus.is_connection("foo"));
    assert!(bus.is_connection("bar"));
    assert!(bus.is_pubsub_connection("bar"));
    assert!(!bus.is_pubsub_connection("foo"));
    assert!(bus.is_topic("baz"));
    assert!(!bus.is_connection("baz"));
    assert!(!bus.is_topic("foo"));

    assert_eq!(
        bus.get_connection_string("foo").unwrap(),
        "inproc://cfg-basics-foo"
    );
    assert_eq!(
        bus.get_connection_strings("baz").unwrap(),
        vec![
            "inproc://cfg-basics-bar".to_string(),
            "inproc://cfg-basics-rab".to_string(),
        ]
    );
}

#[test]
fn test_name_collision_leaves_the_bus_empty() {
    let bus = bus();
    let records = vec![
        ChannelRecord::new("foo", "inproc://cfg-collide-foo"),
        ChannelRecord::new("bar", "inproc://cfg-collide-bar").with_topics(["foo"]),
    ];
    let error = bus.configure(&records).unwrap_err();
    assert!(matches!(error, BusError::NameCollision { name } if name == "foo"));

    assert!(!bus.is_connection("foo"));
    // Still empty: a fresh configure succeeds.
    bus.configure(&[ChannelRecord::new("foo", "inproc://cfg-collide-retry")])
        .unwrap();
}

#[test]
fn test_duplicate_channel_names_collide() {
    let bus = bus();
    let records = vec![
        ChannelRecord::new("dup", "inproc://cfg-dup-a"),
        ChannelRecord::new("dup", "inproc://cfg-dup-b"),
    ];
    assert!(matches!(
        bus.configure(&records).unwrap_err(),
        BusError::NameCollision { name } if name == "dup"
    ));
}

#[test]
fn test_channel_name_matching_earlier_topic_collides() {
    let bus = bus();
    let records = vec![
        ChannelRecord::new("bar", "inproc://cfg-rev-bar").with_topics(["foo"]),
        ChannelRecord::new("foo", "inproc://cfg-rev-foo"),
    ];
    assert!(matches!(
        bus.configure(&records).unwrap_err(),
        BusError::NameCollision { name } if name == "foo"
    ));
}

#[test]
fn test_double_configure_is_rejected() {
    let bus = bus();
    bus.configure(&seed_records("cfg-double")).unwrap();
    let error = bus.configure(&seed_records("cfg-double")).unwrap_err();
    assert!(matches!(error, BusError::AlreadyConfigured));
    // State unchanged by the failed attempt.
    assert!(bus.is_connection("foo"));
    assert!(bus.is_topic("baz"));
}

#[test]
fn test_reset_returns_to_empty() {
    let bus = bus();
    bus.configure(&seed_records("cfg-reset")).unwrap();
    bus.start_listening("foo").unwrap();
    bus.send_to("foo", b"x", Duration::from_millis(100), "")
        .unwrap();
    assert!(bus.is_listening("foo"));
    assert!(bus.is_connection_open("foo", Direction::Send));

    bus.reset();

    assert!(!bus.is_listening("foo"));
    assert!(!bus.is_connection_open("foo", Direction::Send));
    assert!(!bus.is_connection_open("foo", Direction::Receive));
    assert!(!bus.is_connection("foo"));
    assert!(bus.sample_counters().is_empty());

    // Configure is legal again after reset.
    bus.configure(&seed_records("cfg-reset-again")).unwrap();
    assert!(bus.is_connection("foo"));
}

#[test]
fn test_unknown_name_fails_every_operation() {
    let bus = bus();
    bus.configure(&seed_records("cfg-unknown")).unwrap();

    let timeout = Duration::from_millis(10);
    assert!(matches!(
        bus.send_to("ghost", b"x", timeout, "").unwrap_err(),
        BusError::ConnectionNotFound { name } if name == "ghost"
    ));
    assert!(matches!(
        bus.start_listening("ghost").unwrap_err(),
        BusError::ConnectionNotFound { .. }
    ));
    assert!(matches!(
        bus.get_connection_string("ghost").unwrap_err(),
        BusError::ConnectionNotFound { .. }
    ));
    assert!(matches!(
        bus.receive_from("ghost", timeout).unwrap_err(),
        BusError::ConnectionNotFound { .. }
    ));
}

#[test]
fn test_callback_requires_an_active_listener() {
    let bus = bus();
    bus.configure(&seed_records("cfg-callback")).unwrap();

    assert!(matches!(
        bus.register_callback("foo", |_| {}).unwrap_err(),
        BusError::ListenerNotRegistered { key } if key == "foo"
    ));
    assert!(matches!(
        bus.clear_callback("baz").unwrap_err(),
        BusError::ListenerNotRegistered { .. }
    ));
    // Unknown keys are reported as such, not as missing listeners.
    assert!(matches!(
        bus.register_callback("ghost", |_| {}).unwrap_err(),
        BusError::ConnectionNotFound { .. }
    ));
}

#[test]
fn test_subscribe_rejects_non_topics() {
    let bus = bus();
    bus.configure(&seed_records("cfg-subscribe")).unwrap();

    assert!(matches!(
        bus.subscribe("ghost").unwrap_err(),
        BusError::TopicNotFound { topic } if topic == "ghost"
    ));
    // A channel name is not a topic.
    assert!(matches!(
        bus.subscribe("bar").unwrap_err(),
        BusError::TopicNotFound { .. }
    ));
}

#[test]
fn test_stop_without_listener_is_an_error() {
    let bus = bus();
    bus.configure(&seed_records("cfg-stop")).unwrap();

    assert!(matches!(
        bus.stop_listening("foo").unwrap_err(),
        BusError::ListenerNotRegistered { .. }
    ));
    assert!(matches!(
        bus.unsubscribe("baz").unwrap_err(),
        BusError::ListenerNotRegistered { .. }
    ));
}

#[test]
fn test_start_publisher_taxonomy() {
    let bus = bus();
    bus.configure(&seed_records("cfg-publisher")).unwrap();

    assert!(matches!(
        bus.start_publisher("ghost").unwrap_err(),
        BusError::ConnectionNotFound { .. }
    ));
    assert!(matches!(
        bus.start_publisher("foo").unwrap_err(),
        BusError::OperationFailed { .. }
    ));

    assert!(!bus.is_connection_open("bar", Direction::Send));
    bus.start_publisher("bar").unwrap();
    assert!(bus.is_connection_open("bar", Direction::Send));
    // Idempotent once the endpoint exists.
    bus.start_publisher("bar").unwrap();
}
