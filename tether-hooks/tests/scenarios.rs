//! End-to-end scenarios wiring several hooks together over the mock
//! platform seams.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tether_core::collection::Queue;
use tether_core::merge;
use tether_core::task::TaskError;
use tether_hooks::query::QueryParam;
use tether_hooks::socket::{ReconnectingChannel, SocketEvent, SocketOptions};
use tether_hooks::storage::{KeyEntry, KeyValueStore, StoreOptions};
use tether_hooks::worker::WorkerChannel;
use tether_hooks::HooksConfig;
use tether_platform::location::{LocationHost, MemoryLocation};
use tether_platform::storage::MemoryBackend;
use tether_platform::transport::{MockTransport, Transport};
use tether_platform::worker::{MockHost, WorkerHost};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Layered settings: defaults, a config file, then per-call overrides,
/// merged into one effective object.
#[test]
fn layered_settings_merge() {
    init_tracing();

    let defaults = json!({
        "api": {"host": "localhost", "port": 443, "tls": true},
        "retries": 3,
    });
    let file = json!({
        "api": {"host": "tether.example", "timeout_ms": 2000},
    });
    let overrides = json!({
        "retries": 5,
        "api": {"port": 8443},
    });

    let effective = merge::merge([&defaults, &file, &overrides]);
    assert_eq!(
        effective,
        json!({
            "api": {
                "host": "tether.example",
                "port": 8443,
                "tls": true,
                "timeout_ms": 2000,
            },
            "retries": 5,
        })
    );
}

/// A bounded recent-items queue: the oldest entry is the one dequeued, and
/// a full queue rejects instead of evicting.
#[test]
fn bounded_recent_items_queue() {
    init_tracing();

    let mut recent: Queue<String> = Queue::new(Some(3));
    assert!(recent.enqueue("one".into()));
    assert!(recent.enqueue("two".into()));
    assert!(recent.enqueue("three".into()));
    assert!(!recent.enqueue("rejected".into()));

    assert_eq!(recent.dequeue(), Some("one".into()));
    assert!(recent.enqueue("four".into()));
    assert_eq!(recent.items(), vec!["two", "three", "four"]);
}

/// Connect, exchange messages, lose the connection, reconnect, and keep
/// going - all against a scripted transport.
#[tokio::test(start_paused = true)]
async fn socket_survives_a_dropped_connection() {
    init_tracing();

    let transport = MockTransport::new();
    let channel = ReconnectingChannel::new(
        "wss://example/live",
        transport.clone(),
        SocketOptions {
            reconnect_interval: Duration::from_millis(10),
            ..SocketOptions::default()
        },
    );
    let mut events = channel.events().unwrap();

    channel.connect();
    assert_eq!(events.recv().await, Some(SocketEvent::Open));

    assert!(channel.send_json_message(&json!({"kind": "hello"})).await);
    transport.queue_frame(b"ack".to_vec());
    assert_eq!(
        events.recv().await,
        Some(SocketEvent::Message(b"ack".to_vec()))
    );

    // Peer drops the connection; the channel reconnects on its own.
    transport.close().await.unwrap();
    assert_eq!(events.recv().await, Some(SocketEvent::Close));
    assert_eq!(events.recv().await, Some(SocketEvent::Open));
    assert_eq!(transport.connect_count(), 2);

    transport.queue_frame(b"back".to_vec());
    assert_eq!(
        events.recv().await,
        Some(SocketEvent::Message(b"back".to_vec()))
    );
}

/// A cached key entry and a second store instance sharing one backend see
/// each other's writes through the storage namespace.
#[tokio::test]
async fn storage_namespace_is_shared_across_instances() {
    init_tracing();

    let backend = MemoryBackend::new();
    let options = StoreOptions::default();

    let writer = KeyValueStore::new(backend.clone(), options.clone());
    writer.set("theme", json!("dark")).await.unwrap();

    let entry = KeyEntry::new(KeyValueStore::new(backend.clone(), options), "theme");
    entry.load().await;
    assert_eq!(entry.state().value, Some(json!("dark")));

    entry.set(json!("light")).await.unwrap();
    assert_eq!(writer.get("theme").await.unwrap(), Some(json!("light")));
}

/// Config-file options flow into a live worker channel.
#[tokio::test(start_paused = true)]
async fn configured_worker_times_out() {
    init_tracing();

    let config = HooksConfig::from_toml(
        r#"
        [worker]
        timeout_ms = 50
        "#,
    )
    .unwrap();

    let options = config.worker.to_options();
    assert_eq!(options.timeout, Some(Duration::from_millis(50)));

    // A host that never replies exercises the configured timeout.
    let host = MockHost::new();
    let channel = WorkerChannel::with_host(host.clone(), options);
    channel.post(json!(1));

    let mut states = channel.subscribe();
    loop {
        let snapshot = states.borrow().clone();
        if !snapshot.loading {
            assert_eq!(snapshot.error, Some(TaskError::Timeout));
            break;
        }
        states.changed().await.unwrap();
    }
    assert!(host.is_terminated());
}

/// Two bindings of the same query key, one writing and one reading,
/// resynchronize through the location host.
#[tokio::test]
async fn query_params_resync_through_the_location() {
    init_tracing();

    let location = Arc::new(MemoryLocation::new("a=1"));
    let page = QueryParam::new(Arc::clone(&location), "page");
    let mirror = QueryParam::new(Arc::clone(&location), "page");
    let mut changes = mirror.changes();

    page.set("2");
    changes.changed().await.unwrap();
    assert_eq!(mirror.get(), Some("2".to_string()));
    // The unrelated pair survived the rewrite.
    assert_eq!(location.read_query(), "a=1&page=2");
}
