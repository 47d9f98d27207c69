//! Concurrency tests for ClientRegistry and FrameBroadcaster.
//!
//! Many tasks register and release sessions while frames are broadcast.
//! Whatever the interleaving, every session must end up connected once,
//! disconnected once, and gone from the registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use deskcast_server::infrastructure::{ClientRegistry, FrameBroadcaster, StreamingSession};
use deskcast_server::ServerEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const SESSIONS: usize = 100;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_release_and_broadcast() {
    // Arrange
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = Arc::new(ClientRegistry::new(tx));
    let broadcaster = FrameBroadcaster::new(Arc::clone(&registry), Duration::from_secs(1));
    let stop = CancellationToken::new();

    let pump = {
        let stop = stop.clone();
        tokio::spawn(async move {
            let frame = Bytes::from_static(b"frame");
            let mut passes = 0usize;
            while !stop.is_cancelled() {
                broadcaster.broadcast(&frame).await;
                passes += 1;
                tokio::task::yield_now().await;
            }
            passes
        })
    };

    // Act
    let workers: Vec<_> = (0..SESSIONS)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let session = StreamingSession::new(
                    format!("10.0.0.{i}:4000"),
                    Box::new(tokio::io::sink()),
                    CancellationToken::new(),
                );
                registry.register(Arc::clone(&session)).unwrap();
                tokio::task::yield_now().await;
                registry.release(&session);
                // A second release, as if the broadcaster raced the handler
                registry.release(&session);
            })
        })
        .collect();
    for worker in workers {
        worker.await.unwrap();
    }
    stop.cancel();
    let passes = pump.await.unwrap();

    // Assert
    assert!(passes > 0);
    assert!(registry.is_empty());

    let mut per_key: HashMap<String, (usize, usize)> = HashMap::new();
    while let Ok(event) = rx.try_recv() {
        let entry = per_key.entry(event.key().to_string()).or_default();
        match event {
            ServerEvent::ClientConnected { .. } => entry.0 += 1,
            ServerEvent::ClientDisconnected { .. } => entry.1 += 1,
        }
    }
    assert_eq!(per_key.len(), SESSIONS);
    assert!(per_key.values().all(|&counts| counts == (1, 1)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_all_racing_releases_notifies_once_per_session() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = Arc::new(ClientRegistry::new(tx));
    let sessions: Vec<_> = (0..SESSIONS)
        .map(|i| {
            let s = StreamingSession::new(
                format!("s{i}"),
                Box::new(tokio::io::sink()),
                CancellationToken::new(),
            );
            registry.register(Arc::clone(&s)).unwrap();
            s
        })
        .collect();

    let closer = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.close_all() })
    };
    let releaser = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { sessions.iter().filter(|s| registry.release(s)).count() })
    };
    let closed = closer.await.unwrap() + releaser.await.unwrap();

    assert_eq!(closed, SESSIONS);
    assert!(registry.is_empty());
    let disconnects = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|e| matches!(e, ServerEvent::ClientDisconnected { .. }))
        .count();
    assert_eq!(disconnects, SESSIONS);
}
