//! FrameBroadcaster: fans one encoded frame out to every registered viewer.
//!
//! Each pass works on a snapshot of the registry, so viewers joining or
//! leaving mid-pass never block or corrupt it.  Writes run concurrently and
//! each one has its own deadline: a viewer that stops reading can hold the
//! pass for at most `write_timeout`, after which it counts as failed.
//! Sessions whose write fails are collected and released only after every
//! write has settled.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use deskcast_core::protocol::mjpeg::part_header;
use futures_util::future::join_all;
use tracing::debug;

use super::registry::{ClientRegistry, StreamingSession};

/// Outcome of one broadcast pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions that received the whole part.
    pub delivered: usize,
    /// Keys of sessions dropped because their write failed.
    pub dropped: Vec<String>,
}

/// Writes frames to every session in a [`ClientRegistry`].
#[derive(Clone)]
pub struct FrameBroadcaster {
    registry: Arc<ClientRegistry>,
    write_timeout: Duration,
}

impl FrameBroadcaster {
    pub fn new(registry: Arc<ClientRegistry>, write_timeout: Duration) -> Self {
        Self {
            registry,
            write_timeout,
        }
    }

    /// Sends `frame` as one multipart part to every registered session.
    ///
    /// An empty frame is a no-op.
    pub async fn broadcast(&self, frame: &Bytes) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        if frame.is_empty() {
            return report;
        }

        let sessions = self.registry.snapshot();
        if sessions.is_empty() {
            return report;
        }

        let header = part_header(frame.len());
        let results = join_all(
            sessions
                .iter()
                .map(|session| self.write_with_deadline(session, &header, frame)),
        )
        .await;

        let mut failed: Vec<&Arc<StreamingSession>> = Vec::new();
        for (session, result) in sessions.iter().zip(results) {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    debug!("frame write to {} failed: {e}", session.key());
                    failed.push(session);
                }
            }
        }

        for session in failed {
            self.registry.release(session);
            report.dropped.push(session.key().to_string());
        }
        report
    }

    async fn write_with_deadline(
        &self,
        session: &StreamingSession,
        header: &[u8],
        frame: &[u8],
    ) -> io::Result<()> {
        match tokio::time::timeout(self.write_timeout, session.write_frame(header, frame)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("frame write exceeded {:?}", self.write_timeout),
            )),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
