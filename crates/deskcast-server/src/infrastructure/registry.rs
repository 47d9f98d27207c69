//! ClientRegistry and StreamingSession: who is watching, and how to reach them.
//!
//! # Session lifecycle
//!
//! ```text
//!  GET /stream accepted
//!        │ stream head written
//!        ▼
//!     ┌──────┐  register()   ┌───────────┐  release() / close_all()  ┌────────┐
//!     │ OPEN │ ────────────▶ │ STREAMING │ ────────────────────────▶ │ CLOSED │
//!     └──────┘ ClientConnected└───────────┘   ClientDisconnected     └────────┘
//! ```
//!
//! `CLOSED` is terminal.  It is reached on a failed frame write, a server
//! stop, or the viewer hanging up, possibly several of those at once.  The
//! `closed` flag is flipped with a single atomic swap, and only the caller
//! that flips it emits `ClientDisconnected`, so the notification fires
//! exactly once per session.  A session that never reached STREAMING is
//! closed silently, since no `ClientConnected` was ever announced for it.
//!
//! # Locking
//!
//! The session map sits behind a `parking_lot::Mutex` that is only held for
//! map operations and flag flips, never across an `.await`.  Each session's
//! output sits behind its own async mutex, which is the "one writer per
//! session" rule.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use deskcast_core::protocol::mjpeg::PART_TRAILER;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::ServerEvent;

/// Write half of a viewer connection.
pub type SessionWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Error type for registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a session with key {0} is already registered")]
    DuplicateKey(String),
}

// ── StreamingSession ──────────────────────────────────────────────────────────

/// One viewer's long-lived `/stream` connection.
pub struct StreamingSession {
    key: String,
    output: tokio::sync::Mutex<Option<SessionWriter>>,
    done: CancellationToken,
    registered: AtomicBool,
    closed: AtomicBool,
}

impl StreamingSession {
    /// Creates a session in the OPEN state.
    ///
    /// `done` is the completion signal the connection handler waits on.
    /// Passing a child of the server's shutdown token means a server stop
    /// also releases sessions that never made it into the registry.
    pub fn new(key: impl Into<String>, output: SessionWriter, done: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            output: tokio::sync::Mutex::new(Some(output)),
            done,
            registered: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once the session has been told to finish.
    pub async fn finished(&self) {
        self.done.cancelled().await;
    }

    /// Writes one multipart frame part: header, flush, body, trailer, flush.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, or `NotConnected` when the session
    /// is already closed.
    pub async fn write_frame(&self, part_header: &[u8], frame: &[u8]) -> io::Result<()> {
        let mut guard = self.output.lock().await;
        if self.is_closed() {
            return Err(not_connected());
        }
        let out = guard.as_mut().ok_or_else(not_connected)?;

        out.write_all(part_header).await?;
        out.flush().await?;
        out.write_all(frame).await?;
        out.write_all(PART_TRAILER).await?;
        out.flush().await
    }

    /// Flips OPEN/STREAMING → CLOSED.  Returns `true` for the one caller
    /// that performed the transition.
    fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Drops the writer unless a frame write is in flight, in which case the
    /// writer goes away with the last reference to the session.
    fn drop_output(&self) {
        if let Ok(mut guard) = self.output.try_lock() {
            guard.take();
        }
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "streaming session closed")
}

// ── ClientRegistry ────────────────────────────────────────────────────────────

/// Concurrency-safe set of registered streaming sessions keyed by the
/// viewer's remote endpoint.
pub struct ClientRegistry {
    sessions: Mutex<HashMap<String, Arc<StreamingSession>>>,
    events: mpsc::UnboundedSender<ServerEvent>,
}

impl ClientRegistry {
    /// Creates an empty registry that reports to `events`.
    ///
    /// A dropped receiver is fine; notifications are then discarded.
    pub fn new(events: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Moves a session from OPEN to STREAMING and emits `ClientConnected`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateKey`] if the key is taken.  The existing
    /// session is left untouched.
    pub fn register(&self, session: Arc<StreamingSession>) -> Result<(), RegistryError> {
        let key = session.key().to_string();
        {
            let mut sessions = self.sessions.lock();
            match sessions.entry(key.clone()) {
                Entry::Occupied(_) => return Err(RegistryError::DuplicateKey(key)),
                Entry::Vacant(slot) => {
                    session.registered.store(true, Ordering::Release);
                    slot.insert(session);
                }
            }
        }
        let _ = self.events.send(ServerEvent::ClientConnected { key });
        Ok(())
    }

    /// Removes `session` if it is still the one registered under its key,
    /// closes it, and signals its completion.
    ///
    /// Returns `true` if this call closed a session that had been
    /// registered, which is the only case in which `ClientDisconnected` is
    /// emitted.  A session that was never registered is still closed and
    /// signalled.
    pub fn release(&self, session: &Arc<StreamingSession>) -> bool {
        let announce = {
            let mut sessions = self.sessions.lock();
            if sessions
                .get(session.key())
                .is_some_and(|registered| Arc::ptr_eq(registered, session))
            {
                sessions.remove(session.key());
            }
            session.mark_closed() && session.registered.load(Ordering::Acquire)
        };
        self.finish(session, announce);
        announce
    }

    /// Closes every registered session and empties the registry.
    ///
    /// Returns how many sessions this call closed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<(Arc<StreamingSession>, bool)> = {
            let mut sessions = self.sessions.lock();
            sessions
                .drain()
                .map(|(_, session)| {
                    let first_close = session.mark_closed();
                    (session, first_close)
                })
                .collect()
        };

        let mut closed = 0;
        for (session, first_close) in &drained {
            self.finish(session, *first_close);
            if *first_close {
                closed += 1;
            }
        }
        closed
    }

    /// A point-in-time copy of the registered sessions.
    pub fn snapshot(&self) -> Vec<Arc<StreamingSession>> {
        self.sessions.lock().values().cloned().collect()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sessions.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sessions.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    fn finish(&self, session: &StreamingSession, announce: bool) {
        session.done.cancel();
        session.drop_output();
        if announce {
            debug!("session {} closed", session.key());
            let _ = self.events.send(ServerEvent::ClientDisconnected {
                key: session.key().to_string(),
            });
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
