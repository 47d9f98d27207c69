//! Server lifecycle: bind, accept, capture/broadcast timer, stop.
//!
//! # Tasks
//!
//! A running server owns two long-lived Tokio tasks plus one task per
//! accepted connection:
//!
//! ```text
//!   accept loop ──spawn──▶ handle_connection (one per socket)
//!                               └─ /stream → StreamingSession in ClientRegistry
//!
//!   capture loop: tick ─▶ registry empty? skip
//!                      ─▶ FrameSource::capture (blocking pool)
//!                      ─▶ FrameBroadcaster::broadcast
//! ```
//!
//! Connection tasks are tracked in a `TaskTracker` so [`Server::stop`] can
//! wait for them.  Everything observes one `CancellationToken`; stopping
//! cancels it, which also completes every session's own token because those
//! are children of it.
//!
//! # Capture timing
//!
//! The timer uses `MissedTickBehavior::Skip`: if a capture plus broadcast
//! overruns the period, the missed ticks are dropped rather than bunched up,
//! so two passes never overlap and viewers never see a burst.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use deskcast_core::CaptureBounds;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::broadcaster::FrameBroadcaster;
use super::connection::{handle_connection, ConnectionContext};
use super::registry::ClientRegistry;
use crate::application::ports::{resolve_capture_bounds, FrameSource, InputSink};
use crate::application::InputDispatcher;
use crate::domain::{ServerConfig, ServerEvent};

/// Error type for server lifecycle operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound (port in use, no permission, ...).
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server is already running")]
    AlreadyRunning,
}

/// Handles that only exist between `start` and `stop`.
struct Running {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    connections: TaskTracker,
    accept_task: JoinHandle<()>,
    capture_task: JoinHandle<()>,
}

/// The MJPEG viewer server.
///
/// Construct with [`Server::new`], then [`Server::start`].  The server can be
/// stopped and started again; the registry and event channel survive.
pub struct Server {
    config: ServerConfig,
    frame_source: Arc<dyn FrameSource>,
    dispatcher: InputDispatcher,
    registry: Arc<ClientRegistry>,
    bounds: Arc<RwLock<CaptureBounds>>,
    running: Option<Running>,
}

impl Server {
    /// Creates a stopped server.
    ///
    /// Returns the server and the receiving end of its lifecycle event
    /// channel.  Dropping the receiver is allowed.
    pub fn new(
        config: ServerConfig,
        frame_source: Arc<dyn FrameSource>,
        input_sink: Arc<dyn InputSink>,
    ) -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let bounds = Arc::new(RwLock::new(config.fallback_bounds));
        let server = Self {
            config,
            frame_source,
            dispatcher: InputDispatcher::new(input_sink),
            registry: Arc::new(ClientRegistry::new(events_tx)),
            bounds,
            running: None,
        };
        (server, events_rx)
    }

    /// Binds the listener and starts the accept and capture loops.
    ///
    /// Returns the bound address, which differs from the configured one
    /// when port 0 was requested.
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] if the address is unavailable, in which case no
    /// task is started.  [`ServerError::AlreadyRunning`] if called twice
    /// without a `stop` in between.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let bounds = resolve_capture_bounds(self.frame_source.as_ref(), self.config.fallback_bounds);
        *self.bounds.write() = bounds;

        let shutdown = CancellationToken::new();
        let connections = TaskTracker::new();
        let ctx = Arc::new(ConnectionContext {
            registry: Arc::clone(&self.registry),
            dispatcher: self.dispatcher.clone(),
            bounds: Arc::clone(&self.bounds),
            request_timeout: self.config.request_timeout,
            body_timeout: self.config.body_timeout,
            shutdown: shutdown.clone(),
        });

        let accept_task = tokio::spawn(accept_loop(
            listener,
            ctx,
            connections.clone(),
            shutdown.clone(),
        ));
        let capture_task = tokio::spawn(capture_loop(
            Arc::clone(&self.frame_source),
            FrameBroadcaster::new(Arc::clone(&self.registry), self.config.write_timeout),
            Arc::clone(&self.registry),
            Arc::clone(&self.bounds),
            self.config.frame_interval,
            shutdown.clone(),
        ));

        info!(
            "listening on {local_addr}, capturing {}x{} at {},{} every {:?}",
            bounds.width, bounds.height, bounds.x, bounds.y, self.config.frame_interval
        );

        self.running = Some(Running {
            local_addr,
            shutdown,
            connections,
            accept_task,
            capture_task,
        });
        Ok(local_addr)
    }

    /// Stops accepting, stops the capture timer, closes every session, and
    /// waits for connection tasks to finish.  Calling it on a stopped server
    /// does nothing.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.shutdown.cancel();
        for (name, task) in [("accept", running.accept_task), ("capture", running.capture_task)] {
            if let Err(e) = task.await {
                error!("{name} task failed: {e}");
            }
        }

        let closed = self.registry.close_all();
        running.connections.close();
        running.connections.wait().await;
        info!("server on {} stopped, {closed} viewer(s) disconnected", running.local_addr);
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Keys of the currently registered viewers, sorted.
    pub fn client_keys(&self) -> Vec<String> {
        self.registry.keys()
    }

    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    /// The bounds resolved by the last `start`, or the configured fallback
    /// before the first one.
    pub fn capture_bounds(&self) -> CaptureBounds {
        *self.bounds.read()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.shutdown.cancel();
            self.registry.close_all();
        }
    }
}

// ── Background loops ──────────────────────────────────────────────────────────

async fn accept_loop(
    listener: TcpListener,
    ctx: Arc<ConnectionContext>,
    connections: TaskTracker,
    shutdown: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, peer)) => {
                debug!("accepted {peer}");
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("set_nodelay on {peer}: {e}");
                }
                connections.spawn(handle_connection(stream, peer, Arc::clone(&ctx)));
            }
            Err(e) => {
                // Usually fd exhaustion; back off instead of spinning.
                error!("accept error: {e}");
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
    debug!("accept loop stopped");
}

async fn capture_loop(
    source: Arc<dyn FrameSource>,
    broadcaster: FrameBroadcaster,
    registry: Arc<ClientRegistry>,
    bounds: Arc<RwLock<CaptureBounds>>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if registry.is_empty() {
            continue;
        }

        let region = *bounds.read();
        let grab = Arc::clone(&source);
        let frame = match tokio::task::spawn_blocking(move || grab.capture(&region)).await {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) => {
                warn!("frame capture failed: {e}");
                continue;
            }
        };

        tokio::select! {
            _ = shutdown.cancelled() => break,
            report = broadcaster.broadcast(&frame) => {
                if !report.dropped.is_empty() {
                    debug!(
                        delivered = report.delivered,
                        "dropped viewers after failed write: {:?}",
                        report.dropped
                    );
                }
            }
        }
    }
    debug!("capture loop stopped");
}
