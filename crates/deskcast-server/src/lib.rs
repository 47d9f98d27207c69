//! deskcast-server library crate.
//!
//! Serves a live image source as a multi-viewer MJPEG feed over a hand-rolled
//! HTTP/1.1 implementation, and turns viewer pointer/keyboard events into
//! calls on the host's input backend.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (GET /stream, POST /input)
//!         ↕
//! [deskcast-server]
//!   ├── domain/           ServerConfig, ServerEvent
//!   ├── application/      FrameSource/InputSink ports, Router, InputDispatcher, viewer page
//!   └── infrastructure/
//!         ├── connection/ bounded request reader + per-connection handler
//!         ├── registry/   ClientRegistry + StreamingSession
//!         ├── broadcaster/ frame fan-out
//!         ├── server/     accept loop, capture loop, start/stop
//!         ├── frame_source/, input_sink/  bundled collaborators
//!         └── config_file/ TOML settings for the binary
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `deskcast-core` only.
//! - `infrastructure` depends on all other layers plus `tokio`.

/// Domain layer: configuration and lifecycle events.
pub mod domain;

/// Application layer: routing, input dispatch, collaborator ports.
pub mod application;

/// Infrastructure layer: sockets, sessions, broadcast, server lifecycle.
pub mod infrastructure;

pub use application::ports::{FrameSource, InputError, InputSink};
pub use domain::{ServerConfig, ServerEvent};
pub use infrastructure::server::{Server, ServerError};
