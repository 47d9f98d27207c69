//! Infrastructure layer for deskcast-server.
//!
//! Everything that touches sockets, timers, the filesystem, or task
//! spawning.

pub mod broadcaster;
pub mod config_file;
pub mod connection;
pub mod frame_source;
pub mod input_sink;
pub mod registry;
pub mod server;

pub use broadcaster::{BroadcastReport, FrameBroadcaster};
pub use registry::{ClientRegistry, RegistryError, StreamingSession};
pub use server::{Server, ServerError};
