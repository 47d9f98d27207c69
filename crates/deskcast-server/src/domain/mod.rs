//! Domain layer for deskcast-server.
//!
//! Plain configuration and event types.  Nothing in here touches a socket,
//! a timer, or the filesystem.

pub mod config;
pub mod events;

pub use config::ServerConfig;
pub use events::ServerEvent;
