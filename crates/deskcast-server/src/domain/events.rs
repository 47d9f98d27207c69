//! Lifecycle notifications exposed to whatever drives the server.
//!
//! The server pushes these through an unbounded channel returned by
//! [`crate::Server::new`].  A desktop shell can marshal them onto its UI
//! thread; the bundled binary just logs them.

/// A viewer joined or left the stream.
///
/// For any given key, `ClientConnected` is delivered once and
/// `ClientDisconnected` at most once after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A streaming session was registered.  `key` is the viewer's remote
    /// endpoint, e.g. `"192.168.1.7:51234"`.
    ClientConnected { key: String },

    /// A streaming session left the registry for good.
    ClientDisconnected { key: String },
}

impl ServerEvent {
    pub fn key(&self) -> &str {
        match self {
            ServerEvent::ClientConnected { key } | ServerEvent::ClientDisconnected { key } => key,
        }
    }
}
