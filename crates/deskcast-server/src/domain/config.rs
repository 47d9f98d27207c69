//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for runtime settings.  The
//! binary fills it from CLI arguments and the optional config file; tests
//! build it directly.

use std::net::SocketAddr;
use std::time::Duration;

use deskcast_core::CaptureBounds;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default capture/broadcast period (~30 frames per second).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// All runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.  `0.0.0.0` accepts viewers on
    /// every interface.
    pub bind_addr: SocketAddr,

    /// Period of the capture/broadcast timer.
    pub frame_interval: Duration,

    /// Region used when the frame source reports neither usable bounds nor a
    /// usable primary display.
    pub fallback_bounds: CaptureBounds,

    /// How long a new connection may take to deliver its request head.
    /// Silent connections are closed without a response.
    pub request_timeout: Duration,

    /// How long to wait for a POST body after the head has arrived.  A body
    /// that misses this deadline is treated as absent.
    pub body_timeout: Duration,

    /// How long one frame write to one viewer may take.  A viewer that
    /// stops reading is dropped once this elapses, so it cannot hold up the
    /// broadcast pass for everyone else.
    pub write_timeout: Duration,
}

impl ServerConfig {
    /// Frames per second implied by [`ServerConfig::frame_interval`].
    pub fn frames_per_second(&self) -> f64 {
        1.0 / self.frame_interval.as_secs_f64().max(f64::EPSILON)
    }
}

impl Default for ServerConfig {
    /// | Field            | Default          |
    /// |------------------|------------------|
    /// | bind_addr        | `0.0.0.0:8080`   |
    /// | frame_interval   | 33 ms            |
    /// | fallback_bounds  | 1920×1080 at 0,0 |
    /// | request_timeout  | 10 s             |
    /// | body_timeout     | 2 s              |
    /// | write_timeout    | 2 s              |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            fallback_bounds: CaptureBounds::default(),
            request_timeout: Duration::from_secs(10),
            body_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
        }
    }
}
