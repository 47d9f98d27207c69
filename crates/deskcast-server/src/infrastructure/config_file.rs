//! TOML settings file for the `deskcast` binary.
//!
//! Looked up at, in order: `--config <path>` / `DESKCAST_CONFIG`, then
//! `$XDG_CONFIG_HOME/deskcast/config.toml` (or `~/.config/...`).  A missing
//! file is not an error; every field has a default.
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! port = 8080
//! frame_rate = 30
//! request_timeout_secs = 10
//! body_timeout_ms = 2000
//! write_timeout_ms = 2000
//!
//! [capture]
//! frames = "/var/lib/deskcast/frames"
//! x = 0
//! y = 0
//! width = 1920
//! height = 1080
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Command-line flags override whatever the file says.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use deskcast_core::CaptureBounds;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::DEFAULT_PORT;
use crate::domain::ServerConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("frame rate must be between 1 and 1000, got {0}")]
    InvalidFrameRate(u32),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub capture: CaptureSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[server]`: listener and timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Capture/broadcast ticks per second.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_body_timeout_ms")]
    pub body_timeout_ms: u64,
    /// Per-viewer frame write deadline.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

/// `[capture]`: where frames come from and the region input maps onto.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureSection {
    /// A JPEG file or a directory of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<PathBuf>,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_frame_rate() -> u32 {
    30
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_body_timeout_ms() -> u64 {
    2000
}
fn default_write_timeout_ms() -> u64 {
    2000
}
fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            frame_rate: default_frame_rate(),
            request_timeout_secs: default_request_timeout_secs(),
            body_timeout_ms: default_body_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            frames: None,
            x: 0,
            y: 0,
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl CaptureSection {
    pub fn bounds(&self) -> CaptureBounds {
        CaptureBounds::new(self.x, self.y, self.width, self.height)
    }
}

impl FileConfig {
    /// Builds the runtime [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidBindAddress`] if `bind_address` is not an IP
    /// address, [`ConfigError::InvalidFrameRate`] if `frame_rate` is 0 or
    /// above 1000.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let ip: IpAddr = self
            .server
            .bind_address
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(self.server.bind_address.clone()))?;
        let rate = self.server.frame_rate;
        if !(1..=1000).contains(&rate) {
            return Err(ConfigError::InvalidFrameRate(rate));
        }

        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, self.server.port),
            frame_interval: Duration::from_secs(1) / rate,
            fallback_bounds: self.capture.bounds(),
            request_timeout: Duration::from_secs(self.server.request_timeout_secs),
            body_timeout: Duration::from_millis(self.server.body_timeout_ms),
            write_timeout: Duration::from_millis(self.server.write_timeout_ms),
        })
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// `$XDG_CONFIG_HOME/deskcast/config.toml`, falling back to `~/.config`.
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("deskcast").join("config.toml"))
}

/// Loads `path`, returning [`FileConfig::default()`] if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
