//! deskcast: serve a live image feed to any number of browsers and let them
//! drive the host's pointer and keyboard.
//!
//! # Usage
//!
//! ```text
//! deskcast [OPTIONS] --frames <PATH>
//!
//! Options:
//!   --config <PATH>      TOML settings file
//!   --frames <PATH>      JPEG file or directory of JPEGs to stream
//!   --bind   <IP>        Listener address [default: 0.0.0.0]
//!   --port   <PORT>      Listener port [default: 8080]
//!   --fps    <N>         Capture/broadcast rate [default: 30]
//!   --bounds <WxH+X+Y>   Region input is mapped onto [default: 1920x1080+0+0]
//!   --log-level <LEVEL>  Used when RUST_LOG is unset [default: info]
//! ```
//!
//! Open `http://<host>:<port>/display` in a browser to watch.
//!
//! # Environment variable overrides
//!
//! | Variable          | Flag        |
//! |-------------------|-------------|
//! | `DESKCAST_CONFIG` | `--config`  |
//! | `DESKCAST_FRAMES` | `--frames`  |
//! | `DESKCAST_BIND`   | `--bind`    |
//! | `DESKCAST_PORT`   | `--port`    |
//! | `DESKCAST_FPS`    | `--fps`     |
//!
//! Flags beat environment variables, which beat the config file, which
//! beats the built-in defaults.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use deskcast_core::CaptureBounds;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use deskcast_server::infrastructure::config_file::{default_config_path, load_config, FileConfig};
use deskcast_server::infrastructure::frame_source::FileFrameSource;
use deskcast_server::infrastructure::input_sink::LoggingInputSink;
use deskcast_server::{Server, ServerEvent};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Multi-viewer MJPEG screen feed with remote input.
#[derive(Debug, Parser)]
#[command(name = "deskcast", version)]
struct Cli {
    /// TOML settings file.  Defaults to `~/.config/deskcast/config.toml`.
    #[arg(long, env = "DESKCAST_CONFIG")]
    config: Option<PathBuf>,

    /// A JPEG file, or a directory whose JPEGs are played in name order.
    #[arg(long, env = "DESKCAST_FRAMES")]
    frames: Option<PathBuf>,

    /// IP address to bind.  `0.0.0.0` accepts viewers on every interface.
    #[arg(long, env = "DESKCAST_BIND")]
    bind: Option<String>,

    #[arg(long, env = "DESKCAST_PORT")]
    port: Option<u16>,

    /// Frames captured and broadcast per second.
    #[arg(long, env = "DESKCAST_FPS")]
    fps: Option<u32>,

    /// Desktop region viewer input is mapped onto, as `WIDTHxHEIGHT+X+Y`.
    #[arg(long, value_parser = parse_bounds)]
    bounds: Option<CaptureBounds>,

    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Layers the command-line values over `file`.
    fn apply_to(self, mut file: FileConfig) -> FileConfig {
        if let Some(frames) = self.frames {
            file.capture.frames = Some(frames);
        }
        if let Some(bind) = self.bind {
            file.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            file.server.port = port;
        }
        if let Some(fps) = self.fps {
            file.server.frame_rate = fps;
        }
        if let Some(b) = self.bounds {
            file.capture.x = b.x;
            file.capture.y = b.y;
            file.capture.width = b.width;
            file.capture.height = b.height;
        }
        if let Some(level) = self.log_level {
            file.logging.level = level;
        }
        file
    }
}

/// Parses `WIDTHxHEIGHT+X+Y` (offsets optional, may be negative).
fn parse_bounds(s: &str) -> Result<CaptureBounds, String> {
    let err = || format!("expected WIDTHxHEIGHT[+X+Y], got {s:?}");

    let (size, offsets) = match s.find(['+', '-']) {
        Some(i) => s.split_at(i),
        None => (s, ""),
    };
    let (w, h) = size.split_once('x').ok_or_else(err)?;
    let width: u32 = w.parse().map_err(|_| err())?;
    let height: u32 = h.parse().map_err(|_| err())?;

    let (x, y) = if offsets.is_empty() {
        (0, 0)
    } else {
        // "+10-20" → ["+10", "-20"]
        let split = offsets[1..].find(['+', '-']).map(|i| i + 1).ok_or_else(err)?;
        let (xs, ys) = offsets.split_at(split);
        (
            xs.parse::<i32>().map_err(|_| err())?,
            ys.parse::<i32>().map_err(|_| err())?,
        )
    };

    let bounds = CaptureBounds::new(x, y, width, height);
    if bounds.is_degenerate() {
        return Err(format!("bounds {s:?} have zero area"));
    }
    Ok(bounds)
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(default_config_path);
    let file = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => FileConfig::default(),
    };
    let settings = cli.apply_to(file);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .init();

    let config = settings.to_server_config()?;
    let Some(frames_path) = settings.capture.frames.as_deref() else {
        bail!("no frame source configured; pass --frames or set [capture] frames");
    };
    let frames = FileFrameSource::open(frames_path, settings.capture.bounds())
        .context("failed to load frames")?;
    info!(
        "streaming {} frame(s) from {} at {} fps",
        frames.frame_count(),
        frames_path.display(),
        settings.server.frame_rate
    );

    let (mut server, mut events) =
        Server::new(config, Arc::new(frames), Arc::new(LoggingInputSink));
    let addr = server.start().await?;
    info!("deskcast ready: http://{addr}/display");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ServerEvent::ClientConnected { key }) => {
                    info!(viewers = server.client_count(), "viewer connected: {key}");
                }
                Some(ServerEvent::ClientDisconnected { key }) => {
                    info!(viewers = server.client_count(), "viewer disconnected: {key}");
                }
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("received Ctrl+C, shutting down"),
                    Err(e) => error!("failed to listen for Ctrl+C: {e}"),
                }
                break;
            }
        }
    }

    server.stop().await;
    info!("deskcast stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
