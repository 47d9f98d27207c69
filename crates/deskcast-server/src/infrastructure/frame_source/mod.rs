//! Bundled [`FrameSource`] implementations.
//!
//! Real screen grabbing is platform code that lives outside this crate.
//! What ships here is enough to run the server headless and to test it:
//!
//! - [`FileFrameSource`] replays JPEG files from disk.
//! - [`StaticFrameSource`] serves one in-memory frame and counts captures.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use deskcast_core::CaptureBounds;
use thiserror::Error;
use tracing::debug;

use crate::application::ports::FrameSource;

/// Error type for loading frames from disk.
#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error("cannot read frames from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no .jpg or .jpeg files found in {0}")]
    NoFrames(PathBuf),
}

// ── FileFrameSource ───────────────────────────────────────────────────────────

/// Cycles through JPEG files loaded once at startup.
///
/// Opened on a file, every capture returns that file.  Opened on a
/// directory, the `*.jpg` / `*.jpeg` files in it are played in file-name
/// order and the sequence wraps around.
#[derive(Debug)]
pub struct FileFrameSource {
    frames: Vec<Bytes>,
    bounds: CaptureBounds,
    cursor: AtomicUsize,
}

impl FileFrameSource {
    /// Loads frames from `path`.
    ///
    /// # Errors
    ///
    /// [`FrameSourceError::Io`] if `path` or any frame cannot be read,
    /// [`FrameSourceError::NoFrames`] if a directory holds no JPEGs.
    pub fn open(path: &Path, bounds: CaptureBounds) -> Result<Self, FrameSourceError> {
        let io_err = |source| FrameSourceError::Io {
            path: path.to_path_buf(),
            source,
        };

        let files = if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)
                .map_err(io_err)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_jpeg(p))
                .collect();
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        if files.is_empty() {
            return Err(FrameSourceError::NoFrames(path.to_path_buf()));
        }

        let frames = files
            .iter()
            .map(|file| {
                std::fs::read(file)
                    .map(Bytes::from)
                    .map_err(|source| FrameSourceError::Io {
                        path: file.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("loaded {} frame(s) from {}", frames.len(), path.display());
        Ok(Self {
            frames,
            bounds,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

impl FrameSource for FileFrameSource {
    fn bounds(&self) -> CaptureBounds {
        self.bounds
    }

    fn capture(&self, _bounds: &CaptureBounds) -> Option<Bytes> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        self.frames.get(i).cloned()
    }
}

// ── StaticFrameSource ─────────────────────────────────────────────────────────

/// Serves the same frame on every capture.
#[derive(Debug)]
pub struct StaticFrameSource {
    frame: Option<Bytes>,
    bounds: CaptureBounds,
    primary: Option<CaptureBounds>,
    captures: AtomicUsize,
}

impl StaticFrameSource {
    pub fn new(frame: impl Into<Bytes>, bounds: CaptureBounds) -> Self {
        Self {
            frame: Some(frame.into()),
            bounds,
            primary: None,
            captures: AtomicUsize::new(0),
        }
    }

    /// A source that never has a frame ready.
    pub fn empty(bounds: CaptureBounds) -> Self {
        Self {
            frame: None,
            ..Self::new(Bytes::new(), bounds)
        }
    }

    /// Sets what [`FrameSource::primary_bounds`] reports.
    pub fn with_primary(mut self, primary: CaptureBounds) -> Self {
        self.primary = Some(primary);
        self
    }

    /// How many times `capture` has been called.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::Relaxed)
    }
}

impl FrameSource for StaticFrameSource {
    fn bounds(&self) -> CaptureBounds {
        self.bounds
    }

    fn primary_bounds(&self) -> Option<CaptureBounds> {
        self.primary
    }

    fn capture(&self, _bounds: &CaptureBounds) -> Option<Bytes> {
        self.captures.fetch_add(1, Ordering::Relaxed);
        self.frame.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
