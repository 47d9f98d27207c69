//! Collaborator ports: where frames come from and where input goes.
//!
//! The pixel-capture backend and the input-delivery backend live outside this
//! crate.  The server only sees them through these two traits, injected at
//! construction time as `Arc<dyn ...>`.  The bundled implementations live in
//! `infrastructure::frame_source` and `infrastructure::input_sink`.

use bytes::Bytes;
use deskcast_core::{CaptureBounds, Point};
use thiserror::Error;

/// Error type for input-delivery operations.
#[derive(Debug, Error)]
pub enum InputError {
    /// The OS call to inject the event failed.
    #[error("platform error: {0}")]
    Platform(String),

    /// The backend is not available in this session (no display, no
    /// permission, ...).
    #[error("input backend unavailable: {0}")]
    Unavailable(String),
}

/// Produces encoded images of a screen region on demand.
///
/// `capture` may block (screen grabs and JPEG encoding are CPU-bound), so
/// the server calls it from a blocking-friendly thread.
pub trait FrameSource: Send + Sync {
    /// The region currently selected for capture.
    fn bounds(&self) -> CaptureBounds;

    /// The first available display, used when [`FrameSource::bounds`] is
    /// degenerate.  `None` when the source has no such notion.
    fn primary_bounds(&self) -> Option<CaptureBounds> {
        None
    }

    /// Captures and encodes one JPEG of `bounds`.
    ///
    /// Returns `None` when no frame is available right now.  An empty buffer
    /// is treated the same way.
    fn capture(&self, bounds: &CaptureBounds) -> Option<Bytes>;
}

/// Moves the host pointer and presses host keys.
pub trait InputSink: Send + Sync {
    /// Moves the pointer to an absolute desktop position.
    fn move_to(&self, point: Point) -> Result<(), InputError>;

    /// Presses (`down = true`) or releases a pointer button at the current
    /// position.  `button` uses DOM numbering: 0 left, 1 middle, 2 right.
    fn button(&self, button: u8, down: bool) -> Result<(), InputError>;

    /// Presses or releases a key identified by its virtual-key code.
    fn key(&self, vk_code: u16, down: bool) -> Result<(), InputError>;
}

/// Picks the bounds the server will capture and map input onto.
///
/// Order of preference: the source's selected region, then its primary
/// display, then `fallback`.  Degenerate rectangles are skipped.
pub fn resolve_capture_bounds(source: &dyn FrameSource, fallback: CaptureBounds) -> CaptureBounds {
    let selected = source.bounds();
    if !selected.is_degenerate() {
        return selected;
    }
    match source.primary_bounds() {
        Some(primary) if !primary.is_degenerate() => primary,
        _ => fallback,
    }
}
