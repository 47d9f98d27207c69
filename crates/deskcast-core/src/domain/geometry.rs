//! Capture-region geometry.
//!
//! Viewers report pointer positions as *normalized* coordinates: fractions in
//! `[0, 1]` of the displayed image's width and height.  The host needs
//! absolute pixel positions.  [`CaptureBounds::to_absolute`] performs that
//! mapping against the rectangle currently being captured.
//!
//! ```text
//!  origin (x, y)
//!     ┌──────────────── width ───────────────┐
//!     │                                      │
//!     │        (0.5, 0.5) → (x + w/2, y + h/2)
//!   height                                   │
//!     │                                      │
//!     └──────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// An absolute position on the host's desktop, in pixels.
///
/// Coordinates may be negative on multi-monitor hosts where a secondary
/// display sits left of or above the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The rectangle of the host desktop being captured and streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureBounds {
    /// X coordinate of the top-left corner (may be negative).
    pub x: i32,
    /// Y coordinate of the top-left corner (may be negative).
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CaptureBounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` when the rectangle has no area and cannot be captured
    /// or used to place the pointer.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Maps a normalized viewer position to an absolute host pixel.
    ///
    /// Both components are clamped to `[0, 1]` first; non-finite values count
    /// as `0`.  The result is `origin + round(norm * size)`, so `(1.0, 1.0)`
    /// lands on the exclusive bottom-right corner exactly as the browser
    /// reports it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use deskcast_core::{CaptureBounds, Point};
    ///
    /// let bounds = CaptureBounds::new(0, 0, 1920, 1080);
    /// assert_eq!(bounds.to_absolute(0.5, 0.5), Point::new(960, 540));
    /// ```
    pub fn to_absolute(&self, norm_x: f64, norm_y: f64) -> Point {
        let nx = clamp_unit(norm_x);
        let ny = clamp_unit(norm_y);
        let dx = (nx * f64::from(self.width)).round() as i64;
        let dy = (ny * f64::from(self.height)).round() as i64;
        Point {
            x: saturate(i64::from(self.x) + dx),
            y: saturate(i64::from(self.y) + dy),
        }
    }
}

impl Default for CaptureBounds {
    /// A single 1080p display at the desktop origin.
    fn default() -> Self {
        Self::new(0, 0, 1920, 1080)
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

// ── Tests ─────────────────────────────────────────────────────────────────────
