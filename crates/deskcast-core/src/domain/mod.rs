//! Domain entities for deskcast.
//!
//! Pure value types with no I/O.  The only concept that lives here is the
//! capture region and how viewer-relative coordinates land inside it.

/// Capture-region geometry.
///
/// See [`geometry::CaptureBounds`] for the main type.
pub mod geometry;
