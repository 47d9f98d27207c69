//! Bundled [`InputSink`] implementations.
//!
//! OS-level injection (SendInput, XTest, CGEvent) lives outside this crate.
//! The binary wires in [`LoggingInputSink`]; tests use
//! [`recording::RecordingInputSink`].

pub mod recording;

use deskcast_core::Point;
use tracing::{debug, info};

use crate::application::ports::{InputError, InputSink};

pub use recording::{InputCall, RecordingInputSink};

/// Logs every input call instead of injecting it.
///
/// Pointer moves arrive up to ~33 times a second per viewer, so they are
/// logged at `debug`; buttons and keys at `info`.
#[derive(Debug, Default)]
pub struct LoggingInputSink;

impl InputSink for LoggingInputSink {
    fn move_to(&self, point: Point) -> Result<(), InputError> {
        debug!(x = point.x, y = point.y, "pointer move");
        Ok(())
    }

    fn button(&self, button: u8, down: bool) -> Result<(), InputError> {
        info!(button, down, "pointer button");
        Ok(())
    }

    fn key(&self, vk_code: u16, down: bool) -> Result<(), InputError> {
        info!(vk_code, down, "key");
        Ok(())
    }
}
