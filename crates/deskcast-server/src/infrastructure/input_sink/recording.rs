//! An input sink that records calls instead of performing them.
//!
//! Every call is pushed onto one `Mutex<Vec<InputCall>>`, so a test can
//! assert both what was delivered and in which order (a click is a move
//! followed by a button).
//!
//! ```ignore
//! let sink = Arc::new(RecordingInputSink::new());
//! let (mut server, _events) = Server::new(config, frames, Arc::clone(&sink) as Arc<dyn InputSink>);
//! // ... POST /input ...
//! assert_eq!(sink.calls(), vec![InputCall::MoveTo(Point::new(960, 540))]);
//! ```
//!
//! Set `should_fail` to make every call return [`InputError::Platform`].

use deskcast_core::Point;
use parking_lot::Mutex;

use crate::application::ports::{InputError, InputSink};

/// One recorded sink call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCall {
    MoveTo(Point),
    Button { button: u8, down: bool },
    Key { vk_code: u16, down: bool },
}

#[derive(Debug, Default)]
pub struct RecordingInputSink {
    /// Calls in arrival order.
    pub calls: Mutex<Vec<InputCall>>,
    /// When `true`, every method fails without recording anything.
    pub should_fail: bool,
}

impl RecordingInputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// A copy of the calls recorded so far.
    pub fn calls(&self) -> Vec<InputCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: InputCall) -> Result<(), InputError> {
        if self.should_fail {
            return Err(InputError::Platform("recording sink set to fail".into()));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

impl InputSink for RecordingInputSink {
    fn move_to(&self, point: Point) -> Result<(), InputError> {
        self.record(InputCall::MoveTo(point))
    }

    fn button(&self, button: u8, down: bool) -> Result<(), InputError> {
        self.record(InputCall::Button { button, down })
    }

    fn key(&self, vk_code: u16, down: bool) -> Result<(), InputError> {
        self.record(InputCall::Key { vk_code, down })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let sink = RecordingInputSink::new();

        sink.move_to(Point::new(5, 6)).unwrap();
        sink.button(0, true).unwrap();
        sink.key(13, true).unwrap();

        assert_eq!(
            sink.calls(),
            vec![
                InputCall::MoveTo(Point::new(5, 6)),
                InputCall::Button { button: 0, down: true },
                InputCall::Key { vk_code: 13, down: true },
            ]
        );
    }

    #[test]
    fn test_failing_sink_records_nothing() {
        let sink = RecordingInputSink::failing();

        assert!(matches!(sink.move_to(Point::new(0, 0)), Err(InputError::Platform(_))));
        assert!(sink.calls().is_empty());
    }
}
