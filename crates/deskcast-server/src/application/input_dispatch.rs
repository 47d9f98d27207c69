//! InputDispatcher: turns a POST `/input` body into input-sink calls.
//!
//! ```text
//! body ──decode──▶ InputEvent ──map onto bounds──▶ InputSink
//!                     move   → move_to(p)
//!                     click  → move_to(p), button(b, down)
//!                     key    → key(code, down)
//! ```
//!
//! Delivery is best-effort.  The caller answers `200 {}` no matter what this
//! returns; the error only feeds a log line.

use std::sync::Arc;

use deskcast_core::{decode_input_event, CaptureBounds, DecodeError, InputEvent};
use thiserror::Error;

use super::ports::{InputError, InputSink};

/// Why an input request had no effect (or only a partial one).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("input sink rejected {kind} event: {source}")]
    Sink {
        kind: &'static str,
        #[source]
        source: InputError,
    },
}

/// Applies decoded viewer input to the host through an [`InputSink`].
#[derive(Clone)]
pub struct InputDispatcher {
    sink: Arc<dyn InputSink>,
}

impl InputDispatcher {
    pub fn new(sink: Arc<dyn InputSink>) -> Self {
        Self { sink }
    }

    /// Decodes `body` and applies it against `bounds`.
    ///
    /// Returns the applied event on success.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Decode`] when the body is missing or invalid; no sink
    /// method is called in that case.  [`DispatchError::Sink`] when the sink
    /// fails part-way.
    pub fn dispatch(
        &self,
        body: Option<&[u8]>,
        bounds: &CaptureBounds,
    ) -> Result<InputEvent, DispatchError> {
        let body = body.ok_or(DecodeError::MissingBody)?;
        let event = decode_input_event(body)?;
        self.apply(&event, bounds)
            .map_err(|source| DispatchError::Sink {
                kind: event.kind(),
                source,
            })?;
        Ok(event)
    }

    /// Applies an already decoded event.
    ///
    /// # Errors
    ///
    /// Propagates the first sink failure.  For a click, a failed move means
    /// the button is not pressed.
    pub fn apply(&self, event: &InputEvent, bounds: &CaptureBounds) -> Result<(), InputError> {
        match *event {
            InputEvent::Move { x, y } => self.sink.move_to(bounds.to_absolute(x, y)),
            InputEvent::Click { x, y, button, down } => {
                self.sink.move_to(bounds.to_absolute(x, y))?;
                self.sink.button(button, down)
            }
            InputEvent::Key { key_code, down } => self.sink.key(key_code, down),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use deskcast_core::Point;
    use mockall::{mock, predicate::eq, Sequence};

    mock! {
        pub Sink {}

        impl InputSink for Sink {
            fn move_to(&self, point: Point) -> Result<(), InputError>;
            fn button(&self, button: u8, down: bool) -> Result<(), InputError>;
            fn key(&self, vk_code: u16, down: bool) -> Result<(), InputError>;
        }
    }

    fn hd() -> CaptureBounds {
        CaptureBounds::new(0, 0, 1920, 1080)
    }

    fn dispatcher(sink: MockSink) -> InputDispatcher {
        InputDispatcher::new(Arc::new(sink))
    }

    #[test]
    fn test_move_calls_move_to_once_with_scaled_point() {
        // Arrange
        let mut sink = MockSink::new();
        sink.expect_move_to()
            .with(eq(Point::new(960, 540)))
            .times(1)
            .returning(|_| Ok(()));
        sink.expect_button().never();
        sink.expect_key().never();

        // Act
        let result = dispatcher(sink).dispatch(Some(br#"{"type":"move","x":0.5,"y":0.5}"#), &hd());

        // Assert
        assert!(matches!(result, Ok(InputEvent::Move { .. })));
    }

    #[test]
    fn test_move_outside_unit_square_is_clamped() {
        let mut sink = MockSink::new();
        sink.expect_move_to()
            .with(eq(Point::new(1920, 0)))
            .times(1)
            .returning(|_| Ok(()));

        dispatcher(sink)
            .dispatch(Some(br#"{"type":"move","x":1.7,"y":-0.3}"#), &hd())
            .unwrap();
    }

    #[test]
    fn test_click_moves_then_presses_button() {
        // Arrange: order matters – the button must land where the pointer is
        let mut seq = Sequence::new();
        let mut sink = MockSink::new();
        sink.expect_move_to()
            .with(eq(Point::new(100 + 480, 50 + 270)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sink.expect_button()
            .with(eq(2u8), eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let bounds = CaptureBounds::new(100, 50, 1920, 1080);

        // Act
        let body = br#"{"type":"click","x":0.25,"y":0.25,"button":2,"down":true}"#;
        let result = dispatcher(sink).dispatch(Some(body), &bounds);

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_key_does_not_touch_pointer() {
        let mut sink = MockSink::new();
        sink.expect_move_to().never();
        sink.expect_button().never();
        sink.expect_key()
            .with(eq(65u16), eq(false))
            .times(1)
            .returning(|_, _| Ok(()));

        dispatcher(sink)
            .dispatch(Some(br#"{"type":"key","keyCode":65,"down":false}"#), &hd())
            .unwrap();
    }

    #[test]
    fn test_invalid_json_makes_no_sink_calls() {
        let mut sink = MockSink::new();
        sink.expect_move_to().never();
        sink.expect_button().never();
        sink.expect_key().never();

        let result = dispatcher(sink).dispatch(Some(b"{oops"), &hd());

        assert!(matches!(result, Err(DispatchError::Decode(DecodeError::Invalid(_)))));
    }

    #[test]
    fn test_missing_field_makes_no_sink_calls() {
        let mut sink = MockSink::new();
        sink.expect_move_to().never();
        sink.expect_button().never();

        let result = dispatcher(sink).dispatch(Some(br#"{"type":"click","x":0.5,"y":0.5}"#), &hd());

        assert!(matches!(result, Err(DispatchError::Decode(_))));
    }

    #[test]
    fn test_missing_body_is_decode_error() {
        let mut sink = MockSink::new();
        sink.expect_move_to().never();

        let result = dispatcher(sink).dispatch(None, &hd());

        assert!(matches!(
            result,
            Err(DispatchError::Decode(DecodeError::MissingBody))
        ));
    }

    #[test]
    fn test_failed_move_skips_button_on_click() {
        let mut sink = MockSink::new();
        sink.expect_move_to()
            .times(1)
            .returning(|_| Err(InputError::Platform("display gone".into())));
        sink.expect_button().never();

        let body = br#"{"type":"click","x":0.5,"y":0.5,"button":0,"down":true}"#;
        let result = dispatcher(sink).dispatch(Some(body), &hd());

        assert!(matches!(
            result,
            Err(DispatchError::Sink { kind: "click", .. })
        ));
    }
}
