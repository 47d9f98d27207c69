//! JSON input events sent by the viewer page.
//!
//! The page POSTs one small JSON object per pointer or key event to `/input`.
//! A `"type"` field selects the variant; the remaining fields sit in the same
//! object:
//!
//! ```json
//! {"type":"move","x":0.25,"y":0.75}
//! {"type":"click","x":0.5,"y":0.5,"button":0,"down":true}
//! {"type":"key","keyCode":65,"down":false}
//! ```
//!
//! Pointer coordinates are normalized to the displayed image (`0.0` = left or
//! top edge, `1.0` = right or bottom edge).  They are *not* range-checked
//! here; clamping happens when they are mapped onto the capture bounds.
//!
//! Decoding is strict about presence and type (`button` and `keyCode` must be
//! integers, `down` must be a boolean) and lenient about extra fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A decoded viewer input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputEvent {
    /// Pointer moved.
    Move { x: f64, y: f64 },

    /// Pointer button pressed or released at a position.
    Click {
        x: f64,
        y: f64,
        /// DOM `MouseEvent.button`: 0 = left, 1 = middle, 2 = right.
        button: u8,
        down: bool,
    },

    /// Key pressed or released.
    Key {
        /// DOM `KeyboardEvent.keyCode`, which matches the Windows
        /// virtual-key code for the keys a browser reports.
        #[serde(rename = "keyCode")]
        key_code: u16,
        down: bool,
    },
}

impl InputEvent {
    /// Short variant name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            InputEvent::Move { .. } => "move",
            InputEvent::Click { .. } => "click",
            InputEvent::Key { .. } => "key",
        }
    }
}

/// Why a POST body could not be turned into an [`InputEvent`].
///
/// Decode errors are never reported to the viewer; the request still
/// answers `200 {}`.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The request carried no usable body.
    #[error("input request has no body")]
    MissingBody,

    /// The body was not JSON, had an unknown `type`, or lacked a field.
    #[error("invalid input event: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Decodes one input event from a POST body.
///
/// # Errors
///
/// Returns [`DecodeError::Invalid`] for malformed JSON, an unknown or missing
/// `type`, or a missing or mistyped required field.
///
/// # Example
///
/// ```rust
/// use deskcast_core::protocol::input::{decode_input_event, InputEvent};
///
/// let ev = decode_input_event(br#"{"type":"move","x":0.5,"y":0.5}"#).unwrap();
/// assert_eq!(ev, InputEvent::Move { x: 0.5, y: 0.5 });
/// ```
pub fn decode_input_event(body: &[u8]) -> Result<InputEvent, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}
