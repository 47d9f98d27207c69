//! # deskcast-core
//!
//! Shared library for deskcast containing the hand-rolled HTTP/1.1 request
//! parser, the MJPEG multipart framing, the browser input-event protocol, and
//! the capture-region geometry.
//!
//! This crate has zero dependencies on sockets, async runtimes, or OS APIs.
//! Everything here is a pure function over bytes or values, which keeps the
//! wire formats easy to test and benchmark in isolation.
//!
//! # Architecture overview
//!
//! deskcast turns a live image source into an MJPEG feed that any browser can
//! open, and lets the viewer drive the host's pointer and keyboard back over
//! plain HTTP POSTs.
//!
//! - **`protocol`** – How bytes travel over the wire: request heads, fixed
//!   responses, multipart frame parts, and the JSON input events.
//!
//! - **`domain`** – Capture geometry: the rectangle being streamed and the
//!   mapping from normalized viewer coordinates to absolute host pixels.

pub mod domain;
pub mod protocol;

pub use domain::geometry::{CaptureBounds, Point};
pub use protocol::http::{ProtocolError, RequestHead};
pub use protocol::input::{decode_input_event, DecodeError, InputEvent};
