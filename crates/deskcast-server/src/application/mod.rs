//! Application layer for deskcast-server.
//!
//! Knows *what* to do with a request or an input event, and delegates *how*
//! to the infrastructure layer and the injected collaborators.
//!
//! # Responsibilities
//!
//! - Declaring the collaborator ports ([`ports::FrameSource`],
//!   [`ports::InputSink`]) and resolving the capture bounds
//! - Mapping `(method, path)` to a [`router::Route`]
//! - Decoding input events and driving the input sink
//! - Holding the viewer page
//!
//! # What does NOT belong here?
//!
//! - Sockets, timers, task spawning (infrastructure)
//! - Session bookkeeping (infrastructure registry)

pub mod input_dispatch;
pub mod page;
pub mod ports;
pub mod router;

pub use input_dispatch::{DispatchError, InputDispatcher};
pub use ports::{resolve_capture_bounds, FrameSource, InputError, InputSink};
pub use router::{route, Route};
