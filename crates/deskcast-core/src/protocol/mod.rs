//! Wire formats: HTTP request heads and fixed responses, MJPEG multipart
//! framing, and the JSON input-event protocol.

pub mod http;
pub mod input;
pub mod mjpeg;

pub use http::{
    find_head_end, normalize_path, parse_request_head, ParsedRequest, ProtocolError, RequestHead,
    Response, StatusCode,
};
pub use input::{decode_input_event, DecodeError, InputEvent};
