//! MJPEG over `multipart/x-mixed-replace`.
//!
//! A stream response is one HTTP head followed by an unbounded sequence of
//! parts.  Each part replaces the previous image in the browser:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: <N>\r\n
//! \r\n
//! <N bytes of JPEG>\r\n
//! ```
//!
//! The stream head deliberately has no `Content-Length`; the body ends only
//! when the connection closes.

/// Multipart boundary token (without the leading `--`).
pub const BOUNDARY: &str = "frame";

/// `Content-Type` of the stream response.
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Bytes written after every frame body.
pub const PART_TRAILER: &[u8] = b"\r\n";

/// The response head that opens a streaming session.
pub fn stream_response_head() -> Vec<u8> {
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {STREAM_CONTENT_TYPE}\r\n\
         Cache-Control: no-cache, no-store, must-revalidate\r\n\
         Pragma: no-cache\r\n\
         Connection: keep-alive\r\n\r\n"
    )
    .into_bytes()
}

/// The per-part header for a frame of `len` bytes.
///
/// Identical for every session receiving the same frame; only
/// `Content-Length` depends on the frame.
pub fn part_header(len: usize) -> Vec<u8> {
    format!("--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {len}\r\n\r\n")
        .into_bytes()
}

/// Encodes one complete part: header, frame bytes, trailer.
pub fn encode_part(frame: &[u8]) -> Vec<u8> {
    let mut out = part_header(frame.len());
    out.reserve(frame.len() + PART_TRAILER.len());
    out.extend_from_slice(frame);
    out.extend_from_slice(PART_TRAILER);
    out
}
