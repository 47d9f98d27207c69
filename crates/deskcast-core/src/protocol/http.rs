//! Minimal HTTP/1.1 request-head parsing and response encoding.
//!
//! deskcast speaks just enough HTTP for a browser to load one page, open one
//! long-lived MJPEG stream, and POST small JSON bodies.  There is no chunked
//! transfer, no keep-alive reuse for ordinary responses, and only one request
//! header is ever inspected (`Content-Length`).
//!
//! Wire format of a request head:
//! ```text
//! METHOD SP TARGET [SP VERSION] CRLF
//! *(header CRLF)
//! CRLF
//! ```
//!
//! The head must fit in [`MAX_HEAD_BYTES`].  POST bodies are only buffered up
//! to [`MAX_BODY_BYTES`]; anything larger is ignored.
//!
//! The socket-reading half of the parser lives in the server crate.  The
//! functions here operate on bytes that have already been buffered.

use std::fmt::Write as _;

use thiserror::Error;

/// Capacity of the request-head buffer.
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Largest POST body that is buffered and handed to a handler.
pub const MAX_BODY_BYTES: usize = 4096;

/// The blank line that separates the head from the body.
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Errors raised while reading or parsing a request head.
///
/// Every variant maps to a `400 Bad Request` response (or a silent close
/// when the peer is already gone).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer filled up before the head terminator was seen.
    #[error("request head exceeds {limit} bytes without a terminator")]
    HeadTooLarge { limit: usize },

    /// The peer stopped sending before the head terminator was seen.
    #[error("connection closed after {received} bytes, before the request head was complete")]
    Truncated { received: usize },

    /// The request line has no method or no target.
    #[error("malformed request line")]
    MalformedRequestLine,
}

/// The parts of a request head the router cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// Request method exactly as sent, e.g. `"GET"`.
    pub method: String,
    /// Normalized path: no query string, no trailing slash (except `/`).
    pub path: String,
    /// Value of the `Content-Length` header, or `0` when absent or invalid.
    pub content_length: usize,
}

impl RequestHead {
    /// Returns the number of body bytes worth buffering for this request.
    ///
    /// Only POST requests with `0 < Content-Length <= MAX_BODY_BYTES` carry a
    /// body deskcast will read.
    pub fn expected_body_len(&self) -> Option<usize> {
        if self.method == "POST" && self.content_length > 0 && self.content_length <= MAX_BODY_BYTES
        {
            Some(self.content_length)
        } else {
            None
        }
    }

    /// Attaches an optional body, producing the immutable request value.
    pub fn into_request(self, body: Option<Vec<u8>>) -> ParsedRequest {
        ParsedRequest {
            method: self.method,
            path: self.path,
            content_length: self.content_length,
            body,
        }
    }
}

/// A fully read request: head plus an optional, complete body.
///
/// `body` is `None` when the request had no body, the body exceeded
/// [`MAX_BODY_BYTES`], or the connection ended before the body was complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub method: String,
    pub path: String,
    pub content_length: usize,
    pub body: Option<Vec<u8>>,
}

/// Returns the index just past the `\r\n\r\n` terminator, if present.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
        .map(|i| i + HEAD_TERMINATOR.len())
}

/// Parses a buffered request head.
///
/// `head` may include the terminator and any number of header lines.  Only
/// the request line and `Content-Length` are interpreted.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedRequestLine`] when the first line has no
/// method, no target, or is not valid UTF-8.
///
/// # Example
///
/// ```rust
/// use deskcast_core::protocol::parse_request_head;
///
/// let head = parse_request_head(b"GET /display/?x=1 HTTP/1.1\r\n\r\n").unwrap();
/// assert_eq!(head.method, "GET");
/// assert_eq!(head.path, "/display");
/// ```
pub fn parse_request_head(head: &[u8]) -> Result<RequestHead, ProtocolError> {
    let line_end = head
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(head.len());
    let line =
        std::str::from_utf8(&head[..line_end]).map_err(|_| ProtocolError::MalformedRequestLine)?;

    let mut parts = line.split(' ');
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    if method.is_empty() || target.is_empty() {
        return Err(ProtocolError::MalformedRequestLine);
    }

    Ok(RequestHead {
        method: method.to_string(),
        path: normalize_path(target),
        content_length: parse_content_length(&head[line_end..]),
    })
}

/// Strips the query string and one trailing slash.  `/` stays `/`.
pub fn normalize_path(target: &str) -> String {
    let path = target.split('?').next().unwrap_or_default();
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => path.to_string(),
    }
}

/// Scans header lines for `Content-Length`, matching the name
/// case-insensitively.  Missing or unparsable values count as `0`.
fn parse_content_length(headers: &[u8]) -> usize {
    headers
        .split(|&b| b == b'\n')
        .filter_map(|line| {
            let line = std::str::from_utf8(line).ok()?;
            let (name, value) = line.split_once(':')?;
            if !name.trim().eq_ignore_ascii_case("content-length") {
                return None;
            }
            value.trim().parse().ok()
        })
        .next()
        .unwrap_or(0)
}

// ── Responses ─────────────────────────────────────────────────────────────────

/// The handful of statuses deskcast ever sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    BadRequest,
    NotFound,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// A complete, non-streaming response.
///
/// Always serialized with `Content-Length` and `Connection: close`; the
/// connection is closed after it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Vec<u8>,
}

impl Response {
    /// An empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A `text/plain` response whose body is the status reason phrase.
    pub fn plain(status: StatusCode) -> Self {
        Self::new(status).with_body("text/plain", status.reason().as_bytes())
    }

    pub fn with_body(mut self, content_type: &'static str, body: &[u8]) -> Self {
        self.content_type = Some(content_type);
        self.body = body.to_vec();
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Serializes the status line, headers, blank line and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = String::with_capacity(128);
        // Writing into a String cannot fail.
        let _ = write!(
            head,
            "HTTP/1.1 {} {}\r\n",
            self.status.code(),
            self.status.reason()
        );
        if let Some(ct) = self.content_type {
            let _ = write!(head, "Content-Type: {ct}\r\n");
        }
        let _ = write!(head, "Content-Length: {}\r\n", self.body.len());
        for (name, value) in &self.headers {
            let _ = write!(head, "{name}: {value}\r\n");
        }
        head.push_str("Connection: close\r\n\r\n");

        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
