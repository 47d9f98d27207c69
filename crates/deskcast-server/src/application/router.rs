//! Exact-path request routing and the fixed responses that go with it.
//!
//! | Method  | Path                                   | Route              |
//! |---------|----------------------------------------|--------------------|
//! | any     | `""`, `/`, `/display`, `/index.html`   | `ViewerPage`       |
//! | OPTIONS | `/input`                               | `InputPreflight`   |
//! | POST    | `/input`                               | `Input`            |
//! | GET     | `/stream`                              | `Stream`           |
//! | *       | anything else                          | `NotFound`         |
//!
//! Paths arrive already normalized (no query, no trailing slash), so
//! `/display/` and `/display?x=1` both match `/display`.  Other methods on
//! `/input` get a 404 rather than a 405.

use deskcast_core::protocol::http::{Response, StatusCode};

use super::page::VIEWER_PAGE;

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ViewerPage,
    InputPreflight,
    Input,
    Stream,
    NotFound,
}

/// Maps a method and normalized path to a [`Route`].
///
/// Matching is exact and case-sensitive for both method and path.
pub fn route(method: &str, path: &str) -> Route {
    match (method, path) {
        (_, "" | "/" | "/display" | "/index.html") => Route::ViewerPage,
        ("OPTIONS", "/input") => Route::InputPreflight,
        ("POST", "/input") => Route::Input,
        ("GET", "/stream") => Route::Stream,
        _ => Route::NotFound,
    }
}

/// `200 text/html` with the viewer page.
pub fn viewer_page_response() -> Response {
    Response::new(StatusCode::Ok).with_body("text/html; charset=utf-8", VIEWER_PAGE.as_bytes())
}

/// `200` with an empty body and the CORS preflight headers.
pub fn preflight_response() -> Response {
    Response::new(StatusCode::Ok)
        .with_header("Access-Control-Allow-Origin", "*")
        .with_header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .with_header("Access-Control-Allow-Headers", "Content-Type")
}

/// `200 application/json {}`, sent for every input POST whatever its body.
pub fn input_ack_response() -> Response {
    Response::new(StatusCode::Ok)
        .with_body("application/json", b"{}")
        .with_header("Access-Control-Allow-Origin", "*")
}

pub fn not_found_response() -> Response {
    Response::plain(StatusCode::NotFound)
}

pub fn bad_request_response() -> Response {
    Response::plain(StatusCode::BadRequest)
}
