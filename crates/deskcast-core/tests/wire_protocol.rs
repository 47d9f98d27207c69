//! Integration tests for the deskcast-core wire formats.
//!
//! These go through the public API the server uses: find the head end in a
//! raw buffer, parse the head, pull the body, decode the input event, and
//! map it onto the capture bounds.

use deskcast_core::protocol::http::{
    find_head_end, parse_request_head, ProtocolError, Response, StatusCode, MAX_BODY_BYTES,
};
use deskcast_core::protocol::mjpeg::{part_header, stream_response_head};
use deskcast_core::{decode_input_event, CaptureBounds, InputEvent, Point};

/// Splits a raw request the way the connection reader does.
fn split_request(raw: &[u8]) -> (deskcast_core::RequestHead, Vec<u8>) {
    let end = find_head_end(raw).expect("request must contain a head terminator");
    let head = parse_request_head(&raw[..end]).expect("head must parse");
    (head, raw[end..].to_vec())
}

#[test]
fn test_post_move_maps_to_center_of_1080p() {
    // Arrange
    let body = br#"{"type":"move","x":0.5,"y":0.5}"#;
    let mut raw = format!(
        "POST /input HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(body);

    // Act
    let (head, rest) = split_request(&raw);
    let expected = head.expected_body_len().expect("POST with small body");
    let event = decode_input_event(&rest[..expected]).expect("valid event");

    // Assert
    let InputEvent::Move { x, y } = event else {
        panic!("expected a move event, got {event:?}");
    };
    let bounds = CaptureBounds::new(0, 0, 1920, 1080);
    assert_eq!(bounds.to_absolute(x, y), Point::new(960, 540));
}

#[test]
fn test_display_with_and_without_trailing_slash_normalize_identically() {
    let (a, _) = split_request(b"GET /display HTTP/1.1\r\n\r\n");
    let (b, _) = split_request(b"GET /display/ HTTP/1.1\r\n\r\n");
    assert_eq!(a.path, b.path);
}

#[test]
fn test_oversized_body_is_not_expected() {
    let raw = format!(
        "POST /input HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
        MAX_BODY_BYTES + 1
    );
    let (head, _) = split_request(raw.as_bytes());
    assert_eq!(head.expected_body_len(), None);
}

#[test]
fn test_request_line_garbage_is_protocol_error() {
    let err = parse_request_head(b"\x00\x01\x02\r\n\r\n").unwrap_err();
    assert_eq!(err, ProtocolError::MalformedRequestLine);
}

#[test]
fn test_bad_request_response_is_plain_text() {
    let text = String::from_utf8(Response::plain(StatusCode::BadRequest).to_bytes()).unwrap();
    assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(text.contains("Content-Type: text/plain\r\n"));
    assert!(text.ends_with("\r\n\r\nBad Request"));
}

#[test]
fn test_stream_head_and_part_header_agree_on_boundary() {
    let head = String::from_utf8(stream_response_head()).unwrap();
    let part = String::from_utf8(part_header(10)).unwrap();

    assert!(head.contains("boundary=frame"));
    assert!(part.starts_with("--frame\r\n"));
}
