//! Per-connection handling: read one request, answer it, close.
//!
//! Every accepted socket gets its own task running [`handle_connection`].
//! The request head is read into a fixed 8 KiB buffer; a POST body of at
//! most 4 KiB is read after it.  Every route except `/stream` writes a
//! single `Connection: close` response and drops the socket.  `/stream`
//! hands the socket's write half to a [`StreamingSession`] and keeps the
//! task alive until the session is finished or the viewer hangs up.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use deskcast_core::protocol::http::{
    find_head_end, parse_request_head, ParsedRequest, ProtocolError, Response, HEAD_TERMINATOR,
    MAX_HEAD_BYTES,
};
use deskcast_core::protocol::mjpeg::stream_response_head;
use deskcast_core::CaptureBounds;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::{ClientRegistry, StreamingSession};
use crate::application::router::{
    bad_request_response, input_ack_response, not_found_response, preflight_response, route,
    viewer_page_response, Route,
};
use crate::application::InputDispatcher;

/// Why a request could not be read.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The bytes received are not a usable request; answered with 400.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The socket failed; nothing is answered.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

/// State shared by every connection task of one server run.
pub struct ConnectionContext {
    pub registry: Arc<ClientRegistry>,
    pub dispatcher: InputDispatcher,
    pub bounds: Arc<RwLock<CaptureBounds>>,
    pub request_timeout: Duration,
    pub body_timeout: Duration,
    /// Cancelled when the server stops.
    pub shutdown: CancellationToken,
}

// ── Request reading ───────────────────────────────────────────────────────────

/// Reads one request from `reader`.
///
/// Returns `Ok(None)` when the peer closes before sending a single byte.
/// The body, if any, gets `body_timeout` to arrive in full; a short or late
/// body is reported as absent rather than as an error.
///
/// # Errors
///
/// - [`ProtocolError::HeadTooLarge`] when 8 KiB arrive without a terminator.
/// - [`ProtocolError::Truncated`] when the peer closes mid-head.
/// - [`ProtocolError::MalformedRequestLine`] from the head parser.
/// - [`ReadError::Io`] on socket failure.
pub async fn read_request<R>(
    reader: &mut R,
    body_timeout: Duration,
) -> Result<Option<ParsedRequest>, ReadError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; MAX_HEAD_BYTES];
    let mut filled: usize = 0;

    let head_end = loop {
        if filled == buf.len() {
            return Err(ProtocolError::HeadTooLarge {
                limit: MAX_HEAD_BYTES,
            }
            .into());
        }
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::Truncated { received: filled }.into());
        }

        // A terminator may straddle the previous read and this one.
        let scan_from = filled.saturating_sub(HEAD_TERMINATOR.len() - 1);
        filled += n;
        if let Some(end) = find_head_end(&buf[scan_from..filled]) {
            break scan_from + end;
        }
    };

    let head = parse_request_head(&buf[..head_end])?;
    let body = match head.expected_body_len() {
        Some(len) => {
            let mut body = buf[head_end..filled].to_vec();
            body.truncate(len);
            match tokio::time::timeout(body_timeout, read_body(reader, &mut body, len)).await {
                Ok(Ok(true)) => Some(body),
                Ok(Ok(false)) | Ok(Err(_)) | Err(_) => {
                    debug!("incomplete body: {} of {len} bytes", body.len());
                    None
                }
            }
        }
        None => None,
    };
    Ok(Some(head.into_request(body)))
}

/// Tops `body` up to `len` bytes.  `Ok(false)` if the peer stops early.
async fn read_body<R>(reader: &mut R, body: &mut Vec<u8>, len: usize) -> io::Result<bool>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 1024];
    while body.len() < len {
        let want = (len - body.len()).min(chunk.len());
        let n = reader.read(&mut chunk[..want]).await?;
        if n == 0 {
            return Ok(false);
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Ok(true)
}

// ── Connection handling ───────────────────────────────────────────────────────

/// Serves one accepted connection to completion.
///
/// Never fails: errors are logged and the socket is dropped.
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, ctx: Arc<ConnectionContext>) {
    if let Err(e) = serve(stream, peer, &ctx).await {
        debug!("connection {peer} ended with error: {e}");
    }
}

async fn serve(mut stream: TcpStream, peer: SocketAddr, ctx: &ConnectionContext) -> io::Result<()> {
    let read = tokio::time::timeout(
        ctx.request_timeout,
        read_request(&mut stream, ctx.body_timeout),
    );
    let request = tokio::select! {
        _ = ctx.shutdown.cancelled() => return Ok(()),
        outcome = read => match outcome {
            Err(_) => {
                debug!("{peer} sent no complete request within {:?}", ctx.request_timeout);
                return Ok(());
            }
            Ok(Ok(Some(request))) => request,
            Ok(Ok(None)) => return Ok(()),
            Ok(Err(ReadError::Protocol(e))) => {
                debug!("bad request from {peer}: {e}");
                return respond(&mut stream, bad_request_response()).await;
            }
            Ok(Err(ReadError::Io(e))) => return Err(e),
        }
    };

    debug!("{peer} {} {}", request.method, request.path);
    match route(&request.method, &request.path) {
        Route::ViewerPage => respond(&mut stream, viewer_page_response()).await,
        Route::InputPreflight => respond(&mut stream, preflight_response()).await,
        Route::Input => {
            let bounds = *ctx.bounds.read();
            if let Err(e) = ctx.dispatcher.dispatch(request.body.as_deref(), &bounds) {
                debug!("input from {peer} ignored: {e}");
            }
            respond(&mut stream, input_ack_response()).await
        }
        Route::Stream => stream_to(stream, peer, ctx).await,
        Route::NotFound => respond(&mut stream, not_found_response()).await,
    }
}

async fn respond<W>(writer: &mut W, response: Response) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&response.to_bytes()).await?;
    writer.flush().await?;
    writer.shutdown().await
}

/// Runs one `/stream` session: OPEN → STREAMING → CLOSED.
async fn stream_to(stream: TcpStream, peer: SocketAddr, ctx: &ConnectionContext) -> io::Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    writer.write_all(&stream_response_head()).await?;
    writer.flush().await?;

    let session = StreamingSession::new(peer.to_string(), Box::new(writer), ctx.shutdown.child_token());
    if let Err(e) = ctx.registry.register(Arc::clone(&session)) {
        warn!("viewer {peer} not registered: {e}");
        return Ok(());
    }
    info!("viewer {peer} streaming ({} total)", ctx.registry.len());

    tokio::select! {
        _ = session.finished() => {}
        _ = wait_for_hangup(&mut reader) => debug!("viewer {peer} hung up"),
    }

    ctx.registry.release(&session);
    Ok(())
}

/// Resolves when the viewer closes or resets its end of the connection.
///
/// Anything the viewer sends on a stream connection is discarded.
async fn wait_for_hangup(reader: &mut OwnedReadHalf) {
    let mut scratch = [0u8; 256];
    loop {
        match reader.read(&mut scratch).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    const BODY_WAIT: Duration = Duration::from_millis(200);

    #[tokio::test]
    async fn test_get_request_in_one_read() {
        // Arrange
        let mut reader = Builder::new()
            .read(b"GET /display/?x=1 HTTP/1.1\r\nHost: h\r\n\r\n")
            .build();

        // Act
        let req = read_request(&mut reader, BODY_WAIT).await.unwrap().unwrap();

        // Assert
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/display");
        assert_eq!(req.body, None);
    }

    #[tokio::test]
    async fn test_minimal_request_parsed_while_peer_keeps_socket_open() {
        // Arrange: the peer never closes, so the head alone must end the read
        let (mut peer, mut server_side) = tokio::io::duplex(1024);
        peer.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

        // Act
        let req = tokio::time::timeout(
            Duration::from_secs(1),
            read_request(&mut server_side, BODY_WAIT),
        )
        .await
        .expect("head terminator must be found without waiting for EOF")
        .unwrap()
        .unwrap();

        // Assert
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/");
        drop(peer);
    }

    #[tokio::test]
    async fn test_terminator_split_across_reads() {
        let mut reader = Builder::new()
            .read(b"GET /stream HTTP/1.1\r\nHost: h\r")
            .read(b"\n\r")
            .read(b"\n")
            .build();

        let req = read_request(&mut reader, BODY_WAIT).await.unwrap().unwrap();

        assert_eq!(req.path, "/stream");
    }

    #[tokio::test]
    async fn test_post_body_arriving_after_head() {
        let body = br#"{"type":"move","x":0.5,"y":0.5}"#;
        let head = format!(
            "POST /input HTTP/1.1\r\ncontent-length: {}\r\n\r\n",
            body.len()
        );
        let mut reader = Builder::new()
            .read(head.as_bytes())
            .read(&body[..10])
            .read(&body[10..])
            .build();

        let req = read_request(&mut reader, BODY_WAIT).await.unwrap().unwrap();

        assert_eq!(req.body.as_deref(), Some(&body[..]));
    }

    #[tokio::test]
    async fn test_post_body_in_same_read_as_head() {
        let mut reader = Builder::new()
            .read(b"POST /input HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}")
            .build();

        let req = read_request(&mut reader, BODY_WAIT).await.unwrap().unwrap();

        assert_eq!(req.body.as_deref(), Some(&b"{}"[..]));
    }

    #[tokio::test]
    async fn test_short_body_is_treated_as_absent() {
        // Arrange: three of ten promised bytes, then EOF
        let mut reader = Builder::new()
            .read(b"POST /input HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc")
            .build();

        // Act
        let req = read_request(&mut reader, BODY_WAIT).await.unwrap().unwrap();

        // Assert
        assert_eq!(req.path, "/input");
        assert_eq!(req.body, None);
    }

    #[tokio::test]
    async fn test_oversized_body_is_not_read() {
        let mut reader = Builder::new()
            .read(b"POST /input HTTP/1.1\r\nContent-Length: 5000\r\n\r\n")
            .build();

        let req = read_request(&mut reader, BODY_WAIT).await.unwrap().unwrap();

        assert_eq!(req.content_length, 5000);
        assert_eq!(req.body, None);
    }

    #[tokio::test]
    async fn test_head_without_terminator_is_too_large() {
        let filler = vec![b'a'; MAX_HEAD_BYTES];
        let mut reader = Builder::new().read(&filler).build();

        let err = read_request(&mut reader, BODY_WAIT).await.unwrap_err();

        assert!(matches!(
            err,
            ReadError::Protocol(ProtocolError::HeadTooLarge { limit: MAX_HEAD_BYTES })
        ));
    }

    #[tokio::test]
    async fn test_eof_mid_head_is_truncated() {
        let mut reader = Builder::new().read(b"GET / HTTP/1.1\r\n").build();

        let err = read_request(&mut reader, BODY_WAIT).await.unwrap_err();

        assert!(matches!(
            err,
            ReadError::Protocol(ProtocolError::Truncated { received: 16 })
        ));
    }

    #[tokio::test]
    async fn test_immediate_eof_is_none() {
        let mut reader = Builder::new().build();

        let req = read_request(&mut reader, BODY_WAIT).await.unwrap();

        assert!(req.is_none());
    }

    #[tokio::test]
    async fn test_malformed_request_line() {
        let mut reader = Builder::new().read(b"GARBAGE\r\n\r\n").build();

        let err = read_request(&mut reader, BODY_WAIT).await.unwrap_err();

        assert!(matches!(
            err,
            ReadError::Protocol(ProtocolError::MalformedRequestLine)
        ));
    }

    #[tokio::test]
    async fn test_respond_writes_whole_response() {
        let expected = not_found_response().to_bytes();
        let mut writer = Builder::new().write(&expected).build();

        respond(&mut writer, not_found_response()).await.unwrap();
    }
}
