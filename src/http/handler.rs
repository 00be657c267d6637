//! Per-client HTTP request handling
//!
//! One invocation of [`handle_client`] serves one HTTP connection from
//! request line to completion. Handlers are generic over the transport so
//! tests can drive them with in-memory duplex streams.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};

use crate::context::AppContext;
use crate::error::{Error, Result};

use super::config::HttpConfig;
use super::MULTIPART_BOUNDARY;

/// Serve one HTTP client connection.
///
/// Reads a single GET request, routes on the path, and writes the
/// response. A transport error while streaming means the client went away;
/// it ends this handler and nothing else.
pub async fn handle_client<S>(stream: S, ctx: Arc<AppContext>, config: &HttpConfig) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufStream::new(stream);

    let path = match read_request(&mut stream).await {
        Ok(path) => path,
        Err(e @ Error::InvalidRequest(_)) => {
            // The client still gets an answer before the connection closes.
            write_response(&mut stream, 400, "Bad Request", "text/plain", b"400 Bad Request")
                .await?;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    match path.as_str() {
        "/" | "/index.html" => {
            let page = ctx.index_page().clone();
            write_response(&mut stream, 200, "OK", "text/html", &page).await
        }
        "/frame.jpg" => serve_frame(&mut stream, &ctx).await,
        "/stream.mjpg" => serve_stream(&mut stream, &ctx, config).await,
        _ => {
            write_response(&mut stream, 404, "Not Found", "text/plain", b"404 Not Found").await
        }
    }
}

/// Read the request line and discard headers. Returns the path with any
/// query string stripped.
async fn read_request<S>(stream: &mut BufStream<S>) -> Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request_line = String::new();
    stream.read_line(&mut request_line).await?;

    let mut parts = request_line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next()) {
        (Some(m), Some(t)) => (m, t),
        _ => return Err(Error::InvalidRequest(request_line.trim_end().to_string())),
    };

    if method != "GET" {
        return Err(Error::InvalidRequest(request_line.trim_end().to_string()));
    }

    let path = target.split('?').next().unwrap_or(target).to_string();

    // Discard headers up to the blank line.
    loop {
        let mut line = String::new();
        let n = stream.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    Ok(path)
}

/// Single still frame: current snapshot, no waiting.
async fn serve_frame<S>(stream: &mut BufStream<S>, ctx: &AppContext) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match ctx.frame().snapshot() {
        Some(frame) => write_frame_response(stream, &frame).await,
        None => {
            write_response(
                stream,
                503,
                "Service Unavailable",
                "text/plain",
                b"No frame available yet",
            )
            .await
        }
    }
}

/// Live multipart stream: one part per published frame, until the client
/// disconnects.
async fn serve_stream<S>(
    stream: &mut BufStream<S>,
    ctx: &AppContext,
    config: &HttpConfig,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let header = format!(
        "HTTP/1.1 200 OK\r\n\
         Age: 0\r\n\
         Cache-Control: no-cache, private\r\n\
         Pragma: no-cache\r\n\
         Content-Type: multipart/x-mixed-replace; boundary={}\r\n\
         \r\n",
        MULTIPART_BOUNDARY
    );
    stream.write_all(header.as_bytes()).await?;
    stream.flush().await?;

    let mut watcher = ctx.frame().watch();

    loop {
        let Some(frame) = watcher.next().await else {
            // The producing session is gone; end the stream.
            return Ok(());
        };

        if write_part(stream, &frame).await.is_err() {
            // Client disconnected; terminate quietly.
            tracing::debug!("Live-stream client disconnected");
            return Ok(());
        }

        if let Some(interval) = config.min_frame_interval {
            tokio::time::sleep(interval).await;
        }
    }
}

async fn write_part<S>(stream: &mut BufStream<S>, frame: &Bytes) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let part_header = format!(
        "--{}\r\n\
         Content-Type: image/jpeg\r\n\
         Content-Length: {}\r\n\
         \r\n",
        MULTIPART_BOUNDARY,
        frame.len()
    );
    stream.write_all(part_header.as_bytes()).await?;
    stream.write_all(frame).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await
}

async fn write_frame_response<S>(stream: &mut BufStream<S>, frame: &Bytes) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let header = format!(
        "HTTP/1.1 200 OK\r\n\
         Age: 0\r\n\
         Cache-Control: no-cache, private\r\n\
         Pragma: no-cache\r\n\
         Content-Type: image/jpeg\r\n\
         Content-Length: {}\r\n\
         \r\n",
        frame.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(frame).await?;
    stream.flush().await?;
    Ok(())
}

async fn write_response<S>(
    stream: &mut BufStream<S>,
    status: u16,
    reason: &str,
    content_type: &str,
    body: &[u8],
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let header = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         \r\n",
        status,
        reason,
        content_type,
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    Ok(())
}
