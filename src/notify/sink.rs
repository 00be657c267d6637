//! Notification sinks

use std::future::Future;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// Destination of a dispatched notification.
///
/// Implementations perform one outbound call per `dispatch`. Failures are
/// logged and dropped by the notifier; a sink should not retry internally.
pub trait NotifySink: Send + Sync + 'static {
    /// Perform one outbound notification
    fn dispatch(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Sink that POSTs a fixed payload to an HTTP endpoint.
///
/// The request is a minimal HTTP/1.1 POST over a fresh TCP connection per
/// dispatch; the response is read and discarded. Target and payload are
/// opaque configuration.
#[derive(Debug, Clone)]
pub struct HttpPostSink {
    /// Target as `host:port`
    pub addr: String,
    /// Request path, e.g. `/`
    pub path: String,
    /// Request body
    pub payload: String,
}

impl HttpPostSink {
    /// Create a sink for `addr` (host:port), `path` and `payload`
    pub fn new(
        addr: impl Into<String>,
        path: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            addr: addr.into(),
            path: path.into(),
            payload: payload.into(),
        }
    }
}

impl NotifySink for HttpPostSink {
    async fn dispatch(&self) -> Result<()> {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| Error::Notify(format!("connect {}: {}", self.addr, e)))?;

        let request = format!(
            "POST {} HTTP/1.1\r\n\
             Host: {}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n\
             {}",
            self.path,
            self.addr,
            self.payload.len(),
            self.payload
        );

        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|e| Error::Notify(format!("send to {}: {}", self.addr, e)))?;

        // Drain whatever the peer answers; the call is fire-and-log.
        let mut response = Vec::new();
        let _ = stream.read_to_end(&mut response).await;

        tracing::debug!(target_addr = %self.addr, "Notification delivered");
        Ok(())
    }
}
