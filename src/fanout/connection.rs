//! Fan-out client connection

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Writable transport handle for one fan-out client.
///
/// Boxed so tests can substitute in-memory sinks for real sockets.
pub type ConnectionSink = Box<dyn AsyncWrite + Send + Unpin>;

/// One accepted fan-out client.
///
/// The connection is identified by its peer address while open. The closed
/// transition happens at most once, claimed by whichever event observes the
/// failure first (worker write error or broadcaster shutdown).
pub struct Connection {
    peer_addr: SocketAddr,
    sink: Mutex<ConnectionSink>,
    closed: AtomicBool,
}

impl Connection {
    /// Wrap an accepted transport
    pub fn new(peer_addr: SocketAddr, sink: ConnectionSink) -> Self {
        Self {
            peer_addr,
            sink: Mutex::new(sink),
            closed: AtomicBool::new(false),
        }
    }

    /// Remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Whether the connection has been marked closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Write the full payload to the sink.
    pub(crate) async fn write(&self, payload: &[u8]) -> io::Result<()> {
        let mut sink = self.sink.lock().await;
        sink.write_all(payload).await?;
        sink.flush().await
    }

    /// Claim the open -> closed transition.
    ///
    /// Returns `true` for exactly one caller; that caller is responsible
    /// for removing the connection from the registry and shutting the
    /// sink down.
    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Shut the sink down, swallowing secondary errors.
    pub(crate) async fn shutdown_sink(&self) {
        let mut sink = self.sink.lock().await;
        let _ = sink.shutdown().await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer_addr", &self.peer_addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}
