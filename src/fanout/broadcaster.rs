//! Fan-out broadcaster
//!
//! Owns the ingestion listener, the connection registry, and the worker
//! pool. See the module docs in [`crate::fanout`] for the data flow.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::error::Result;

use super::config::FanoutConfig;
use super::connection::Connection;
use super::registry::ConnectionRegistry;
use super::stats::{FanoutStats, FanoutStatsSnapshot};
use super::worker::{run_worker, RoundGate, SharedQueue, WorkItem};

/// TCP fan-out broadcaster
///
/// Accepts an unbounded number of plain-TCP clients and replicates every
/// chunk passed to [`write`](Self::write) to all of them, from the moment
/// of acceptance onward. There is no handshake and no backfill of prior
/// data to late joiners.
pub struct FanoutBroadcaster {
    registry: Arc<ConnectionRegistry>,
    queue_tx: mpsc::Sender<WorkItem>,
    workers: Vec<JoinHandle<()>>,
    accept_handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    stats: Arc<FanoutStats>,
    local_addr: SocketAddr,
}

impl FanoutBroadcaster {
    /// Bind the ingestion listener and start the accept task and worker
    /// pool.
    ///
    /// A listener bind failure aborts startup; no partial broadcaster is
    /// left running.
    pub async fn bind(config: FanoutConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let registry = Arc::new(ConnectionRegistry::new());
        let stats = Arc::new(FanoutStats::new());

        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity);
        let queue_rx: SharedQueue = Arc::new(Mutex::new(queue_rx));

        let workers = (0..config.worker_count)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    Arc::clone(&queue_rx),
                    Arc::clone(&registry),
                    Arc::clone(&stats),
                ))
            })
            .collect();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let accept_handle = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&registry),
            Arc::clone(&stats),
            shutdown_rx,
            config.tcp_nodelay,
        ));

        tracing::info!(
            addr = %local_addr,
            workers = config.worker_count,
            "Fan-out broadcaster listening"
        );

        Ok(Self {
            registry,
            queue_tx,
            workers,
            accept_handle,
            shutdown_tx,
            stats,
            local_addr,
        })
    }

    /// Address the listener actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently-open connections
    pub async fn connection_count(&self) -> usize {
        self.registry.len().await
    }

    /// Lifetime counters
    pub fn stats(&self) -> FanoutStatsSnapshot {
        self.stats.snapshot()
    }

    /// Replicate one chunk to every connection open at call time.
    ///
    /// Blocks until delivery has been attempted on each snapshotted
    /// connection (the backpressure barrier). Connections accepted after
    /// the snapshot do not receive this chunk. Per-connection write
    /// failures are handled by the workers and never surface here.
    ///
    /// Returns the number of bytes consumed, always `chunk.len()`.
    pub async fn write(&self, chunk: Bytes) -> usize {
        let len = chunk.len();
        let conns = self.registry.snapshot().await;
        self.stats.record_chunk();

        if conns.is_empty() {
            return len;
        }

        let gate = Arc::new(RoundGate::new(conns.len()));
        for conn in conns {
            let item = WorkItem::Data {
                conn,
                payload: chunk.clone(),
                gate: Arc::clone(&gate),
            };
            if self.queue_tx.send(item).await.is_err() {
                // Workers gone (close raced with write); count the item as
                // processed so the round still terminates.
                gate.complete();
            }
        }

        gate.wait().await;
        len
    }

    /// Shut the broadcaster down.
    ///
    /// Stops the accept task (which closes all remaining connections),
    /// then terminates the worker pool with one poison pill per worker
    /// and joins every task.
    pub async fn close(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.accept_handle.await;

        for _ in 0..self.workers.len() {
            let _ = self.queue_tx.send(WorkItem::PoisonPill).await;
        }
        for worker in self.workers {
            let _ = worker.await;
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            connections = stats.connections_accepted,
            chunks = stats.chunks_broadcast,
            bytes = stats.bytes_sent,
            failures = stats.write_failures,
            "Fan-out broadcaster closed"
        );
    }

    /// Register a connection directly, bypassing the listener.
    #[cfg(test)]
    pub(crate) async fn add_connection(&self, conn: Connection) {
        self.registry.insert(Arc::new(conn)).await;
    }
}

async fn accept_loop(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<FanoutStats>,
    mut shutdown_rx: watch::Receiver<bool>,
    tcp_nodelay: bool,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((socket, peer_addr)) => {
                    configure_socket(&socket, tcp_nodelay);
                    registry
                        .insert(Arc::new(Connection::new(peer_addr, Box::new(socket))))
                        .await;
                    stats.record_accept();
                    tracing::info!(peer = %peer_addr, "Fan-out client accepted");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept fan-out client");
                }
            },
        }
    }

    // Connections still open at shutdown are closed here.
    for conn in registry.drain().await {
        if conn.mark_closed() {
            conn.shutdown_sink().await;
        }
    }

    tracing::debug!("Fan-out accept loop stopped");
}

fn configure_socket(socket: &TcpStream, tcp_nodelay: bool) {
    if tcp_nodelay {
        if let Err(e) = socket.set_nodelay(true) {
            tracing::warn!(error = %e, "Failed to set TCP_NODELAY");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWrite};
    use tokio::net::TcpStream;

    async fn bind_local(workers: usize) -> FanoutBroadcaster {
        let config = FanoutConfig::default()
            .bind("127.0.0.1:0".parse().unwrap())
            .worker_count(workers);
        FanoutBroadcaster::bind(config).await.unwrap()
    }

    async fn connect_client(broadcaster: &FanoutBroadcaster) -> TcpStream {
        let client = TcpStream::connect(broadcaster.local_addr()).await.unwrap();
        // Wait for the accept task to register the connection.
        for _ in 0..100 {
            if broadcaster.connection_count().await > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        client
    }

    async fn read_exact_timeout(stream: &mut TcpStream, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        tokio::time::timeout(Duration::from_secs(2), stream.read_exact(&mut buf))
            .await
            .unwrap()
            .unwrap();
        buf
    }

    /// Sink that fails every write
    struct FailingSink;

    impl AsyncWrite for FailingSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Sink that records written bytes into a shared buffer
    struct RecordingSink(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl AsyncWrite for RecordingSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_sequential_chunks_reach_every_client() {
        let broadcaster = bind_local(4).await;

        let mut c1 = connect_client(&broadcaster).await;
        let mut c2 = connect_client(&broadcaster).await;
        let mut c3 = connect_client(&broadcaster).await;

        for _ in 0..100 {
            if broadcaster.connection_count().await == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        for chunk in [&b"A"[..], b"B", b"C"] {
            assert_eq!(broadcaster.write(Bytes::copy_from_slice(chunk)).await, 1);
        }

        for client in [&mut c1, &mut c2, &mut c3] {
            assert_eq!(read_exact_timeout(client, 3).await, b"ABC");
        }

        broadcaster.close().await;
    }

    #[tokio::test]
    async fn test_mid_sequence_disconnect_leaves_others_unaffected() {
        let broadcaster = bind_local(2).await;

        let mut c1 = connect_client(&broadcaster).await;
        let c2 = connect_client(&broadcaster).await;
        let mut c3 = connect_client(&broadcaster).await;

        for _ in 0..100 {
            if broadcaster.connection_count().await == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        broadcaster.write(Bytes::from_static(b"A")).await;

        // Client 2 goes away; its removal happens on the next failed write.
        drop(c2);

        // The peer may need more than one chunk for the failure to become
        // visible to the writer side.
        broadcaster.write(Bytes::from_static(b"B")).await;
        broadcaster.write(Bytes::from_static(b"C")).await;

        assert_eq!(read_exact_timeout(&mut c1, 3).await, b"ABC");
        assert_eq!(read_exact_timeout(&mut c3, 3).await, b"ABC");

        broadcaster.close().await;
    }

    #[tokio::test]
    async fn test_failing_connection_removed_exactly_once() {
        let broadcaster = bind_local(2).await;

        let received = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        broadcaster
            .add_connection(Connection::new(
                "127.0.0.1:50001".parse().unwrap(),
                Box::new(RecordingSink(std::sync::Arc::clone(&received))),
            ))
            .await;
        broadcaster
            .add_connection(Connection::new(
                "127.0.0.1:50002".parse().unwrap(),
                Box::new(FailingSink),
            ))
            .await;
        assert_eq!(broadcaster.connection_count().await, 2);

        broadcaster.write(Bytes::from_static(b"A")).await;
        assert_eq!(broadcaster.connection_count().await, 1);

        broadcaster.write(Bytes::from_static(b"B")).await;
        assert_eq!(broadcaster.connection_count().await, 1);

        assert_eq!(&*received.lock().unwrap(), b"AB");
        assert_eq!(broadcaster.stats().write_failures, 1);

        broadcaster.close().await;
    }

    #[tokio::test]
    async fn test_write_blocks_until_slow_sink_drains() {
        let broadcaster = bind_local(1).await;

        // A duplex with a 2-byte buffer and no reader stalls the write.
        let (sink, mut reader) = tokio::io::duplex(2);
        broadcaster
            .add_connection(Connection::new(
                "127.0.0.1:50003".parse().unwrap(),
                Box::new(sink),
            ))
            .await;

        let write = tokio::spawn({
            let chunk = Bytes::from_static(b"0123456789");
            async move { broadcaster.write(chunk).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!write.is_finished(), "write returned before delivery");

        let mut buf = vec![0u8; 10];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"0123456789");

        let n = tokio::time::timeout(Duration::from_secs(1), write)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 10);
    }

    #[tokio::test]
    async fn test_no_backfill_for_late_joiners() {
        let broadcaster = bind_local(2).await;

        let mut early = connect_client(&broadcaster).await;
        broadcaster.write(Bytes::from_static(b"A")).await;

        let mut late = connect_client(&broadcaster).await;
        for _ in 0..100 {
            if broadcaster.connection_count().await == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        broadcaster.write(Bytes::from_static(b"B")).await;

        assert_eq!(read_exact_timeout(&mut early, 2).await, b"AB");
        assert_eq!(read_exact_timeout(&mut late, 1).await, b"B");

        broadcaster.close().await;
    }

    #[tokio::test]
    async fn test_close_joins_tasks_and_closes_clients() {
        let broadcaster = bind_local(3).await;
        let mut client = connect_client(&broadcaster).await;

        tokio::time::timeout(Duration::from_secs(2), broadcaster.close())
            .await
            .unwrap();

        // The client observes EOF once its connection is shut down.
        let mut buf = [0u8; 1];
        let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_write_with_no_connections_returns_immediately() {
        let broadcaster = bind_local(2).await;
        let n = tokio::time::timeout(
            Duration::from_millis(200),
            broadcaster.write(Bytes::from_static(b"xyz")),
        )
        .await
        .unwrap();
        assert_eq!(n, 3);
        broadcaster.close().await;
    }

    #[tokio::test]
    async fn test_bind_failure_is_fatal() {
        let first = bind_local(1).await;
        let config = FanoutConfig::default().bind(first.local_addr());
        let result = FanoutBroadcaster::bind(config).await;
        assert!(result.is_err());
        first.close().await;
    }
}
