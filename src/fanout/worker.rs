//! Worker pool internals
//!
//! Workers drain a shared work queue. Each broadcast round enqueues one
//! data item per snapshotted connection plus a countdown gate; the producer
//! awaits the gate, which is the backpressure barrier. Workers shut down
//! cooperatively via poison pills.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, Mutex, Notify};

use super::connection::Connection;
use super::registry::ConnectionRegistry;
use super::stats::FanoutStats;

/// One unit of fan-out work
pub(super) enum WorkItem {
    /// Deliver `payload` to `conn`, then complete `gate`
    Data {
        conn: Arc<Connection>,
        payload: Bytes,
        gate: Arc<RoundGate>,
    },
    /// Terminate the worker that dequeues this
    PoisonPill,
}

/// Countdown barrier for one broadcast round.
///
/// The producer waits until every item of the round has been processed,
/// successfully or not.
pub(super) struct RoundGate {
    remaining: AtomicUsize,
    notify: Notify,
}

impl RoundGate {
    pub(super) fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            notify: Notify::new(),
        }
    }

    /// Mark one item processed
    pub(super) fn complete(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.notify.notify_waiters();
        }
    }

    /// Wait until every item has been processed
    pub(super) async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.remaining.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Shared handle to the single-consumer work queue.
///
/// Workers take turns holding the lock while waiting; the item is always
/// processed outside of it, so deliveries to different connections run in
/// parallel.
pub(super) type SharedQueue = Arc<Mutex<mpsc::Receiver<WorkItem>>>;

/// Worker loop: dequeue, deliver, report to the round's gate.
pub(super) async fn run_worker(
    id: usize,
    queue: SharedQueue,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<FanoutStats>,
) {
    loop {
        let item = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };

        let Some(item) = item else {
            // Queue closed: broadcaster dropped without close()
            break;
        };

        match item {
            WorkItem::PoisonPill => break,
            WorkItem::Data {
                conn,
                payload,
                gate,
            } => {
                deliver(&conn, &payload, &registry, &stats).await;
                gate.complete();
            }
        }
    }

    tracing::debug!(worker = id, "Fan-out worker stopped");
}

async fn deliver(
    conn: &Arc<Connection>,
    payload: &Bytes,
    registry: &ConnectionRegistry,
    stats: &FanoutStats,
) {
    // A connection can fail and be removed between snapshot and delivery.
    if conn.is_closed() {
        return;
    }

    match conn.write(payload).await {
        Ok(()) => {
            stats.record_bytes(payload.len());
        }
        Err(e) => {
            // Exactly one event claims the removal.
            if conn.mark_closed() {
                registry.remove(conn.peer_addr()).await;
                conn.shutdown_sink().await;
                stats.record_write_failure();
                tracing::debug!(
                    peer = %conn.peer_addr(),
                    error = %e,
                    "Fan-out client removed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_gate_releases_after_all_completions() {
        let gate = Arc::new(RoundGate::new(3));

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.wait().await })
        };

        gate.complete();
        gate.complete();
        assert!(!waiter.is_finished());

        gate.complete();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_gate_with_zero_items_is_open() {
        let gate = RoundGate::new(0);
        tokio::time::timeout(Duration::from_millis(100), gate.wait())
            .await
            .unwrap();
    }
}
