//! Fan-out statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a broadcaster's lifetime
#[derive(Debug, Default)]
pub struct FanoutStats {
    /// Connections accepted
    connections_accepted: AtomicU64,
    /// Chunks broadcast (one per `write` call)
    chunks_broadcast: AtomicU64,
    /// Bytes successfully written across all connections
    bytes_sent: AtomicU64,
    /// Connections dropped on write failure
    write_failures: AtomicU64,
}

impl FanoutStats {
    /// Create zeroed stats
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn record_accept(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_chunk(&self) {
        self.chunks_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_bytes(&self, n: usize) {
        self.bytes_sent.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(super) fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough copy of the counters
    pub fn snapshot(&self) -> FanoutStatsSnapshot {
        FanoutStatsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            chunks_broadcast: self.chunks_broadcast.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`FanoutStats`]
#[derive(Debug, Clone, Default)]
pub struct FanoutStatsSnapshot {
    /// Connections accepted
    pub connections_accepted: u64,
    /// Chunks broadcast
    pub chunks_broadcast: u64,
    /// Bytes successfully written
    pub bytes_sent: u64,
    /// Connections dropped on write failure
    pub write_failures: u64,
}
