//! Connection registry
//!
//! Tracks the currently-open fan-out connections. The accept task inserts,
//! workers remove on write failure, and broadcast rounds operate on a
//! point-in-time copy so neither ever blocks an in-flight round.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::connection::Connection;

/// Registry of open fan-out connections, keyed by peer address
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<SocketAddr, Arc<Connection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly accepted connection
    pub async fn insert(&self, conn: Arc<Connection>) {
        let mut connections = self.connections.write().await;
        connections.insert(conn.peer_addr(), conn);
    }

    /// Remove a connection by peer address
    pub async fn remove(&self, addr: SocketAddr) -> Option<Arc<Connection>> {
        let mut connections = self.connections.write().await;
        connections.remove(&addr)
    }

    /// Point-in-time copy of the open connections.
    ///
    /// Connections accepted after the copy is taken are not part of the
    /// round built from it.
    pub async fn snapshot(&self) -> Vec<Arc<Connection>> {
        let connections = self.connections.read().await;
        connections.values().cloned().collect()
    }

    /// Remove and return every connection (broadcaster shutdown)
    pub async fn drain(&self) -> Vec<Arc<Connection>> {
        let mut connections = self.connections.write().await;
        connections.drain().map(|(_, conn)| conn).collect()
    }

    /// Number of open connections
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Whether the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
