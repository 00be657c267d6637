//! Fan-out broadcaster configuration

use std::net::SocketAddr;

/// Configuration for [`FanoutBroadcaster`](super::FanoutBroadcaster)
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Address the ingestion listener binds to
    pub bind_addr: SocketAddr,

    /// Number of worker tasks draining the work queue
    pub worker_count: usize,

    /// Capacity of the shared work queue
    pub queue_capacity: usize,

    /// Enable TCP_NODELAY on accepted connections
    pub tcp_nodelay: bool,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".parse().unwrap(),
            worker_count: 4,
            queue_capacity: 256,
            tcp_nodelay: true, // Important for low latency
        }
    }
}

impl FanoutConfig {
    /// Create a new config with a custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the worker pool size (minimum 1)
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Set the work queue capacity (minimum 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Disable TCP_NODELAY
    pub fn disable_nodelay(mut self) -> Self {
        self.tcp_nodelay = false;
        self
    }
}
