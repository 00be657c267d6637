//! HTTP server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for [`HttpServer`](super::HttpServer)
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Minimum delay between frames sent to one live-stream client
    /// (None = every published frame the client can keep up with)
    pub min_frame_interval: Option<Duration>,

    /// Enable TCP_NODELAY on accepted connections
    pub tcp_nodelay: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8888".parse().unwrap(),
            min_frame_interval: None,
            tcp_nodelay: true,
        }
    }
}

impl HttpConfig {
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

    /// Rate-limit live-stream clients to one frame per `interval`
    pub fn min_frame_interval(mut self, interval: Duration) -> Self {
        self.min_frame_interval = Some(interval);
        self
    }

    /// Disable TCP_NODELAY
    pub fn disable_nodelay(mut self) -> Self {
        self.tcp_nodelay = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();

        assert_eq!(config.bind_addr.port(), 8888);
        assert!(config.min_frame_interval.is_none());
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let config = HttpConfig::default()
            .bind(addr)
            .min_frame_interval(Duration::from_millis(100))
            .disable_nodelay();

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.min_frame_interval, Some(Duration::from_millis(100)));
        assert!(!config.tcp_nodelay);
    }
}
