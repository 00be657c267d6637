//! HTTP server
//!
//! Accept loop that hands each connection to its own handler task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::context::AppContext;
use crate::error::Result;

use super::config::HttpConfig;
use super::handler::handle_client;

/// HTTP frame-serving server
pub struct HttpServer {
    config: HttpConfig,
    ctx: Arc<AppContext>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl HttpServer {
    /// Bind the listener.
    ///
    /// A bind failure is fatal; no partial server is left running.
    pub async fn bind(config: HttpConfig, ctx: Arc<AppContext>) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!(addr = %local_addr, "HTTP server listening");

        Ok(Self {
            config,
            ctx,
            listener,
            local_addr,
        })
    }

    /// Address the listener actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until the process exits.
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer_addr)) => self.spawn_handler(socket, peer_addr),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept HTTP client");
                }
            }
        }
    }

    /// Serve until the shutdown future resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                tracing::info!("HTTP server shutting down");
                Ok(())
            }
            result = self.run() => result,
        }
    }

    fn spawn_handler(&self, socket: TcpStream, peer_addr: SocketAddr) {
        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::warn!(error = %e, "Failed to set TCP_NODELAY");
            }
        }

        tracing::debug!(peer = %peer_addr, "HTTP client connected");

        let ctx = Arc::clone(&self.ctx);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, ctx, &config).await {
                tracing::debug!(peer = %peer_addr, error = %e, "HTTP client error");
            }
            tracing::debug!(peer = %peer_addr, "HTTP client done");
        });
    }
}
