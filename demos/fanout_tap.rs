//! Fan-out tap
//!
//! Connects to a broadcaster's ingestion port as a plain TCP client and
//! copies everything it receives to stdout. Useful for checking what the
//! elementary-stream fan-out delivers, or piping it into a player:
//!
//!   cargo run --example fanout_tap localhost:8000 | ffplay -f h264 -
//!
//! Receiving starts at the moment of connection; there is no backfill.

use std::net::SocketAddr;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let addr: SocketAddr = args
        .get(1)
        .map(|a| a.replace("localhost", "127.0.0.1"))
        .unwrap_or_else(|| "127.0.0.1:8000".into())
        .parse()?;

    let mut stream = TcpStream::connect(addr).await?;
    eprintln!("Connected to {}", addr);

    let mut stdout = tokio::io::stdout();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            eprintln!("Broadcaster closed the connection");
            return Ok(());
        }
        tokio::io::AsyncWriteExt::write_all(&mut stdout, &buf[..n]).await?;
    }
}
