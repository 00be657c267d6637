//! Synthetic camera demo
//!
//! Runs the full wiring (fan-out broadcaster, HTTP frame server, and
//! debounced notifier) against a synthetic producer that emits fake JPEG
//! frames and fake elementary-stream chunks on a timer.
//!
//! Run with: cargo run --example synthetic_camera [HTTP_ADDR] [FANOUT_ADDR]
//!
//! Then:
//!   curl http://localhost:8888/frame.jpg -o frame.jpg
//!   curl -N http://localhost:8888/stream.mjpg | head -c 4096 | xxd
//!   nc localhost 8000            # raw elementary-stream tap
//!
//! Every 50th frame simulates a motion-detection trigger; with a notifier
//! target listening (e.g. `nc -l 9080`) you can watch the debouncing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use camcast::frame::JPEG_SOI;
use camcast::{
    AppContext, DebouncedNotifier, FanoutBroadcaster, FanoutConfig, FrameCell, HttpConfig,
    HttpPostSink, HttpServer, NotifierConfig,
};

fn parse_addr(arg: &str, default_port: u16) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    Err(format!(
        "Invalid address: '{}'. Expected IP:PORT, IP, or 'localhost'",
        arg
    ))
}

/// A fake JPEG frame: SOI marker plus a recognizable payload.
fn fake_jpeg(seq: u64) -> Vec<u8> {
    let mut frame = JPEG_SOI.to_vec();
    frame.extend_from_slice(format!("synthetic frame {:08}", seq).as_bytes());
    frame.extend_from_slice(&[0u8; 256]);
    frame
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("camcast=debug".parse()?)
                .add_directive("synthetic_camera=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let http_addr = match args.get(1) {
        Some(a) => parse_addr(a, 8888).map_err(|e| {
            eprintln!("Error: {}", e);
            e
        })?,
        None => "0.0.0.0:8888".parse().unwrap(),
    };
    let fanout_addr = match args.get(2) {
        Some(a) => parse_addr(a, 8000).map_err(|e| {
            eprintln!("Error: {}", e);
            e
        })?,
        None => "0.0.0.0:8000".parse().unwrap(),
    };

    let cell = Arc::new(FrameCell::new());
    let broadcaster = FanoutBroadcaster::bind(FanoutConfig::with_addr(fanout_addr)).await?;
    let http = HttpServer::bind(
        HttpConfig::with_addr(http_addr),
        Arc::new(AppContext::new(Arc::clone(&cell))),
    )
    .await?;

    let notifier = DebouncedNotifier::spawn(
        HttpPostSink::new("127.0.0.1:9080", "/", "\"on\""),
        NotifierConfig::default().min_interval(Duration::from_secs(10)),
    );

    println!("HTTP:    http://{}/  /frame.jpg  /stream.mjpg", http_addr);
    println!("Fan-out: tcp://{}", fanout_addr);
    println!();

    // Synthetic producer: ~10 fps on both streams.
    let producer = async {
        let mut ticker = tokio::time::interval(Duration::from_millis(100));
        let mut seq: u64 = 0;
        loop {
            ticker.tick().await;
            seq += 1;

            cell.write(&fake_jpeg(seq));

            let chunk = Bytes::from(format!("h264-chunk-{:08}\n", seq));
            broadcaster.write(chunk).await;

            // Pretend the analyzer crossed its threshold periodically.
            if seq % 50 == 0 {
                notifier.trigger();
            }
        }
    };

    tokio::select! {
        _ = producer => {}
        result = http.run() => {
            if let Err(e) = result {
                eprintln!("HTTP server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    broadcaster.close().await;
    notifier.shutdown().await;

    Ok(())
}
