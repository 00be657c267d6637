//! camcast: camera stream fan-out and MJPEG serving
//!
//! Distributes a continuously produced, single-source media stream to a
//! dynamically changing set of concurrent consumers:
//!
//! - [`fanout`] replicates an encoded elementary stream (e.g. H.264) to
//!   every connected TCP client, with a bounded worker pool, per-connection
//!   fault isolation, and backpressure on the producer.
//! - [`frame`] reassembles a JPEG-framed stream into whole frames and holds
//!   only the latest one.
//! - [`http`] serves the latest frame as a single JPEG or as a live
//!   `multipart/x-mixed-replace` stream, one task per client.
//! - [`notify`] turns bursty motion-detection triggers into debounced,
//!   fire-and-forget HTTP notifications.
//!
//! # Data flow
//!
//! ```text
//!                 ┌── JPEG chunks ──► FrameCell ──► HTTP clients
//!   frame producer┤                      ▲  (latest frame, broadcast wake)
//!                 └── H.264 chunks ──► FanoutBroadcaster ──► TCP clients
//!
//!   motion analyzer ── trigger() ──► DebouncedNotifier ──► HTTP POST
//! ```
//!
//! The producer calls `FrameCell::write` and `FanoutBroadcaster::write` one
//! chunk at a time on its own task; consumers attach and detach freely and
//! a failure local to one consumer never interrupts any other consumer or
//! the producer.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use camcast::{AppContext, FanoutBroadcaster, FanoutConfig, FrameCell, HttpConfig, HttpServer};
//!
//! # async fn example() -> camcast::error::Result<()> {
//! let cell = Arc::new(FrameCell::new());
//! let broadcaster = FanoutBroadcaster::bind(FanoutConfig::default()).await?;
//!
//! let ctx = Arc::new(AppContext::new(Arc::clone(&cell)));
//! let http = HttpServer::bind(HttpConfig::default(), ctx).await?;
//! tokio::spawn(async move { http.run().await });
//!
//! // Producer loop: feed chunks from the camera/encoder.
//! loop {
//!     let jpeg_chunk: Vec<u8> = todo!();
//!     cell.write(&jpeg_chunk);
//!     let h264_chunk: bytes::Bytes = todo!();
//!     broadcaster.write(h264_chunk).await;
//! }
//! # }
//! ```

pub mod context;
pub mod error;
pub mod fanout;
pub mod frame;
pub mod http;
pub mod notify;

pub use context::AppContext;
pub use error::{Error, Result};
pub use fanout::{FanoutBroadcaster, FanoutConfig};
pub use frame::{FrameCell, FrameWatcher};
pub use http::{HttpConfig, HttpServer};
pub use notify::{DebouncedNotifier, HttpPostSink, NotifierConfig, NotifySink};
