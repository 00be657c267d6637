//! HTTP frame serving
//!
//! Serves the latest-frame cell over two HTTP behaviors, one task per
//! client connection:
//!
//! - `GET /frame.jpg`: the current frame as a single JPEG response, no
//!   waiting; `503` if nothing has been published yet.
//! - `GET /stream.mjpg`: an unbounded `multipart/x-mixed-replace` stream,
//!   one part per published frame, terminated only by the client
//!   disconnecting.
//!
//! Routing is a trivial path match on the request line; the HTTP surface
//! is deliberately minimal (GET only, headers read and discarded).

pub mod config;
pub mod handler;
pub mod server;

pub use config::HttpConfig;
pub use server::HttpServer;

/// Multipart boundary token for the live stream
pub const MULTIPART_BOUNDARY: &str = "FRAME";
