//! TCP fan-out broadcaster
//!
//! Replicates every chunk written by the producer to all currently-open
//! TCP client connections, with a bounded worker pool, per-connection
//! fault isolation, and backpressure on the producer.
//!
//! # Architecture
//!
//! ```text
//!                      FanoutBroadcaster
//!              ┌──────────────────────────────┐
//!   producer   │ registry: Map<Addr, Conn>    │   accept task
//!   write(c) ──┤ queue: mpsc<WorkItem>        ├◄── inserts new
//!              │ workers: W tasks             │    connections
//!              └───────────┬──────────────────┘
//!                          │ one WorkItem per snapshotted connection
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!       [worker 0]     [worker 1]     [worker W-1]
//!       conn.write     conn.write     conn.write
//!           └──────────────┴──────────────┘
//!                          │ countdown gate
//!                          ▼
//!              write(c) returns to producer
//! ```
//!
//! `write` does not return until delivery has been attempted on every
//! connection that was registered when it was called: the producer cannot
//! outrun the slowest client by more than one round. A connection whose
//! write fails is removed exactly once and never aborts delivery to the
//! others.

pub mod broadcaster;
pub mod config;
pub mod connection;
pub mod registry;
pub mod stats;
mod worker;

pub use broadcaster::FanoutBroadcaster;
pub use config::FanoutConfig;
pub use connection::Connection;
pub use registry::ConnectionRegistry;
pub use stats::{FanoutStats, FanoutStatsSnapshot};
