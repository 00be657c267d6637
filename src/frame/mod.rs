//! Latest-frame broadcast cell
//!
//! A single camera session produces a JPEG-framed stream as a sequence of
//! byte chunks. This module reassembles those chunks into whole frames and
//! holds only the most recent one, waking every waiting consumer on each
//! publish.
//!
//! # Latest-value semantics
//!
//! ```text
//!                       Arc<FrameCell>
//!                  ┌──────────────────────┐
//!                  │ accumulator: BytesMut│
//!   producer ────► │ current: watch::Tx   │
//!   write(chunk)   │   <Option<Bytes>>    │
//!                  └──────────┬───────────┘
//!                             │ publish on 0xFF 0xD8 boundary
//!            ┌────────────────┼────────────────┐
//!            ▼                ▼                ▼
//!       [HTTP client]    [HTTP client]    [snapshot]
//!       watcher.next()   watcher.next()   frame.jpg
//! ```
//!
//! There is no history: a consumer that falls behind skips straight to the
//! newest frame. A partially accumulated frame is never observable.

pub mod cell;

pub use cell::{FrameCell, FrameWatcher, JPEG_SOI};
