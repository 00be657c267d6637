//! Single-slot frame cell with JPEG boundary framing

use bytes::{Bytes, BytesMut};
use std::sync::Mutex;
use tokio::sync::watch;

/// JPEG start-of-image marker. A chunk beginning with this marker opens a
/// new frame and completes the previous one.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Holds the most recently completed frame and the bytes of the frame
/// currently being assembled.
///
/// `write` is called by a single producer, one chunk at a time. Any number
/// of consumers may `snapshot` the current frame or await the next publish
/// through a [`FrameWatcher`]; all waiters are released by one publish.
pub struct FrameCell {
    /// Bytes of the in-progress frame. Never awaited while held.
    accumulator: Mutex<BytesMut>,

    /// Latest completed frame. `None` until the first publish.
    current: watch::Sender<Option<Bytes>>,
}

impl FrameCell {
    /// Create an empty cell
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accumulator: Mutex::new(BytesMut::new()),
            current,
        }
    }

    /// Feed one chunk from the producer.
    ///
    /// A chunk starting with [`JPEG_SOI`] completes the previous frame:
    /// the accumulator contents are published wholesale, every waiter is
    /// woken, and the accumulator restarts with this chunk. Any other
    /// chunk only extends the accumulator.
    ///
    /// Returns the number of bytes consumed, always `chunk.len()`.
    pub fn write(&self, chunk: &[u8]) -> usize {
        let mut acc = self.accumulator.lock().unwrap_or_else(|e| e.into_inner());

        if chunk.starts_with(&JPEG_SOI) && !acc.is_empty() {
            let frame = acc.split().freeze();
            self.current.send_replace(Some(frame));
        }

        acc.extend_from_slice(chunk);
        chunk.len()
    }

    /// Copy of the latest completed frame, without waiting.
    ///
    /// `None` if no frame has been published yet.
    pub fn snapshot(&self) -> Option<Bytes> {
        self.current.borrow().clone()
    }

    /// Await the next publish and return the new frame.
    ///
    /// Each call consumes exactly one publish event; the frame current at
    /// call time is never returned. For repeated consumption prefer
    /// [`FrameCell::watch`], which does not miss frames published between
    /// calls.
    pub async fn next_frame(&self) -> Option<Bytes> {
        self.watch().next().await
    }

    /// Subscribe to future publishes.
    pub fn watch(&self) -> FrameWatcher {
        FrameWatcher {
            rx: self.current.subscribe(),
        }
    }
}

impl Default for FrameCell {
    fn default() -> Self {
        Self::new()
    }
}

/// A persistent subscription to a [`FrameCell`].
///
/// Frames published while the holder is busy are coalesced: `next` returns
/// the newest frame published since the previous call, or waits for one.
pub struct FrameWatcher {
    rx: watch::Receiver<Option<Bytes>>,
}

impl FrameWatcher {
    /// Await the next frame.
    ///
    /// Returns `None` only if the cell itself was dropped.
    pub async fn next(&mut self) -> Option<Bytes> {
        loop {
            self.rx.changed().await.ok()?;
            let frame = self.rx.borrow_and_update().clone();
            // The initial value is None; skip it and wait for a real frame.
            if frame.is_some() {
                return frame;
            }
        }
    }
}
