//! Application context
//!
//! Shared state constructed once at startup and passed by reference to
//! every component. There are no process-wide singletons: whoever wires
//! the application owns the context.

use std::sync::Arc;

use bytes::Bytes;

use crate::frame::FrameCell;

const DEFAULT_INDEX_PAGE: &str = "\
<html>
    <head>
        <title>camcast live stream</title>
    </head>
    <body>
        <h1>camcast</h1>
        <img src=\"stream.mjpg\" />
    </body>
</html>
";

/// Shared application state for the HTTP serving side
pub struct AppContext {
    frame: Arc<FrameCell>,
    index_page: Bytes,
}

impl AppContext {
    /// Create a context around a frame cell, with the default index page
    pub fn new(frame: Arc<FrameCell>) -> Self {
        Self {
            frame,
            index_page: Bytes::from_static(DEFAULT_INDEX_PAGE.as_bytes()),
        }
    }

    /// Replace the index page served at `/`
    pub fn with_index_page(mut self, page: impl Into<Bytes>) -> Self {
        self.index_page = page.into();
        self
    }

    /// The shared frame cell
    pub fn frame(&self) -> &FrameCell {
        &self.frame
    }

    /// The index page body
    pub fn index_page(&self) -> &Bytes {
        &self.index_page
    }
}
