//! Crate error types

use std::io;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for camcast operations
#[derive(Debug)]
pub enum Error {
    /// Underlying I/O error (socket setup, reads, writes)
    Io(io::Error),
    /// Malformed HTTP request line
    InvalidRequest(String),
    /// Outbound notification could not be delivered
    Notify(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidRequest(line) => write!(f, "Invalid HTTP request: {}", line),
            Error::Notify(msg) => write!(f, "Notification failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
