//! Debounced event notification
//!
//! The motion analyzer can fire many times per second; the party being
//! notified only wants to hear about it occasionally. This module converts
//! bursty triggers into rate-limited external calls on a dedicated
//! background task, fully decoupled from the analyzer.
//!
//! Triggers that arrive inside the suppression window are dropped, not
//! queued: at most one external call fires per window.

pub mod debounce;
pub mod sink;

pub use debounce::{DebouncedNotifier, NotifierConfig};
pub use sink::{HttpPostSink, NotifySink};
