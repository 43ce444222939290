//! Utility functions and helpers
//!
//! Timestamp helpers and atomic file writes used by the store.

pub mod atomic;
pub mod time;

pub use atomic::{atomic_write_with, remove_stale_temp};
pub use time::{current_timestamp, current_timestamp_millis};
