//! Utility functions and helpers
//!
//! Timestamp helpers and crash-safe file writes.

pub mod atomic;
pub mod time;

pub use atomic::{atomic_write, atomic_write_json, AtomicError, AtomicResult};
pub use time::{current_timestamp, format_display, next_daily_run};
