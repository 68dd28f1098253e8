//! Foundational low-level utilities shared across logrelay crates.
//!
//! Provides the atomic file-copy helper used for log staging plus the time
//! utilities used by the watcher watermark and staging event log.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::copy_file_atomic;
pub use time_utils::{current_unix_timestamp_ms, current_unix_timestamp_us};
