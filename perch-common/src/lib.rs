//! Shared utilities for the Perch crates.
//!
//! Right now this is only the logging bootstrap in [`observability`]. Library
//! crates never install a subscriber themselves; binaries and test harnesses call
//! [`init_logging`] once and every `tracing` event emitted by `perch-http` and
//! `perch-api` lands in the same sink.
//!
//! ```no_run
//! use perch_common::{LogConfig, init_logging};
//!
//! let path = init_logging(LogConfig::default()).expect("logging");
//! println!("logging to {}", path.display());
//! ```
pub mod observability;

pub use observability::{LogConfig, LogFormat, init_logging};
