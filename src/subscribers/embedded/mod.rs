//! # Built-in subscribers
//!
//! - [`LogWriter`]: writes gate events to `tracing` in a compact form.

mod log;

pub use log::LogWriter;
