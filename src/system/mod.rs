//! System-level modules
//!
//! - Logging initialization (tracing subscriber + appender)

pub mod logging;

pub use logging::init_logging;
