//! Application runtime
//!
//! Wires configuration, storage, cache and the insight service together for
//! the binary, then executes the parsed command.

pub mod startup;

pub use startup::{StartupContext, prepare_startup, run_command};
