//! Service layer
//!
//! Public read operations of the insights engine, shared by the CLI and by
//! embedding applications.

mod insight_service;

pub use insight_service::*;
