//! Shortlinker Insights - click analytics & insights engine
//!
//! Turns a link's raw click log into visitor sessions, multi-dimensional
//! aggregates, a traffic quality score and ranked business insights.
//!
//! # Architecture
//! - `storage`: read-only event store accessor (sea-orm and in-memory backends)
//! - `analytics`: sessions, aggregation, quality scoring, channel classification
//! - `insights`: rule-based insight generator
//! - `cache`: best-effort result cache (moka / redis / null)
//! - `services`: `InsightService`, the public read operations
//! - `config`: static configuration (TOML + `LI__*` environment)
//! - `system`: logging initialization
//! - `runtime`: binary wiring and command execution

pub mod analytics;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod insights;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
