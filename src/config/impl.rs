use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::{InsightError, Result};

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Result<Arc<StaticConfig>> {
    CONFIG
        .get()
        .map(|config| config.load_full())
        .ok_or_else(|| InsightError::config("Config not initialized. Call init_config() first."))
}

/// Initialize the global configuration
///
/// Loads configuration from `path` (missing file falls back to defaults),
/// then applies `LI__*` environment overrides. Subsequent calls are no-ops.
pub fn init_config(path: &str) -> Result<Arc<StaticConfig>> {
    if let Some(existing) = CONFIG.get() {
        return Ok(existing.load_full());
    }
    let loaded = StaticConfig::load(path)?;
    let holder = CONFIG.get_or_init(|| ArcSwap::from_pointee(loaded));
    Ok(holder.load_full())
}
