use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::ResultCache;
use crate::errors::Result;

/// 不缓存任何内容
pub struct NullResultCache;

impl NullResultCache {
    pub fn new() -> Self {
        debug!("Using NullResultCache: results will not be cached");
        NullResultCache
    }
}

impl Default for NullResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for NullResultCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn insert(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
