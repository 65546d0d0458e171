use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use super::ResultCache;
use crate::errors::Result;

#[derive(Clone)]
struct CachedValue {
    payload: Arc<str>,
    ttl: Duration,
}

/// 每个条目使用写入时指定的 TTL
struct PerEntryExpiry;

impl Expiry<String, CachedValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MokaResultCache {
    inner: Cache<String, CachedValue>,
}

impl MokaResultCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        debug!(
            "MokaResultCache initialized with max capacity: {}",
            max_capacity
        );
        Self { inner }
    }
}

#[async_trait]
impl ResultCache for MokaResultCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.get(key).await.map(|v| v.payload.to_string()))
    }

    async fn insert(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.inner
            .insert(
                key.to_string(),
                CachedValue {
                    payload: value.into(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
