//! Result cache
//!
//! Best-effort memoization in front of the engine's public reads. The
//! backend is injected as `Arc<dyn ResultCache>`; any backend failure is
//! logged and the value is recomputed (fail-open).

pub mod key;
pub mod moka;
pub mod null;
pub mod redis;
pub mod traits;

pub use key::{CacheKey, CacheOperation};
pub use moka::MokaResultCache;
pub use null::NullResultCache;
pub use redis::RedisResultCache;
pub use traits::ResultCache;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::config::{CacheConfig, CacheType};
use crate::errors::Result;

pub struct CacheFactory;

impl CacheFactory {
    /// 根据配置创建缓存后端
    ///
    /// Redis URL 无效时降级为不缓存，而不是阻止启动。
    pub fn create(config: &CacheConfig) -> Arc<dyn ResultCache> {
        match config.cache_type {
            CacheType::Memory => Arc::new(MokaResultCache::new(config.memory.max_capacity)),
            CacheType::Redis => match RedisResultCache::new(config) {
                Ok(cache) => Arc::new(cache),
                Err(e) => {
                    warn!("{}, falling back to no caching", e);
                    Arc::new(NullResultCache::new())
                }
            },
            CacheType::Null => Arc::new(NullResultCache::new()),
        }
    }
}

/// 读取缓存，未命中时计算并写回
///
/// - `bypass` 为真时既不读也不写缓存
/// - 缓存读写或反序列化失败只记录日志，不影响结果
/// - 计算失败的结果不会写入缓存
pub async fn memoize<T, F, Fut>(
    cache: &dyn ResultCache,
    key: &CacheKey,
    ttl: Duration,
    bypass: bool,
    compute: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if bypass {
        debug!("Cache bypassed for {}", key);
        return compute().await;
    }

    let key_str = key.to_string();
    match cache.get(&key_str).await {
        Ok(Some(payload)) => match serde_json::from_str::<T>(&payload) {
            Ok(value) => {
                trace!("Cache hit: {}", key_str);
                return Ok(value);
            }
            Err(e) => warn!("Discarding undecodable cache entry {}: {}", key_str, e),
        },
        Ok(None) => trace!("Cache miss: {}", key_str),
        Err(e) => warn!(
            "Cache backend '{}' failed on get {}: {}, recomputing",
            cache.name(),
            key_str,
            e
        ),
    }

    let value = compute().await?;

    match serde_json::to_string(&value) {
        Ok(payload) => {
            if let Err(e) = cache.insert(&key_str, payload, ttl).await {
                warn!(
                    "Cache backend '{}' failed on insert {}: {}",
                    cache.name(),
                    key_str,
                    e
                );
            }
        }
        Err(e) => warn!("Cannot serialize value for cache key {}: {}", key_str, e),
    }
    Ok(value)
}
