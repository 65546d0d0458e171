use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::ResultCache;
use crate::config::CacheConfig;
use crate::errors::{InsightError, Result};

pub struct RedisResultCache {
    client: redis::Client,
    /// 持久化连接，断开后在下一次访问时重建
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisResultCache {
    /// 只校验 URL，连接延迟到第一次访问时建立
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis.url.as_str()).map_err(|e| {
            InsightError::cache_unavailable(format!(
                "Invalid Redis URL '{}': {}",
                config.redis.url, e
            ))
        })?;

        debug!(
            "RedisResultCache created with prefix: '{}'",
            config.key_prefix
        );
        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: config.key_prefix.clone(),
        })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        {
            let guard = self.connection.read().await;
            if let Some(ref conn) = *guard {
                return Ok(conn.clone());
            }
        }

        let mut guard = self.connection.write().await;
        // 双重检查
        if let Some(ref conn) = *guard {
            return Ok(conn.clone());
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        *guard = Some(conn.clone());
        debug!("Redis connection established and cached");
        Ok(conn)
    }

    async fn reset_connection(&self) {
        *self.connection.write().await = None;
        debug!("Redis connection reset due to error");
    }

    /// 出错时重置连接，再把错误交给调用方
    async fn on_error<T>(&self, result: redis::RedisResult<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ResultCache for RedisResultCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = self.on_error(conn.get(self.make_key(key)).await).await?;
        trace!("Redis cache {} for key: {}", if value.is_some() { "hit" } else { "miss" }, key);
        Ok(value)
    }

    async fn insert(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.get_connection().await?;
        // SET EX 至少 1 秒
        let secs = ttl.as_secs().max(1);
        self.on_error(
            conn.set_ex::<String, String, ()>(self.make_key(key), value, secs)
                .await,
        )
        .await
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
