use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;

/// 结果缓存
///
/// 值为序列化后的 JSON 字符串。所有操作都可能失败，调用方负责降级
/// （见 [`memoize`](super::memoize)）。并发写入同一 key 是幂等的。
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn insert(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    fn name(&self) -> &'static str;
}
