//! Event store accessor
//!
//! Read-only access to links and their click log. The analytics engine only
//! depends on the `ClickStore` trait; `SeaOrmStorage` serves production
//! databases and `MemoryClickStore` serves tests and seeded demos.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod memory;
pub mod models;
pub mod query;

pub use backend::SeaOrmStorage;
pub use memory::MemoryClickStore;
pub use models::{ClickEvent, DeviceKind, GeoLocation, Link, LinkId};
pub use query::{ClickField, ClickQuery};

#[async_trait]
pub trait ClickStore: Send + Sync {
    /// 查找单个链接，不存在时返回 `None`
    async fn find_link(&self, id: LinkId) -> Result<Option<Link>>;

    /// 批量查找链接，结果按 ID 升序，不存在的 ID 直接缺席
    async fn find_links(&self, ids: &[LinkId]) -> Result<Vec<Link>>;

    /// 加载满足条件的点击，按 (timestamp, id) 升序
    async fn load_clicks(&self, query: &ClickQuery) -> Result<Vec<ClickEvent>>;

    /// 统计满足条件的点击数
    async fn count_clicks(&self, query: &ClickQuery) -> Result<u64> {
        Ok(self.load_clicks(query).await?.len() as u64)
    }

    fn backend_name(&self) -> &str;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<dyn ClickStore>> {
        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(&config.database_url)?;

        let storage = SeaOrmStorage::new(config, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}
