//! SeaORM storage backend
//!
//! Read-only click log access over SQLite, MySQL/MariaDB and PostgreSQL.

mod analytics;
mod connection;
mod converters;

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{InsightError, Result};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{click_to_active_model, link_to_active_model, model_to_click, model_to_link};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(InsightError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based click store
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStorage {
    pub async fn new(config: &DatabaseConfig, backend_name: &str) -> Result<Self> {
        if config.database_url.is_empty() {
            return Err(InsightError::database_config("database_url 未设置"));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(&config.database_url).await?
        } else {
            connect_generic(config, backend_name).await?
        };

        Self::from_connection(db, backend_name).await
    }

    /// 复用已有连接（测试与嵌入场景）
    pub async fn from_connection(db: DatabaseConnection, backend_name: &str) -> Result<Self> {
        run_migrations(&db).await?;

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
        };
        info!(
            "{} click store initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}
