use std::fmt;

#[derive(Debug, Clone)]
pub enum InsightError {
    NotFound(String),
    InvalidInput(String),
    UpstreamUnavailable(String),
    CacheUnavailable(String),
    DatabaseConfig(String),
    DatabaseOperation(String),
    Serialization(String),
    Config(String),
}

impl InsightError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            InsightError::NotFound(_) => "E001",
            InsightError::InvalidInput(_) => "E002",
            InsightError::UpstreamUnavailable(_) => "E003",
            InsightError::CacheUnavailable(_) => "E004",
            InsightError::DatabaseConfig(_) => "E005",
            InsightError::DatabaseOperation(_) => "E006",
            InsightError::Serialization(_) => "E007",
            InsightError::Config(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            InsightError::NotFound(_) => "Resource Not Found",
            InsightError::InvalidInput(_) => "Invalid Input",
            InsightError::UpstreamUnavailable(_) => "Upstream Unavailable",
            InsightError::CacheUnavailable(_) => "Cache Unavailable",
            InsightError::DatabaseConfig(_) => "Database Configuration Error",
            InsightError::DatabaseOperation(_) => "Database Operation Error",
            InsightError::Serialization(_) => "Serialization Error",
            InsightError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            InsightError::NotFound(msg)
            | InsightError::InvalidInput(msg)
            | InsightError::UpstreamUnavailable(msg)
            | InsightError::CacheUnavailable(msg)
            | InsightError::DatabaseConfig(msg)
            | InsightError::DatabaseOperation(msg)
            | InsightError::Serialization(msg)
            | InsightError::Config(msg) => msg,
        }
    }

    /// 缓存后端错误可以在本地恢复（回退到直接计算）
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InsightError::CacheUnavailable(_))
    }

    /// 格式化为彩色输出（用于 CLI 模式的 stderr）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for InsightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for InsightError {}

// 便捷的构造函数
impl InsightError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        InsightError::NotFound(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        InsightError::InvalidInput(msg.into())
    }

    pub fn upstream_unavailable<T: Into<String>>(msg: T) -> Self {
        InsightError::UpstreamUnavailable(msg.into())
    }

    pub fn cache_unavailable<T: Into<String>>(msg: T) -> Self {
        InsightError::CacheUnavailable(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        InsightError::DatabaseConfig(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        InsightError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        InsightError::Serialization(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        InsightError::Config(msg.into())
    }
}

// 连接类错误视为上游不可用，其余归为数据库操作错误
impl From<sea_orm::DbErr> for InsightError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_) => {
                InsightError::UpstreamUnavailable(err.to_string())
            }
            _ => InsightError::DatabaseOperation(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for InsightError {
    fn from(err: redis::RedisError) -> Self {
        InsightError::CacheUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for InsightError {
    fn from(err: serde_json::Error) -> Self {
        InsightError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for InsightError {
    fn from(err: config::ConfigError) -> Self {
        InsightError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            InsightError::not_found("x"),
            InsightError::invalid_input("x"),
            InsightError::upstream_unavailable("x"),
            InsightError::cache_unavailable("x"),
            InsightError::database_config("x"),
            InsightError::database_operation("x"),
            InsightError::serialization("x"),
            InsightError::config("x"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = InsightError::not_found("link 42 does not exist");
        assert_eq!(
            err.to_string(),
            "Resource Not Found: link 42 does not exist"
        );
    }

    #[test]
    fn test_only_cache_errors_are_recoverable() {
        assert!(InsightError::cache_unavailable("redis down").is_recoverable());
        assert!(!InsightError::upstream_unavailable("db down").is_recoverable());
        assert!(!InsightError::invalid_input("bad id").is_recoverable());
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let converted: InsightError = err.into();
        assert!(matches!(converted, InsightError::Serialization(_)));
    }
}
