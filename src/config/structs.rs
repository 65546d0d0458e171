use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use crate::errors::{InsightError, Result};

/// 缓存后端类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CacheType {
    #[default]
    Memory,
    Redis,
    Null,
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - database: 点击事件存储的数据库连接
/// - cache: 结果缓存
/// - logging: 日志配置
/// - analytics: 分析引擎参数
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：LI，分隔符：__
    /// 示例：LI__CACHE__TYPE=redis
    pub fn load(path: &str) -> Result<Self> {
        use config::{Config, Environment, File};

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("LI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<()> {
        if self.analytics.top_n == 0 {
            return Err(InsightError::config("analytics.top_n must be at least 1"));
        }
        if self.analytics.session_gap_minutes == 0 {
            return Err(InsightError::config(
                "analytics.session_gap_minutes must be at least 1",
            ));
        }
        if !self.analytics.density_radius_km.is_finite() || self.analytics.density_radius_km <= 0.0
        {
            return Err(InsightError::config(
                "analytics.density_radius_km must be a positive number",
            ));
        }
        self.cache.ttl.validate()
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
}

/// 结果缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    #[serde(default)]
    pub cache_type: CacheType,
    #[serde(default = "default_cache_key_prefix")]
    pub key_prefix: String,
    #[serde(default)]
    pub ttl: CacheTtlConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// 各查询的缓存 TTL（秒）
///
/// 变化快的看板数据使用短 TTL，多链接聚合使用长 TTL。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTtlConfig {
    #[serde(default = "default_link_report_ttl")]
    pub link_report: u64,
    #[serde(default = "default_quality_report_ttl")]
    pub quality_report: u64,
    #[serde(default = "default_heatmap_ttl")]
    pub heatmap: u64,
    #[serde(default = "default_global_ttl")]
    pub global_report: u64,
    #[serde(default = "default_global_ttl")]
    pub global_heatmap: u64,
}

impl CacheTtlConfig {
    const MIN_TTL: u64 = 5 * 60;
    const MAX_TTL: u64 = 15 * 60;

    fn validate(&self) -> Result<()> {
        let entries = [
            ("link_report", self.link_report),
            ("quality_report", self.quality_report),
            ("heatmap", self.heatmap),
            ("global_report", self.global_report),
            ("global_heatmap", self.global_heatmap),
        ];
        for (name, ttl) in entries {
            if !(Self::MIN_TTL..=Self::MAX_TTL).contains(&ttl) {
                return Err(InsightError::config(format!(
                    "cache.ttl.{} = {}s is outside the allowed {}..={}s window",
                    name,
                    ttl,
                    Self::MIN_TTL,
                    Self::MAX_TTL
                )));
            }
        }
        Ok(())
    }
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 分析引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Top-N 列表长度（国家/州/城市/来源/热门链接）
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// 会话不活跃间隔（分钟）
    #[serde(default = "default_session_gap_minutes")]
    pub session_gap_minutes: u32,
    /// 热力图位置密度半径（公里）
    #[serde(default = "default_density_radius_km")]
    pub density_radius_km: f64,
}

// ============================================================
// Default value functions
// ============================================================

fn default_database_url() -> String {
    "sqlite://shortlinks.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_cache_key_prefix() -> String {
    "insights:".to_string()
}

fn default_link_report_ttl() -> u64 {
    300
}

fn default_quality_report_ttl() -> u64 {
    600
}

fn default_heatmap_ttl() -> u64 {
    600
}

fn default_global_ttl() -> u64 {
    900
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_memory_capacity() -> u64 {
    10000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_top_n() -> usize {
    10
}

fn default_session_gap_minutes() -> u32 {
    30
}

fn default_density_radius_km() -> f64 {
    50.0
}

// ============================================================
// Default implementations
// ============================================================

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::default(),
            key_prefix: default_cache_key_prefix(),
            ttl: CacheTtlConfig::default(),
            redis: RedisConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            link_report: default_link_report_ttl(),
            quality_report: default_quality_report_ttl(),
            heatmap: default_heatmap_ttl(),
            global_report: default_global_ttl(),
            global_heatmap: default_global_ttl(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            session_gap_minutes: default_session_gap_minutes(),
            density_radius_km: default_density_radius_km(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(StaticConfig::default().validate().is_ok());
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.analytics.top_n, 10);
        assert_eq!(parsed.cache.cache_type, CacheType::Memory);
        assert_eq!(parsed.cache.ttl.global_report, 900);
    }

    #[test]
    fn test_ttl_outside_window_is_rejected() {
        let mut config = StaticConfig::default();
        config.cache.ttl.link_report = 60;
        assert!(matches!(config.validate(), Err(InsightError::Config(_))));
    }

    #[test]
    fn test_cache_type_parses_case_insensitively() {
        assert_eq!("Redis".parse::<CacheType>().unwrap(), CacheType::Redis);
        assert_eq!("NULL".parse::<CacheType>().unwrap(), CacheType::Null);
        assert!("memcached".parse::<CacheType>().is_err());
    }
}
