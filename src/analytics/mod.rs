//! Click analytics engine
//!
//! Pure functions over a link's click log:
//! - `session`: inactivity-gap session reconstruction
//! - `aggregation`: geographic / temporal / audience breakdowns and heatmaps
//! - `quality`: bot share, suspicious IPs, rapid clicks and the quality score
//! - `channel`: traffic source → channel classification
//! - `clock`: injectable reference time

pub mod aggregation;
pub mod channel;
pub mod clock;
pub mod quality;
pub mod session;

pub use aggregation::{
    AggregateBucket, AudienceBreakdown, Dimension, GeoBreakdown, HeatmapPoint, TemporalBreakdown,
};
pub use channel::Channel;
pub use clock::{Clock, FixedClock, SystemClock};
pub use quality::{QualityReport, QualityScorer, SecurityOverview, SuspiciousIp};
pub use session::{Session, SessionQuality, SessionReconstructor, SessionStats};

use chrono::Duration;

use crate::config::AnalyticsConfig;

/// 引擎参数
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Top-N 列表长度
    pub top_n: usize,
    /// 会话不活跃间隔
    pub session_gap: Duration,
    /// 热力图位置密度半径（公里）
    pub density_radius_km: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&AnalyticsConfig::default())
    }
}

impl From<&AnalyticsConfig> for EngineSettings {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            top_n: config.top_n.max(1),
            session_gap: Duration::minutes(i64::from(config.session_gap_minutes.max(1))),
            density_radius_km: config.density_radius_km,
        }
    }
}

/// 非有限值替换为 0
#[inline]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// 四舍五入到指定小数位，非有限值返回 0
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    finite_or_zero((finite_or_zero(value) * factor).round() / factor)
}

/// 安全比值，分母为 0 时返回 0
#[inline]
pub fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        finite_or_zero(part as f64 / total as f64)
    }
}

/// 百分比（两位小数），分母为 0 时返回 0
#[inline]
pub fn percentage(part: u64, total: u64) -> f64 {
    round_to(ratio(part, total) * 100.0, 2)
}
