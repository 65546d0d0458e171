//! Pre-computed inputs for the insight rules

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::aggregation::{AudienceBreakdown, GeoBreakdown, TemporalBreakdown};
use crate::analytics::quality::ips_above;
use crate::analytics::session::returning_clicks;
use crate::analytics::{AggregateBucket, SessionQuality, SessionStats, SuspiciousIp, percentage, ratio};
use crate::storage::ClickEvent;

/// 安全洞察的单 IP 点击阈值
pub const SECURITY_IP_THRESHOLD: u64 = 50;
/// 增长对比窗口（天）
pub const GROWTH_WINDOW_DAYS: i64 = 7;

/// 某个值占全部点击的份额
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareMetric {
    pub label: String,
    pub clicks: u64,
    /// 展示用，保留两位小数
    pub percentage: f64,
    /// 未取整的比例（0..1），阈值判断使用
    #[serde(default)]
    pub raw_share: f64,
}

impl ShareMetric {
    pub fn of(label: impl Into<String>, clicks: u64, total: u64) -> Self {
        Self {
            label: label.into(),
            clicks,
            percentage: percentage(clicks, total),
            raw_share: ratio(clicks, total),
        }
    }
}

/// 规则输入
///
/// 全部字段都有零值默认，缺失的指标不会触发对应规则。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsightMetrics {
    pub total_clicks: u64,
    pub top_country: Option<ShareMetric>,
    pub distinct_countries: usize,
    pub top_device: Option<ShareMetric>,
    /// 标签为小时（"0".."23"）
    pub peak_hour: Option<ShareMetric>,
    pub heavy_ips: Vec<SuspiciousIp>,
    pub clicks_last_7_days: u64,
    pub clicks_previous_7_days: u64,
    pub returning_clicks: u64,
    pub total_sessions: u64,
    pub avg_session_depth: f64,
    /// 未取整的平均会话深度
    #[serde(default)]
    pub raw_avg_session_depth: f64,
    pub power_users_percentage: f64,
    pub session_quality: SessionQuality,
    pub source_diversity: usize,
    pub channels: Vec<AggregateBucket>,
}

/// 计算指标所需的中间结果
pub struct MetricSources<'a> {
    pub events: &'a [ClickEvent],
    pub geo: &'a GeoBreakdown,
    pub temporal: &'a TemporalBreakdown,
    pub audience: &'a AudienceBreakdown,
    pub sessions: &'a SessionStats,
    /// 参考时间
    pub now: DateTime<Utc>,
}

impl InsightMetrics {
    pub fn collect(sources: MetricSources<'_>) -> Self {
        let MetricSources {
            events,
            geo,
            temporal,
            audience,
            sessions,
            now,
        } = sources;
        let total = events.len() as u64;

        let top_country = geo
            .countries
            .first()
            .map(|c| ShareMetric::of(c.country.clone(), c.clicks, total));
        let top_device = audience
            .devices
            .first()
            .map(|d| ShareMetric::of(d.value.clone(), d.count, total));
        let peak_hour = temporal
            .peak_hour
            .as_ref()
            .map(|h| ShareMetric::of(h.hour.to_string(), h.clicks, temporal.total_clicks));

        let window = Duration::days(GROWTH_WINDOW_DAYS);
        let recent_start = now - window;
        let previous_start = recent_start - window;
        let clicks_last_7_days = events
            .iter()
            .filter(|e| e.timestamp >= recent_start && e.timestamp < now)
            .count() as u64;
        let clicks_previous_7_days = events
            .iter()
            .filter(|e| e.timestamp >= previous_start && e.timestamp < recent_start)
            .count() as u64;

        let source_diversity = events
            .iter()
            .map(ClickEvent::traffic_source)
            .collect::<HashSet<_>>()
            .len();

        Self {
            total_clicks: total,
            top_country,
            distinct_countries: geo.distinct_countries,
            top_device,
            peak_hour,
            heavy_ips: ips_above(events, SECURITY_IP_THRESHOLD),
            clicks_last_7_days,
            clicks_previous_7_days,
            returning_clicks: returning_clicks(events),
            total_sessions: sessions.total_sessions,
            avg_session_depth: sessions.avg_session_depth,
            raw_avg_session_depth: ratio(total, sessions.total_sessions),
            power_users_percentage: sessions.power_users_percentage,
            session_quality: sessions.session_quality,
            source_diversity,
            channels: audience.channels.clone(),
        }
    }
}
