//! Traffic quality and fraud scoring
//!
//! Bot share, suspicious IP volume, rapid repeat clicks and the weighted
//! 0–100 quality score:
//!
//! ```text
//! score = round((human_ratio * 0.5 + unique_ip_ratio * 0.3 + geo_score * 0.2) * 100, 1)
//! geo_score = min(distinct_countries / 5, 1)
//! ```

use std::collections::HashSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::aggregation::OrderedCounter;
use super::session::SessionReconstructor;
use super::{finite_or_zero, percentage, ratio, round_to};
use crate::storage::ClickEvent;

/// 单链接质量报告的可疑 IP 阈值
pub const LINK_SUSPICIOUS_THRESHOLD: u64 = 10;
/// 跨链接安全概览的可疑 IP 阈值
pub const GLOBAL_SUSPICIOUS_THRESHOLD: u64 = 100;
/// 同一 IP 两次点击间隔小于该值视为快速点击（秒）
pub const RAPID_CLICK_SECS: i64 = 2;

const HUMAN_WEIGHT: f64 = 0.5;
const UNIQUE_IP_WEIGHT: f64 = 0.3;
const GEO_WEIGHT: f64 = 0.2;
const GEO_SATURATION: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspiciousIp {
    pub ip: String,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityReport {
    pub total: u64,
    pub human: u64,
    pub bot: u64,
    pub bot_percentage: f64,
    pub unique_ips: u64,
    pub unique_visitor_ratio: f64,
    /// 0–100
    pub quality_score: f64,
    pub suspicious_ip_count: usize,
    pub suspicious_ips: Vec<SuspiciousIp>,
    pub rapid_click_pairs: u64,
    /// 已知国家数
    pub geo_diversity: usize,
    /// 设备类型数
    pub device_diversity: usize,
    pub recommendations: Vec<String>,
}

/// 跨链接安全概览
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SecurityOverview {
    pub threshold: u64,
    pub suspicious_ips: Vec<SuspiciousIp>,
    pub rapid_click_pairs: u64,
    pub bot_clicks: u64,
    pub bot_percentage: f64,
}

/// 按点击数统计 IP，返回超过阈值的 IP（数量降序）
pub fn ips_above(events: &[ClickEvent], threshold: u64) -> Vec<SuspiciousIp> {
    let mut counter = OrderedCounter::new();
    for event in events {
        counter.add(event.ip.as_str());
    }
    counter
        .into_sorted()
        .into_iter()
        .take_while(|(_, clicks)| *clicks > threshold)
        .map(|(ip, clicks)| SuspiciousIp {
            ip: ip.to_string(),
            clicks,
        })
        .collect()
}

/// 同一 IP 相邻点击间隔小于 2 秒的对数
pub fn rapid_click_pairs(events: &[ClickEvent]) -> u64 {
    let window = Duration::seconds(RAPID_CLICK_SECS);
    SessionReconstructor::partition_by_ip(events)
        .values()
        .map(|clicks| {
            clicks
                .windows(2)
                .filter(|pair| pair[1].timestamp - pair[0].timestamp < window)
                .count() as u64
        })
        .sum()
}

/// 加权质量分，无点击时为 0
pub fn quality_score(total: u64, human: u64, unique_ips: u64, countries: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let geo_score = (countries as f64 / GEO_SATURATION).min(1.0);
    let raw = ratio(human, total) * HUMAN_WEIGHT
        + ratio(unique_ips, total) * UNIQUE_IP_WEIGHT
        + geo_score * GEO_WEIGHT;
    round_to(raw * 100.0, 1).clamp(0.0, 100.0)
}

#[derive(Debug, Clone)]
pub struct QualityScorer {
    suspicious_threshold: u64,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(LINK_SUSPICIOUS_THRESHOLD)
    }
}

impl QualityScorer {
    pub fn new(suspicious_threshold: u64) -> Self {
        Self {
            suspicious_threshold,
        }
    }

    pub fn score(&self, events: &[ClickEvent]) -> QualityReport {
        let total = events.len() as u64;
        let bot = events.iter().filter(|e| e.device.is_bot()).count() as u64;
        let human = total - bot;
        let unique_ips = events
            .iter()
            .map(|e| e.ip.as_str())
            .collect::<HashSet<_>>()
            .len() as u64;
        let geo_diversity = events
            .iter()
            .filter_map(|e| e.geo.known_country())
            .collect::<HashSet<_>>()
            .len();
        let device_diversity = events
            .iter()
            .map(|e| e.device)
            .collect::<HashSet<_>>()
            .len();
        let suspicious_ips = ips_above(events, self.suspicious_threshold);

        let bot_percentage = percentage(bot, total);
        let unique_visitor_ratio = round_to(ratio(unique_ips, total), 4);

        QualityReport {
            total,
            human,
            bot,
            bot_percentage,
            unique_ips,
            unique_visitor_ratio,
            quality_score: quality_score(total, human, unique_ips, geo_diversity),
            suspicious_ip_count: suspicious_ips.len(),
            suspicious_ips,
            rapid_click_pairs: rapid_click_pairs(events),
            geo_diversity,
            device_diversity,
            recommendations: recommendations(
                total,
                ratio(bot, total),
                ratio(unique_ips, total),
                geo_diversity,
            ),
        }
    }
}

/// 固定顺序：机器人比例、访客唯一性、地理多样性
///
/// 比例均为未取整的 0..1 值。
fn recommendations(total: u64, bot_ratio: f64, unique_ratio: f64, countries: usize) -> Vec<String> {
    let mut out = Vec::new();
    if total == 0 {
        return out;
    }
    if finite_or_zero(bot_ratio) > 0.2 {
        out.push(format!(
            "Bot traffic is {:.1}% of all clicks; consider filtering automated visitors",
            bot_ratio * 100.0
        ));
    }
    if unique_ratio < 0.3 {
        out.push(
            "Few unique visitors relative to clicks; check for repeated clicks from the same sources"
                .to_string(),
        );
    }
    if countries < 3 {
        out.push(
            "Traffic comes from fewer than 3 countries; consider promoting the link in new markets"
                .to_string(),
        );
    }
    out
}

/// 跨链接安全扫描（阈值 100）
pub fn security_overview(events: &[ClickEvent]) -> SecurityOverview {
    let total = events.len() as u64;
    let bot_clicks = events.iter().filter(|e| e.device.is_bot()).count() as u64;
    SecurityOverview {
        threshold: GLOBAL_SUSPICIOUS_THRESHOLD,
        suspicious_ips: ips_above(events, GLOBAL_SUSPICIOUS_THRESHOLD),
        rapid_click_pairs: rapid_click_pairs(events),
        bot_clicks,
        bot_percentage: percentage(bot_clicks, total),
    }
}
