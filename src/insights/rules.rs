//! Built-in insight rules
//!
//! Thresholds, confidence and impact are fixed per rule. Thresholds are
//! checked against unrounded ratios; rounded values are for display only.

use super::metrics::{InsightMetrics, ShareMetric};
use super::{Insight, InsightData, InsightType, Priority};
use crate::analytics::{finite_or_zero, percentage, ratio, round_to};

pub trait InsightRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight>;
}

/// 默认规则集，按评估顺序排列
pub fn default_rules() -> Vec<Box<dyn InsightRule>> {
    vec![
        Box::new(PrimaryMarketRule),
        Box::new(DevicePreferenceRule),
        Box::new(PeakHourRule),
        Box::new(TrafficVolumeRule),
        Box::new(InternationalReachRule),
        Box::new(SuspiciousActivityRule),
        Box::new(GrowthTrendRule),
        Box::new(RetentionRule),
        Box::new(SessionDepthRule),
        Box::new(TrafficSourceRule),
    ]
}

fn share_data(share: &ShareMetric) -> Option<InsightData> {
    Some(InsightData::Share {
        label: share.label.clone(),
        clicks: share.clicks,
        percentage: share.percentage,
    })
}

// ============ 地理 ============

pub struct PrimaryMarketRule;

impl InsightRule for PrimaryMarketRule {
    fn name(&self) -> &'static str {
        "primary_market"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        let country = metrics.top_country.as_ref()?;
        if metrics.total_clicks == 0 {
            return None;
        }
        let dominant = country.raw_share > 0.5;
        Some(Insight {
            insight_type: InsightType::Geographic,
            title: "Primary Market".to_string(),
            description: format!(
                "{} generates {:.1}% of all clicks",
                country.label, country.percentage
            ),
            priority: if dominant { Priority::High } else { Priority::Medium },
            actionable: true,
            confidence: 0.9,
            impact_score: 8,
            recommendation: Some(if dominant {
                format!(
                    "Localize content and campaigns for {} to capitalize on its dominance",
                    country.label
                )
            } else {
                format!(
                    "{} leads a mixed audience; test localized variants for the top markets",
                    country.label
                )
            }),
            data_points: share_data(country),
        })
    }
}

pub struct InternationalReachRule;

impl InsightRule for InternationalReachRule {
    fn name(&self) -> &'static str {
        "international_reach"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        let countries = metrics.distinct_countries;
        if countries <= 5 {
            return None;
        }
        Some(Insight {
            insight_type: InsightType::Reach,
            title: "International Reach".to_string(),
            description: format!("Clicks arrived from {} different countries", countries),
            priority: if countries > 10 {
                Priority::High
            } else {
                Priority::Medium
            },
            actionable: false,
            confidence: 0.9,
            impact_score: 7,
            recommendation: Some(
                "Consider multi-language landing pages for international visitors".to_string(),
            ),
            data_points: Some(InsightData::Count {
                value: countries as u64,
            }),
        })
    }
}

// ============ 受众 ============

pub struct DevicePreferenceRule;

impl InsightRule for DevicePreferenceRule {
    fn name(&self) -> &'static str {
        "device_preference"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        let device = metrics.top_device.as_ref()?;
        if metrics.total_clicks == 0 {
            return None;
        }
        Some(Insight {
            insight_type: InsightType::Device,
            title: "Device Preference".to_string(),
            description: format!(
                "{:.1}% of clicks come from {} devices",
                device.percentage, device.label
            ),
            priority: if device.raw_share > 0.7 {
                Priority::High
            } else {
                Priority::Medium
            },
            actionable: true,
            confidence: 0.85,
            impact_score: 7,
            recommendation: Some(format!(
                "Make sure the destination page is optimized for {} visitors",
                device.label
            )),
            data_points: share_data(device),
        })
    }
}

// ============ 时间 ============

pub struct PeakHourRule;

impl InsightRule for PeakHourRule {
    fn name(&self) -> &'static str {
        "peak_hour"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        let peak = metrics.peak_hour.as_ref()?;
        if peak.raw_share <= 0.15 {
            return None;
        }
        Some(Insight {
            insight_type: InsightType::Temporal,
            title: "Peak Hour".to_string(),
            description: format!(
                "Traffic peaks at {}:00 UTC with {:.1}% of clicks",
                peak.label, peak.percentage
            ),
            priority: Priority::Medium,
            actionable: true,
            confidence: 0.8,
            impact_score: 6,
            recommendation: Some(format!(
                "Schedule posts and campaigns shortly before {}:00 UTC",
                peak.label
            )),
            data_points: share_data(peak),
        })
    }
}

pub struct TrafficVolumeRule;

impl InsightRule for TrafficVolumeRule {
    fn name(&self) -> &'static str {
        "traffic_volume"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        let total = metrics.total_clicks;
        if total <= 100 {
            return None;
        }
        Some(Insight {
            insight_type: InsightType::Volume,
            title: "Good Traffic Volume".to_string(),
            description: format!("This link has received {} clicks", total),
            priority: if total > 1000 {
                Priority::High
            } else {
                Priority::Medium
            },
            actionable: false,
            confidence: 0.95,
            impact_score: 5,
            recommendation: None,
            data_points: Some(InsightData::Count { value: total }),
        })
    }
}

pub struct GrowthTrendRule;

impl InsightRule for GrowthTrendRule {
    fn name(&self) -> &'static str {
        "growth_trend"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        let current = metrics.clicks_last_7_days;
        let previous = metrics.clicks_previous_7_days;
        // 前一窗口为空：数据不足
        if previous == 0 {
            return None;
        }
        let delta = finite_or_zero((current as f64 - previous as f64) / previous as f64);
        if delta.abs() <= 0.2 {
            return None;
        }
        let change = round_to(delta * 100.0, 2);

        let growing = delta > 0.0;
        Some(Insight {
            insight_type: InsightType::Growth,
            title: if growing {
                "Accelerated Growth"
            } else {
                "Engagement Decline"
            }
            .to_string(),
            description: format!(
                "Clicks {} {:.1}% over the last 7 days ({} vs {})",
                if growing { "grew" } else { "dropped" },
                change.abs(),
                current,
                previous
            ),
            priority: if delta.abs() >= 0.5 {
                Priority::High
            } else {
                Priority::Medium
            },
            actionable: true,
            confidence: 0.8,
            impact_score: 9,
            recommendation: Some(if growing {
                "Identify the channels driving the growth and increase investment there".to_string()
            } else {
                "Refresh the link promotion or review recent changes to the campaign".to_string()
            }),
            data_points: Some(InsightData::Growth {
                current,
                previous,
                change_percentage: change,
            }),
        })
    }
}

// ============ 安全 ============

pub struct SuspiciousActivityRule;

impl InsightRule for SuspiciousActivityRule {
    fn name(&self) -> &'static str {
        "suspicious_activity"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        if metrics.heavy_ips.is_empty() {
            return None;
        }
        Some(Insight {
            insight_type: InsightType::Security,
            title: "Suspicious Activity".to_string(),
            description: format!(
                "{} IP address(es) exceeded 50 clicks on this link",
                metrics.heavy_ips.len()
            ),
            priority: Priority::High,
            actionable: true,
            confidence: 0.7,
            impact_score: 9,
            recommendation: Some(
                "Review the listed IPs and consider rate limiting or blocking them".to_string(),
            ),
            data_points: Some(InsightData::SuspiciousIps {
                ips: metrics.heavy_ips.clone(),
            }),
        })
    }
}

// ============ 参与度 ============

/// `share` 为回访点击占比（0..1）
fn retention_benchmark(share: f64) -> &'static str {
    if share >= 0.4 {
        "excellent"
    } else if share >= 0.25 {
        "good"
    } else if share >= 0.15 {
        "average"
    } else {
        "needs improvement"
    }
}

pub struct RetentionRule;

impl InsightRule for RetentionRule {
    fn name(&self) -> &'static str {
        "retention"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        if metrics.total_clicks == 0 {
            return None;
        }
        let share = ratio(metrics.returning_clicks, metrics.total_clicks);
        let rate = percentage(metrics.returning_clicks, metrics.total_clicks);
        let benchmark = retention_benchmark(share);
        let priority = if share < 0.15 {
            Priority::High
        } else if share >= 0.25 {
            Priority::Low
        } else {
            Priority::Medium
        };
        Some(Insight {
            insight_type: InsightType::Retention,
            title: "Visitor Retention".to_string(),
            description: format!("{:.1}% of clicks come from returning visitors ({})", rate, benchmark),
            priority,
            actionable: priority != Priority::Low,
            confidence: 0.75,
            impact_score: 7,
            recommendation: (priority != Priority::Low).then(|| {
                "Give visitors a reason to come back, e.g. follow-up content or reminders"
                    .to_string()
            }),
            data_points: Some(InsightData::Rate {
                percentage: rate,
                benchmark: benchmark.to_string(),
            }),
        })
    }
}

pub struct SessionDepthRule;

impl InsightRule for SessionDepthRule {
    fn name(&self) -> &'static str {
        "session_depth"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        if metrics.total_sessions == 0 {
            return None;
        }
        let depth = metrics.avg_session_depth;
        let raw_depth = metrics.raw_avg_session_depth;
        let priority = if raw_depth < 1.5 {
            Priority::High
        } else if raw_depth < 2.5 {
            Priority::Medium
        } else {
            Priority::Low
        };
        Some(Insight {
            insight_type: InsightType::Engagement,
            title: "Session Engagement".to_string(),
            description: format!(
                "Visitors average {:.2} clicks per session ({})",
                depth,
                metrics.session_quality.label()
            ),
            priority,
            actionable: priority == Priority::High,
            confidence: 0.75,
            impact_score: 6,
            recommendation: (priority == Priority::High).then(|| {
                "Most sessions are single clicks; add related links to encourage deeper visits"
                    .to_string()
            }),
            data_points: Some(InsightData::Sessions {
                avg_depth: depth,
                quality: metrics.session_quality,
                power_users_percentage: metrics.power_users_percentage,
            }),
        })
    }
}

// ============ 来源 ============

pub struct TrafficSourceRule;

impl InsightRule for TrafficSourceRule {
    fn name(&self) -> &'static str {
        "traffic_sources"
    }

    fn evaluate(&self, metrics: &InsightMetrics) -> Option<Insight> {
        let diversity = metrics.source_diversity;
        if metrics.total_clicks == 0 || diversity == 0 {
            return None;
        }
        let narrow = diversity < 3;
        let top_channel = metrics
            .channels
            .first()
            .map(|c| format!("; {} leads with {:.1}%", c.value, c.percentage))
            .unwrap_or_default();
        Some(Insight {
            insight_type: InsightType::TrafficSource,
            title: "Traffic Sources".to_string(),
            description: format!("Traffic comes from {} distinct sources{}", diversity, top_channel),
            priority: if narrow { Priority::High } else { Priority::Low },
            actionable: narrow,
            confidence: 0.8,
            impact_score: 6,
            recommendation: narrow.then(|| {
                "Diversify promotion across social, search and email to reduce dependency"
                    .to_string()
            }),
            data_points: Some(InsightData::Sources {
                diversity,
                channels: metrics.channels.clone(),
            }),
        })
    }
}
