//! Insight rule engine
//!
//! An ordered list of independent rules, each reading pre-computed
//! [`InsightMetrics`] and emitting at most one [`Insight`]. Rules never see
//! each other's output; evaluation order only decides output order.

pub mod generator;
pub mod metrics;
pub mod rules;

pub use generator::{InsightGenerator, InsightSet, InsightSummary};
pub use metrics::{InsightMetrics, MetricSources, ShareMetric};
pub use rules::{InsightRule, default_rules};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::analytics::{AggregateBucket, SessionQuality, SuspiciousIp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsightType {
    Geographic,
    Device,
    Temporal,
    Volume,
    Reach,
    Security,
    Growth,
    Retention,
    Engagement,
    TrafficSource,
}

/// 优先级，`High` 最大
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// 洞察附带的结构化数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsightData {
    Share {
        label: String,
        clicks: u64,
        percentage: f64,
    },
    Count {
        value: u64,
    },
    Growth {
        current: u64,
        previous: u64,
        change_percentage: f64,
    },
    Rate {
        percentage: f64,
        benchmark: String,
    },
    SuspiciousIps {
        ips: Vec<SuspiciousIp>,
    },
    Sessions {
        avg_depth: f64,
        quality: SessionQuality,
        power_users_percentage: f64,
    },
    Sources {
        diversity: usize,
        channels: Vec<AggregateBucket>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub actionable: bool,
    /// 0–1
    pub confidence: f64,
    /// 0–10
    pub impact_score: u8,
    pub recommendation: Option<String>,
    pub data_points: Option<InsightData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::High.to_string(), "high");
    }

    #[test]
    fn test_insight_serializes_type_field() {
        let insight = Insight {
            insight_type: InsightType::TrafficSource,
            title: "Traffic Sources".into(),
            description: String::new(),
            priority: Priority::Low,
            actionable: false,
            confidence: 0.8,
            impact_score: 6,
            recommendation: None,
            data_points: Some(InsightData::Count { value: 3 }),
        };
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["type"], "traffic_source");
        assert_eq!(json["priority"], "low");
        assert_eq!(json["data_points"]["kind"], "count");
    }
}
