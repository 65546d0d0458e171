use serde::{Deserialize, Serialize};
use tracing::trace;

use super::metrics::InsightMetrics;
use super::rules::{InsightRule, default_rules};
use super::{Insight, Priority};
use crate::analytics::round_to;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsightSummary {
    pub total_insights: usize,
    pub high_priority: usize,
    pub actionable_insights: usize,
    /// 置信度平均值，无洞察时为 0
    pub avg_confidence: f64,
}

impl InsightSummary {
    pub fn from_insights(insights: &[Insight]) -> Self {
        let total = insights.len();
        let avg_confidence = if total == 0 {
            0.0
        } else {
            insights.iter().map(|i| i.confidence).sum::<f64>() / total as f64
        };
        Self {
            total_insights: total,
            high_priority: insights
                .iter()
                .filter(|i| i.priority == Priority::High)
                .count(),
            actionable_insights: insights.iter().filter(|i| i.actionable).count(),
            avg_confidence: round_to(avg_confidence, 3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsightSet {
    pub insights: Vec<Insight>,
    pub summary: InsightSummary,
}

pub struct InsightGenerator {
    rules: Vec<Box<dyn InsightRule>>,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::with_rules(default_rules())
    }
}

impl InsightGenerator {
    pub fn with_rules(rules: Vec<Box<dyn InsightRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// 依次评估规则
    ///
    /// 默认保持规则顺序；`sort_by_priority` 时按优先级稳定排序（High 在前）。
    pub fn generate(&self, metrics: &InsightMetrics, sort_by_priority: bool) -> InsightSet {
        let mut insights: Vec<Insight> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let insight = rule.evaluate(metrics);
                trace!("Insight rule {} fired: {}", rule.name(), insight.is_some());
                insight
            })
            .collect();

        if sort_by_priority {
            insights.sort_by(|a, b| b.priority.cmp(&a.priority));
        }

        let summary = InsightSummary::from_insights(&insights);
        InsightSet { insights, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::ShareMetric;

    fn metrics() -> InsightMetrics {
        InsightMetrics {
            total_clicks: 200,
            top_country: Some(ShareMetric::of("Japan", 60, 200)),
            returning_clicks: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_rule_order_is_preserved() {
        let set = InsightGenerator::default().generate(&metrics(), false);
        let titles: Vec<&str> = set.insights.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Primary Market", "Good Traffic Volume", "Visitor Retention"]
        );
        assert_eq!(set.summary.total_insights, 3);
        assert_eq!(set.summary.high_priority, 0);
        assert_eq!(set.summary.actionable_insights, 1);
        assert_eq!(set.summary.avg_confidence, round_to((0.9 + 0.95 + 0.75) / 3.0, 3));
    }

    #[test]
    fn test_sort_by_priority_is_stable() {
        let mut m = metrics();
        m.returning_clicks = 0;
        let set = InsightGenerator::default().generate(&m, true);
        let titles: Vec<&str> = set.insights.iter().map(|i| i.title.as_str()).collect();
        // Retention 为 High，其余两个 Medium 保持原顺序
        assert_eq!(
            titles,
            vec!["Visitor Retention", "Primary Market", "Good Traffic Volume"]
        );
    }

    #[test]
    fn test_empty_metrics_yield_empty_summary() {
        let set = InsightGenerator::default().generate(&InsightMetrics::default(), false);
        assert!(set.insights.is_empty());
        assert_eq!(set.summary.avg_confidence, 0.0);
    }

    #[test]
    fn test_custom_rules() {
        let generator = InsightGenerator::with_rules(Vec::new());
        assert!(generator.rule_names().is_empty());
        assert!(generator.generate(&metrics(), false).insights.is_empty());
    }
}
