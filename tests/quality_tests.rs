//! 流量质量与欺诈评分集成测试

use chrono::{DateTime, Duration, TimeZone, Utc};

use shortlinker_insights::analytics::QualityScorer;
use shortlinker_insights::analytics::quality::{rapid_click_pairs, security_overview};
use shortlinker_insights::storage::{ClickEvent, DeviceKind};

// =============================================================================
// 测试辅助函数
// =============================================================================

fn t() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 1, 18, 30, 0).unwrap()
}

fn click(id: i64, link_id: i64, ip: &str, secs: i64) -> ClickEvent {
    ClickEvent::new(id, link_id, t() + Duration::seconds(secs), ip)
}

// =============================================================================
// 快速点击
// =============================================================================

#[cfg(test)]
mod rapid_click_tests {
    use super::*;

    #[test]
    fn test_one_rapid_pair_for_t_t1_t5() {
        let events = vec![click(1, 1, "X", 0), click(2, 1, "X", 1), click(3, 1, "X", 5)];
        assert_eq!(rapid_click_pairs(&events), 1);
        assert_eq!(QualityScorer::default().score(&events).rapid_click_pairs, 1);
    }

    #[test]
    fn test_rapid_pairs_independent_of_input_order() {
        let events = vec![click(3, 1, "X", 5), click(1, 1, "X", 0), click(2, 1, "X", 1)];
        assert_eq!(rapid_click_pairs(&events), 1);
    }

    #[test]
    fn test_bursts_counted_per_consecutive_pair() {
        let events: Vec<ClickEvent> = (0..5).map(|i| click(i, 1, "burst", 0)).collect();
        assert_eq!(rapid_click_pairs(&events), 4);
    }
}

// =============================================================================
// 质量分
// =============================================================================

#[cfg(test)]
mod score_tests {
    use super::*;

    #[test]
    fn test_score_is_zero_without_clicks() {
        let report = QualityScorer::default().score(&[]);
        assert_eq!(report.quality_score, 0.0);
        assert_eq!(report.bot_percentage, 0.0);
        assert_eq!(report.unique_visitor_ratio, 0.0);
    }

    #[test]
    fn test_score_always_within_bounds() {
        let mut events = Vec::new();
        for i in 0..40 {
            let mut event = click(i, 1, &format!("ip-{}", i % 7), i * 3)
                .with_country(["US", "MX", "CA"][(i % 3) as usize]);
            if i % 4 == 0 {
                event = event.with_device(DeviceKind::Bot);
            }
            events.push(event);
            let report = QualityScorer::default().score(&events);
            assert!((0.0..=100.0).contains(&report.quality_score));
        }
    }

    #[test]
    fn test_all_bots_from_one_ip() {
        let events: Vec<ClickEvent> = (0..12)
            .map(|i| click(i, 1, "203.0.113.9", i * 60).with_device(DeviceKind::Bot))
            .collect();
        let report = QualityScorer::default().score(&events);
        assert_eq!(report.human, 0);
        assert_eq!(report.bot_percentage, 100.0);
        // 0 + (1/12)*0.3 + 0 = 0.025
        assert_eq!(report.quality_score, 2.5);
        assert_eq!(report.suspicious_ip_count, 1);
        assert_eq!(report.device_diversity, 1);
        assert_eq!(report.recommendations.len(), 3);
    }
}

// =============================================================================
// 跨链接安全概览
// =============================================================================

#[cfg(test)]
mod security_tests {
    use super::*;

    #[test]
    fn test_threshold_applies_across_links() {
        // 同一 IP 在两个链接上共 101 次点击
        let mut events: Vec<ClickEvent> = (0..60).map(|i| click(i, 1, "hot", i * 10)).collect();
        events.extend((60..101).map(|i| click(i, 2, "hot", i * 10)));
        let overview = security_overview(&events);
        assert_eq!(overview.suspicious_ips.len(), 1);
        assert_eq!(overview.suspicious_ips[0].clicks, 101);

        // 单链接质量报告使用 10 的阈值
        let per_link = QualityScorer::default().score(&events[..60]);
        assert_eq!(per_link.suspicious_ip_count, 1);
    }
}
