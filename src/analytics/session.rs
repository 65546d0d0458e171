//! Session reconstruction
//!
//! Clicks are partitioned by IP, sorted by time, and split into sessions
//! whenever the gap to the previous click reaches the inactivity window
//! (30 minutes by default). A gap of exactly the window starts a new
//! session; anything shorter stays in the current one.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{percentage, round_to};
use crate::storage::ClickEvent;

/// 深度达到该值的会话计为重度用户
pub const POWER_USER_DEPTH: usize = 5;

/// 单个 IP 的一段连续访问
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub ip: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub depth: usize,
}

impl Session {
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds().max(0)
    }
}

/// 会话质量标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionQuality {
    Excellent,
    Good,
    Average,
    #[default]
    Low,
}

impl SessionQuality {
    pub fn from_avg_depth(avg_depth: f64) -> Self {
        if avg_depth >= 4.0 {
            SessionQuality::Excellent
        } else if avg_depth >= 2.5 {
            SessionQuality::Good
        } else if avg_depth >= 1.5 {
            SessionQuality::Average
        } else {
            SessionQuality::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionQuality::Excellent => "excellent",
            SessionQuality::Good => "good",
            SessionQuality::Average => "average",
            SessionQuality::Low => "low",
        }
    }
}

/// 某个深度的会话数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthBucket {
    pub depth: usize,
    pub sessions: u64,
    pub percentage: f64,
}

/// 会话统计
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_sessions: u64,
    pub avg_session_depth: f64,
    pub power_users_percentage: f64,
    pub avg_session_duration_secs: f64,
    pub depth_distribution: Vec<DepthBucket>,
    pub session_quality: SessionQuality,
}

#[derive(Debug, Clone)]
pub struct SessionReconstructor {
    gap: Duration,
}

impl Default for SessionReconstructor {
    fn default() -> Self {
        Self::new(Duration::minutes(30))
    }
}

impl SessionReconstructor {
    pub fn new(gap: Duration) -> Self {
        Self { gap }
    }

    /// 按 IP 分组，组内按 (timestamp, id) 升序
    ///
    /// 结果与输入顺序无关。
    pub fn partition_by_ip(events: &[ClickEvent]) -> BTreeMap<&str, Vec<&ClickEvent>> {
        let mut partitions: BTreeMap<&str, Vec<&ClickEvent>> = BTreeMap::new();
        for event in events {
            partitions.entry(event.ip.as_str()).or_default().push(event);
        }
        for clicks in partitions.values_mut() {
            clicks.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        }
        partitions
    }

    /// 重建所有会话，按 IP 再按开始时间排序
    pub fn reconstruct(&self, events: &[ClickEvent]) -> Vec<Session> {
        let mut sessions = Vec::new();
        for (ip, clicks) in Self::partition_by_ip(events) {
            self.split_sorted(ip, &clicks, &mut sessions);
        }
        sessions
    }

    fn split_sorted(&self, ip: &str, clicks: &[&ClickEvent], out: &mut Vec<Session>) {
        let Some(first) = clicks.first() else {
            return;
        };

        let mut current = Session {
            ip: ip.to_string(),
            start: first.timestamp,
            end: first.timestamp,
            depth: 1,
        };
        for click in &clicks[1..] {
            if click.timestamp - current.end >= self.gap {
                let next = Session {
                    ip: ip.to_string(),
                    start: click.timestamp,
                    end: click.timestamp,
                    depth: 1,
                };
                out.push(std::mem::replace(&mut current, next));
            } else {
                current.end = click.timestamp;
                current.depth += 1;
            }
        }
        out.push(current);
    }

    /// 会话深度统计
    pub fn stats(&self, events: &[ClickEvent]) -> SessionStats {
        let sessions = self.reconstruct(events);
        summarize(&sessions)
    }
}

/// 汇总会话列表
pub fn summarize(sessions: &[Session]) -> SessionStats {
    let total_sessions = sessions.len() as u64;
    if total_sessions == 0 {
        return SessionStats::default();
    }

    let mut by_depth: BTreeMap<usize, u64> = BTreeMap::new();
    let mut total_duration = 0i64;
    for session in sessions {
        *by_depth.entry(session.depth).or_insert(0) += 1;
        total_duration += session.duration_secs();
    }

    let weighted: u64 = by_depth
        .iter()
        .map(|(depth, count)| *depth as u64 * count)
        .sum();
    let avg_depth = weighted as f64 / total_sessions as f64;
    let power_sessions: u64 = by_depth
        .range(POWER_USER_DEPTH..)
        .map(|(_, count)| count)
        .sum();

    SessionStats {
        total_sessions,
        avg_session_depth: round_to(avg_depth, 2),
        power_users_percentage: percentage(power_sessions, total_sessions),
        avg_session_duration_secs: round_to(total_duration as f64 / total_sessions as f64, 1),
        depth_distribution: by_depth
            .into_iter()
            .map(|(depth, sessions)| DepthBucket {
                depth,
                sessions,
                percentage: percentage(sessions, total_sessions),
            })
            .collect(),
        session_quality: SessionQuality::from_avg_depth(avg_depth),
    }
}

/// 回访点击数：同一 IP 在更早时刻已经访问过该集合中的链接
pub fn returning_clicks(events: &[ClickEvent]) -> u64 {
    let distinct: HashSet<&str> = events.iter().map(|e| e.ip.as_str()).collect();
    (events.len() - distinct.len()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn click(id: i64, ip: &str, offset_secs: i64) -> ClickEvent {
        ClickEvent::new(id, 1, t0() + Duration::seconds(offset_secs), ip)
    }

    #[test]
    fn test_single_event_is_depth_one() {
        let sessions = SessionReconstructor::default().reconstruct(&[click(1, "a", 0)]);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].depth, 1);
        assert_eq!(sessions[0].duration_secs(), 0);
    }

    #[test]
    fn test_gap_boundary() {
        let reconstructor = SessionReconstructor::default();

        let exactly = [click(1, "a", 0), click(2, "a", 30 * 60)];
        assert_eq!(reconstructor.reconstruct(&exactly).len(), 2);

        let just_under = [click(1, "a", 0), click(2, "a", 30 * 60 - 1)];
        let sessions = reconstructor.reconstruct(&just_under);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].depth, 2);
    }

    #[test]
    fn test_gap_is_measured_from_previous_click() {
        // 每次间隔 20 分钟，总跨度超过 30 分钟仍属同一会话
        let events = [click(1, "a", 0), click(2, "a", 1200), click(3, "a", 2400)];
        let sessions = SessionReconstructor::default().reconstruct(&events);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].depth, 3);
        assert_eq!(sessions[0].duration_secs(), 2400);
    }

    #[test]
    fn test_sessions_never_span_ips() {
        let events = [click(1, "a", 0), click(2, "b", 10), click(3, "a", 20)];
        let sessions = SessionReconstructor::default().reconstruct(&events);
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().any(|s| s.ip == "a" && s.depth == 2));
        assert!(sessions.iter().any(|s| s.ip == "b" && s.depth == 1));
    }

    #[test]
    fn test_stats_derived_metrics() {
        // a: 深度 5；b: 深度 1；c: 深度 2 和 1
        let mut events = Vec::new();
        for i in 0..5 {
            events.push(click(i, "a", i * 60));
        }
        events.push(click(10, "b", 0));
        events.push(click(11, "c", 0));
        events.push(click(12, "c", 60));
        events.push(click(13, "c", 60 + 3600));

        let stats = SessionReconstructor::default().stats(&events);
        assert_eq!(stats.total_sessions, 4);
        assert_eq!(stats.avg_session_depth, 2.25);
        assert_eq!(stats.power_users_percentage, 25.0);
        assert_eq!(stats.session_quality, SessionQuality::Average);
        let depths: Vec<(usize, u64)> = stats
            .depth_distribution
            .iter()
            .map(|b| (b.depth, b.sessions))
            .collect();
        assert_eq!(depths, vec![(1, 2), (2, 1), (5, 1)]);
    }

    #[test]
    fn test_empty_input_yields_default_stats() {
        let stats = SessionReconstructor::default().stats(&[]);
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.avg_session_depth, 0.0);
        assert_eq!(stats.session_quality, SessionQuality::Low);
    }

    #[test]
    fn test_quality_labels() {
        assert_eq!(SessionQuality::from_avg_depth(4.0), SessionQuality::Excellent);
        assert_eq!(SessionQuality::from_avg_depth(2.5), SessionQuality::Good);
        assert_eq!(SessionQuality::from_avg_depth(1.5), SessionQuality::Average);
        assert_eq!(SessionQuality::from_avg_depth(1.49), SessionQuality::Low);
    }

    #[test]
    fn test_returning_clicks() {
        let events = [click(1, "a", 0), click(2, "a", 5000), click(3, "b", 0)];
        assert_eq!(returning_clicks(&events), 1);
        assert_eq!(returning_clicks(&[]), 0);
    }
}
