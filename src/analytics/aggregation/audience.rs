use serde::{Deserialize, Serialize};

use super::{AggregateBucket, Dimension, OrderedCounter, count_buckets};
use crate::analytics::channel::Channel;
use crate::analytics::round_to;
use crate::storage::{ClickEvent, DeviceKind};

/// 按设备统计的响应时间（毫秒）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeStat {
    pub device: DeviceKind,
    pub samples: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// 受众分布
///
/// 设备、浏览器、系统、渠道以全部点击为分母；语言只统计带 Accept-Language
/// 的点击。`top_sources` 为 Top-N，其余列表完整返回。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudienceBreakdown {
    pub total_clicks: u64,
    pub devices: Vec<AggregateBucket>,
    pub browsers: Vec<AggregateBucket>,
    pub operating_systems: Vec<AggregateBucket>,
    pub languages: Vec<AggregateBucket>,
    pub channels: Vec<AggregateBucket>,
    pub top_sources: Vec<AggregateBucket>,
    pub response_times: Vec<ResponseTimeStat>,
}

fn label(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

struct ResponseAcc {
    samples: u64,
    sum: f64,
    min: f64,
    max: f64,
}

fn response_times(events: &[ClickEvent]) -> Vec<ResponseTimeStat> {
    let mut counter = OrderedCounter::new();
    let mut acc: Vec<ResponseAcc> = Vec::new();

    for event in events {
        let Some(ms) = event.response_time.filter(|v| v.is_finite()) else {
            continue;
        };
        let pos = counter.add(event.device);
        if pos == acc.len() {
            acc.push(ResponseAcc {
                samples: 0,
                sum: 0.0,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            });
        }
        let slot = &mut acc[pos];
        slot.samples += 1;
        slot.sum += ms;
        slot.min = slot.min.min(ms);
        slot.max = slot.max.max(ms);
    }

    counter
        .into_sorted_with_position()
        .into_iter()
        .map(|(pos, device, _)| {
            let slot = &acc[pos];
            ResponseTimeStat {
                device,
                samples: slot.samples,
                avg_ms: round_to(slot.sum / slot.samples as f64, 2),
                min_ms: round_to(slot.min, 2),
                max_ms: round_to(slot.max, 2),
            }
        })
        .collect()
}

pub fn audience_breakdown(events: &[ClickEvent], top_n: usize) -> AudienceBreakdown {
    AudienceBreakdown {
        total_clicks: events.len() as u64,
        devices: count_buckets(
            Dimension::Device,
            events.iter().map(|e| e.device.to_string()),
            None,
        ),
        browsers: count_buckets(
            Dimension::Browser,
            events.iter().map(|e| label(&e.browser)),
            None,
        ),
        operating_systems: count_buckets(Dimension::Os, events.iter().map(|e| label(&e.os)), None),
        languages: count_buckets(
            Dimension::Language,
            events.iter().filter_map(ClickEvent::primary_language),
            None,
        ),
        channels: count_buckets(
            Dimension::Channel,
            events
                .iter()
                .map(|e| Channel::classify(&e.traffic_source()).to_string()),
            None,
        ),
        top_sources: count_buckets(
            Dimension::Source,
            events.iter().map(ClickEvent::traffic_source),
            Some(top_n),
        ),
        response_times: response_times(events),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn click(id: i64) -> ClickEvent {
        ClickEvent::new(id, 1, Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap(), "a")
    }

    #[test]
    fn test_device_and_browser_breakdown() {
        let events = vec![
            click(1).with_device(DeviceKind::Mobile).with_browser("Safari", "iOS"),
            click(2).with_device(DeviceKind::Desktop).with_browser("Chrome", "Windows"),
            click(3).with_device(DeviceKind::Mobile).with_browser("Chrome", "Android"),
            click(4).with_device(DeviceKind::Bot),
        ];
        let audience = audience_breakdown(&events, 10);

        assert_eq!(audience.devices[0].value, "mobile");
        assert_eq!(audience.devices[0].percentage, 50.0);
        assert_eq!(audience.browsers[0].value, "Chrome");
        assert!(audience.browsers.iter().any(|b| b.value == "Unknown" && b.count == 1));
        let os_sum: f64 = audience.operating_systems.iter().map(|b| b.percentage).sum();
        assert!((os_sum - 100.0).abs() <= 0.1);
    }

    #[test]
    fn test_languages_use_only_clicks_with_header() {
        let events = vec![
            click(1).with_language("en-US,en;q=0.9"),
            click(2).with_language("fr-FR"),
            click(3).with_language("EN"),
            click(4),
        ];
        let audience = audience_breakdown(&events, 10);
        assert_eq!(audience.languages.len(), 2);
        assert_eq!(audience.languages[0].value, "en");
        assert_eq!(audience.languages[0].percentage, 66.67);
        assert_eq!(audience.languages[1].percentage, 33.33);
    }

    #[test]
    fn test_channels_and_sources() {
        let events = vec![
            click(1).with_source("newsletter"),
            click(2).with_referrer("https://www.google.com/search?q=x"),
            click(3),
            click(4).with_referrer("https://www.facebook.com/"),
        ];
        let audience = audience_breakdown(&events, 10);
        let channels: Vec<&str> = audience.channels.iter().map(|b| b.value.as_str()).collect();
        assert_eq!(channels, vec!["email", "search", "direct", "social"]);
        assert!(audience.top_sources.iter().any(|b| b.value == "ref:google.com"));
        assert!(audience.top_sources.iter().any(|b| b.value == "direct"));
    }

    #[test]
    fn test_response_time_per_device() {
        let events = vec![
            click(1).with_device(DeviceKind::Mobile).with_response_time(100.0),
            click(2).with_device(DeviceKind::Mobile).with_response_time(300.0),
            click(3).with_device(DeviceKind::Desktop).with_response_time(50.0),
            click(4).with_device(DeviceKind::Desktop),
        ];
        let stats = audience_breakdown(&events, 10).response_times;
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].device, DeviceKind::Mobile);
        assert_eq!(stats[0].samples, 2);
        assert_eq!(stats[0].avg_ms, 200.0);
        assert_eq!(stats[0].min_ms, 100.0);
        assert_eq!(stats[0].max_ms, 300.0);
        assert_eq!(stats[1].samples, 1);
    }
}
