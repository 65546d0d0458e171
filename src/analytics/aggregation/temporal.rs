use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::analytics::percentage;
use crate::storage::ClickEvent;

/// 星期名称，下标 0 = Sunday
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// 趋势跨度超过该天数时不再补 0，只输出有点击的日期
pub const MAX_FILLED_TREND_DAYS: i64 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    pub hour: u8,
    pub clicks: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub day: u8,
    pub name: String,
    pub clicks: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitStat {
    pub clicks: u64,
    pub percentage: f64,
}

impl SplitStat {
    fn of(clicks: u64, total: u64) -> Self {
        Self {
            clicks,
            percentage: percentage(clicks, total),
        }
    }
}

/// 按天的点击趋势
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendData {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

/// 时间分布
///
/// `hourly` 恒为 24 项，`daily` 恒为 7 项，没有点击的桶补 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalBreakdown {
    pub total_clicks: u64,
    pub hourly: Vec<HourBucket>,
    pub daily: Vec<DayBucket>,
    pub weekend: SplitStat,
    pub weekday: SplitStat,
    pub business_hours: SplitStat,
    pub outside_business_hours: SplitStat,
    pub peak_hour: Option<HourBucket>,
    pub peak_day: Option<DayBucket>,
    pub trend: TrendData,
}

impl Default for TemporalBreakdown {
    fn default() -> Self {
        temporal_breakdown(&[])
    }
}

/// 取最大值，并列时保留靠前的桶
fn first_max<T: Clone>(buckets: &[T], clicks: impl Fn(&T) -> u64) -> Option<T> {
    let mut best: Option<&T> = None;
    for bucket in buckets {
        if clicks(bucket) > best.map_or(0, &clicks) {
            best = Some(bucket);
        }
    }
    best.cloned()
}

/// 每日趋势，从第一次点击到最后一次点击，中间缺失的日期补 0
///
/// 跨度超过 [`MAX_FILLED_TREND_DAYS`] 时退化为稀疏序列。
fn daily_trend(events: &[ClickEvent]) -> TrendData {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for event in events {
        *per_day.entry(event.timestamp.date_naive()).or_insert(0) += 1;
    }

    let (Some(first), Some(last)) = (
        per_day.keys().next().copied(),
        per_day.keys().next_back().copied(),
    ) else {
        return TrendData::default();
    };

    let mut trend = TrendData::default();
    if (last - first).num_days() > MAX_FILLED_TREND_DAYS {
        for (day, clicks) in per_day {
            trend.labels.push(day.format("%Y-%m-%d").to_string());
            trend.values.push(clicks);
        }
        return trend;
    }

    let mut day = first;
    while day <= last {
        trend.labels.push(day.format("%Y-%m-%d").to_string());
        trend.values.push(per_day.get(&day).copied().unwrap_or(0));
        day += Duration::days(1);
    }
    trend
}

pub fn temporal_breakdown(events: &[ClickEvent]) -> TemporalBreakdown {
    let total = events.len() as u64;
    let mut hours = [0u64; 24];
    let mut days = [0u64; 7];
    let mut weekend = 0u64;
    let mut business = 0u64;

    for event in events {
        hours[usize::from(event.hour_of_day.min(23))] += 1;
        days[usize::from(event.day_of_week())] += 1;
        if event.is_weekend {
            weekend += 1;
        }
        if event.is_business_hours {
            business += 1;
        }
    }

    let hourly: Vec<HourBucket> = hours
        .iter()
        .enumerate()
        .map(|(hour, &clicks)| HourBucket {
            hour: hour as u8,
            clicks,
            percentage: percentage(clicks, total),
        })
        .collect();
    let daily: Vec<DayBucket> = days
        .iter()
        .enumerate()
        .map(|(day, &clicks)| DayBucket {
            day: day as u8,
            name: DAY_NAMES[day].to_string(),
            clicks,
            percentage: percentage(clicks, total),
        })
        .collect();

    TemporalBreakdown {
        total_clicks: total,
        peak_hour: first_max(&hourly, |b| b.clicks),
        peak_day: first_max(&daily, |b| b.clicks),
        hourly,
        daily,
        weekend: SplitStat::of(weekend, total),
        weekday: SplitStat::of(total - weekend, total),
        business_hours: SplitStat::of(business, total),
        outside_business_hours: SplitStat::of(total - business, total),
        trend: daily_trend(events),
    }
}
