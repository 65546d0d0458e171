//! Aggregation engine
//!
//! Grouped counts and percentages over a filtered set of clicks. Every
//! breakdown is computed against its own filtered universe, so the buckets
//! of one (non-truncated) breakdown always sum to 100%.
//!
//! Ordering: count descending; ties keep first-appearance order of the
//! input (clicks arrive sorted by time), via a stable sort.

mod audience;
mod geo;
mod global;
mod heatmap;
mod temporal;

pub use audience::{AudienceBreakdown, ResponseTimeStat, audience_breakdown};
pub use geo::{CityStat, CountryStat, GeoBreakdown, StateStat, geo_breakdown};
pub use global::{GlobalSummary, TopLink, global_summary, top_links};
pub use heatmap::{HeatmapPoint, build_heatmap, haversine_km};
pub use temporal::{
    DAY_NAMES, DayBucket, HourBucket, SplitStat, TemporalBreakdown, TrendData, temporal_breakdown,
};

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::percentage;

/// 聚合维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    Country,
    State,
    City,
    Hour,
    DayOfWeek,
    Device,
    Browser,
    Os,
    Language,
    Channel,
    Source,
}

/// (维度值, 数量, 百分比)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    pub dimension: Dimension,
    pub value: String,
    pub count: u64,
    pub percentage: f64,
}

/// 保持首次出现顺序的计数器
#[derive(Debug)]
pub(crate) struct OrderedCounter<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, u64)>,
}

impl<K: Eq + Hash + Clone> OrderedCounter<K> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// 计数 +1，返回该 key 在 entries 中的位置
    pub(crate) fn add(&mut self, key: K) -> usize {
        match self.index.get(&key) {
            Some(&pos) => {
                self.entries[pos].1 += 1;
                pos
            }
            None => {
                let pos = self.entries.len();
                self.index.insert(key.clone(), pos);
                self.entries.push((key, 1));
                pos
            }
        }
    }

    pub(crate) fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// 按数量降序（稳定排序）
    pub(crate) fn into_sorted(self) -> Vec<(K, u64)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    /// 同 `into_sorted`，附带首次出现位置（即 `add` 的返回值）
    pub(crate) fn into_sorted_with_position(self) -> Vec<(usize, K, u64)> {
        let mut entries: Vec<(usize, K, u64)> = self
            .entries
            .into_iter()
            .enumerate()
            .map(|(pos, (key, count))| (pos, key, count))
            .collect();
        entries.sort_by(|a, b| b.2.cmp(&a.2));
        entries
    }
}

/// 按维度计数，转换为百分比桶
///
/// `limit` 为 `None` 时返回全部桶。百分比的分母是被计数的总量。
pub fn count_buckets<I>(dimension: Dimension, values: I, limit: Option<usize>) -> Vec<AggregateBucket>
where
    I: IntoIterator<Item = String>,
{
    let mut counter = OrderedCounter::new();
    for value in values {
        counter.add(value);
    }
    let total = counter.total();
    let sorted = counter.into_sorted();
    let take = limit.unwrap_or(sorted.len());

    sorted
        .into_iter()
        .take(take)
        .map(|(value, count)| AggregateBucket {
            dimension,
            value,
            count,
            percentage: percentage(count, total),
        })
        .collect()
}
