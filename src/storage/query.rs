//! Click log query description
//!
//! A `ClickQuery` is the only way engine code asks the event store for data.
//! Backends may push the filters down to SQL, but `matches` defines the
//! reference semantics every backend must agree with.

use chrono::{DateTime, Utc};

use super::models::{ClickEvent, LinkId};
use crate::errors::{InsightError, Result};

/// 要求非空的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickField {
    /// 已知国家（排除 localhost 和空字符串）
    Country,
    City,
    Coordinates,
    Referrer,
    Source,
    AcceptLanguage,
    ResponseTime,
    Browser,
    Os,
}

/// 点击日志查询条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickQuery {
    pub link_ids: Vec<LinkId>,
    /// 起始时间（包含）
    pub start: Option<DateTime<Utc>>,
    /// 结束时间（不包含）
    pub end: Option<DateTime<Utc>>,
    pub required: Vec<ClickField>,
}

impl ClickQuery {
    pub fn for_link(link_id: LinkId) -> Self {
        Self {
            link_ids: vec![link_id],
            ..Default::default()
        }
    }

    /// 多链接查询，ID 去重并排序
    pub fn for_links(link_ids: &[LinkId]) -> Self {
        let mut ids = link_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Self {
            link_ids: ids,
            ..Default::default()
        }
    }

    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn between(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.since(start).until(end)
    }

    pub fn require(mut self, field: ClickField) -> Self {
        if !self.required.contains(&field) {
            self.required.push(field);
        }
        self
    }

    /// 查询必须至少包含一个链接，时间范围不能倒置
    pub fn validate(&self) -> Result<()> {
        if self.link_ids.is_empty() {
            return Err(InsightError::invalid_input(
                "Click query requires at least one link id",
            ));
        }
        if let (Some(start), Some(end)) = (self.start, self.end)
            && start > end
        {
            return Err(InsightError::invalid_input(format!(
                "Query start {} is later than end {}",
                start, end
            )));
        }
        Ok(())
    }

    /// 参考语义：事件是否满足查询
    pub fn matches(&self, event: &ClickEvent) -> bool {
        if !self.link_ids.contains(&event.link_id) {
            return false;
        }
        if let Some(start) = self.start
            && event.timestamp < start
        {
            return false;
        }
        if let Some(end) = self.end
            && event.timestamp >= end
        {
            return false;
        }
        self.required.iter().all(|field| has_field(event, *field))
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn has_field(event: &ClickEvent, field: ClickField) -> bool {
    match field {
        ClickField::Country => event.geo.known_country().is_some(),
        ClickField::City => non_empty(&event.geo.city),
        ClickField::Coordinates => event.geo.coordinates().is_some(),
        ClickField::Referrer => non_empty(&event.referrer),
        ClickField::Source => non_empty(&event.source),
        ClickField::AcceptLanguage => non_empty(&event.accept_language),
        ClickField::ResponseTime => event.response_time.is_some_and(f64::is_finite),
        ClickField::Browser => non_empty(&event.browser),
        ClickField::Os => non_empty(&event.os),
    }
}
