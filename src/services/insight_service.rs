//! Insight service layer
//!
//! Orchestrates the engine for the public read operations: loads clicks
//! through the `ClickStore`, runs the analytics passes and memoizes the
//! composite result in the injected `ResultCache`.
//!
//! Every operation takes `QueryOptions`; `bypass_cache` skips the cache
//! entirely. Store failures propagate as errors, cache failures never do.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analytics::aggregation::{
    GeoBreakdown, GlobalSummary, HeatmapPoint, TemporalBreakdown, TopLink, audience_breakdown,
    build_heatmap, geo_breakdown, global_summary, temporal_breakdown, top_links,
};
use crate::analytics::quality::security_overview;
use crate::analytics::{
    AudienceBreakdown, Clock, EngineSettings, QualityReport, QualityScorer, SecurityOverview,
    SessionReconstructor, SessionStats, ratio, round_to,
};
use crate::analytics::session::returning_clicks;
use crate::cache::{CacheKey, CacheOperation, ResultCache, memoize};
use crate::config::CacheTtlConfig;
use crate::errors::{InsightError, Result};
use crate::insights::{InsightGenerator, InsightMetrics, InsightSet, MetricSources};
use crate::storage::{ClickEvent, ClickQuery, ClickStore, Link, LinkId};

/// 无点击时的提示
pub const NO_DATA_MESSAGE: &str =
    "Insufficient data: this link has no recorded clicks yet. Share it to start collecting analytics.";

// ============ 公共类型定义 ============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// 跳过结果缓存
    pub bypass_cache: bool,
    /// 洞察按优先级排序（默认保持规则顺序）
    pub sort_insights: bool,
}

impl QueryOptions {
    pub fn bypass() -> Self {
        Self {
            bypass_cache: true,
            ..Default::default()
        }
    }
}

/// 热力图范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeatmapScope {
    Link(LinkId),
    Links(Vec<LinkId>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkInfo {
    pub id: LinkId,
    pub slug: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub days_since_creation: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkOverview {
    pub total_clicks: u64,
    pub unique_visitors: u64,
    pub returning_clicks: u64,
    pub human_clicks: u64,
    pub bot_clicks: u64,
    pub clicks_last_24h: u64,
    pub clicks_last_7_days: u64,
    pub avg_clicks_per_day: f64,
    pub first_click: Option<DateTime<Utc>>,
    pub last_click: Option<DateTime<Utc>>,
}

/// 单链接报告
///
/// 没有点击时 `has_data = false`，所有聚合字段为 `None`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    pub has_data: bool,
    pub message: Option<String>,
    pub link_info: LinkInfo,
    pub overview: Option<LinkOverview>,
    pub geographic: Option<GeoBreakdown>,
    pub temporal: Option<TemporalBreakdown>,
    pub audience: Option<AudienceBreakdown>,
    pub sessions: Option<SessionStats>,
    pub insights: Option<InsightSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalReport {
    pub summary: GlobalSummary,
    pub top_links: Vec<TopLink>,
    pub temporal: TemporalBreakdown,
    pub geographic: GeoBreakdown,
    pub audience: AudienceBreakdown,
    pub security: SecurityOverview,
}

// ============ InsightService ============

pub struct InsightService {
    store: Arc<dyn ClickStore>,
    cache: Arc<dyn ResultCache>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
    ttl: CacheTtlConfig,
    generator: InsightGenerator,
}

impl InsightService {
    pub fn new(
        store: Arc<dyn ClickStore>,
        cache: Arc<dyn ResultCache>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
        ttl: CacheTtlConfig,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            settings,
            ttl,
            generator: InsightGenerator::default(),
        }
    }

    fn validate_id(link_id: LinkId) -> Result<()> {
        if link_id <= 0 {
            return Err(InsightError::invalid_input(format!(
                "Invalid link id: {}",
                link_id
            )));
        }
        Ok(())
    }

    /// 校验 ID 集合并返回排序去重后的结果
    fn validate_ids(link_ids: &[LinkId]) -> Result<Vec<LinkId>> {
        if link_ids.is_empty() {
            return Err(InsightError::invalid_input(
                "At least one link id is required",
            ));
        }
        for &id in link_ids {
            Self::validate_id(id)?;
        }
        let ids: BTreeSet<LinkId> = link_ids.iter().copied().collect();
        Ok(ids.into_iter().collect())
    }

    fn ttl(secs: u64) -> StdDuration {
        StdDuration::from_secs(secs)
    }

    /// 查找全部链接，缺失任何一个即返回 NotFound，只保留启用的链接
    async fn resolve_active_links(&self, ids: &[LinkId]) -> Result<(Vec<Link>, Vec<Link>)> {
        let links = self.store.find_links(ids).await?;
        if links.len() != ids.len() {
            let found: BTreeSet<LinkId> = links.iter().map(|l| l.id).collect();
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !found.contains(id))
                .map(LinkId::to_string)
                .collect();
            return Err(InsightError::not_found(format!(
                "Links not found: {}",
                missing.join(", ")
            )));
        }
        let active = links.iter().filter(|l| l.is_active).cloned().collect();
        Ok((links, active))
    }

    async fn load_union(&self, links: &[Link]) -> Result<Vec<ClickEvent>> {
        if links.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<LinkId> = links.iter().map(|l| l.id).collect();
        self.store.load_clicks(&ClickQuery::for_links(&ids)).await
    }

    // ============ 单链接报告 ============

    pub async fn get_link_report(&self, link_id: LinkId, options: QueryOptions) -> Result<LinkReport> {
        info!("Insights: get_link_report for link {}", link_id);
        Self::validate_id(link_id)?;

        let key = CacheKey::new(
            CacheOperation::LinkReport,
            &[link_id],
            &(self.settings.top_n, options.sort_insights),
        );
        memoize(
            self.cache.as_ref(),
            &key,
            Self::ttl(self.ttl.link_report),
            options.bypass_cache,
            move || self.compute_link_report(link_id, options.sort_insights),
        )
        .await
    }

    async fn compute_link_report(&self, link_id: LinkId, sort_insights: bool) -> Result<LinkReport> {
        let now = self.clock.now();

        // 并发查询链接和点击
        let query = ClickQuery::for_link(link_id);
        let (link, events) = tokio::try_join!(
            self.store.find_link(link_id),
            self.store.load_clicks(&query),
        )?;
        let link = link.ok_or_else(|| InsightError::not_found(format!("Link {} not found", link_id)))?;

        let days_since_creation = (now - link.created_at).num_days().max(0);
        let link_info = LinkInfo {
            id: link.id,
            slug: link.slug.clone(),
            owner_id: link.owner_id,
            created_at: link.created_at,
            is_active: link.is_active,
            days_since_creation,
        };

        if events.is_empty() {
            debug!("Insights: link {} has no clicks", link_id);
            return Ok(LinkReport {
                has_data: false,
                message: Some(NO_DATA_MESSAGE.to_string()),
                link_info,
                overview: None,
                geographic: None,
                temporal: None,
                audience: None,
                sessions: None,
                insights: None,
            });
        }

        let top_n = self.settings.top_n;
        let geographic = geo_breakdown(&events, top_n);
        let temporal = temporal_breakdown(&events);
        let audience = audience_breakdown(&events, top_n);
        let sessions = SessionReconstructor::new(self.settings.session_gap).stats(&events);
        let overview = overview(&events, now, days_since_creation);

        let metrics = InsightMetrics::collect(MetricSources {
            events: &events,
            geo: &geographic,
            temporal: &temporal,
            audience: &audience,
            sessions: &sessions,
            now,
        });
        let insights = self.generator.generate(&metrics, sort_insights);

        debug!(
            "Insights: link {} report with {} clicks, {} sessions, {} insights",
            link_id,
            events.len(),
            sessions.total_sessions,
            insights.insights.len()
        );

        Ok(LinkReport {
            has_data: true,
            message: None,
            link_info,
            overview: Some(overview),
            geographic: Some(geographic),
            temporal: Some(temporal),
            audience: Some(audience),
            sessions: Some(sessions),
            insights: Some(insights),
        })
    }

    // ============ 全局报告 ============

    /// 多链接报告，只聚合启用的链接
    pub async fn get_global_report(
        &self,
        link_ids: &[LinkId],
        options: QueryOptions,
    ) -> Result<GlobalReport> {
        info!("Insights: get_global_report for {} links", link_ids.len());
        let ids = Self::validate_ids(link_ids)?;

        let key = CacheKey::new(CacheOperation::GlobalReport, &ids, &self.settings.top_n);
        memoize(
            self.cache.as_ref(),
            &key,
            Self::ttl(self.ttl.global_report),
            options.bypass_cache,
            move || async move { self.compute_global_report(&ids).await },
        )
        .await
    }

    async fn compute_global_report(&self, ids: &[LinkId]) -> Result<GlobalReport> {
        let (links, active) = self.resolve_active_links(ids).await?;
        let events = self.load_union(&active).await?;
        let top_n = self.settings.top_n;

        let mut summary = global_summary(&active, &events);
        summary.total_links = links.len();

        let report = GlobalReport {
            summary,
            top_links: top_links(&active, &events, top_n),
            temporal: temporal_breakdown(&events),
            geographic: geo_breakdown(&events, top_n),
            audience: audience_breakdown(&events, top_n),
            security: security_overview(&events),
        };

        debug!(
            "Insights: global report over {} active links, {} clicks, {} flagged IPs",
            active.len(),
            events.len(),
            report.security.suspicious_ips.len()
        );
        Ok(report)
    }

    // ============ 质量报告 ============

    pub async fn get_quality_report(
        &self,
        link_id: LinkId,
        options: QueryOptions,
    ) -> Result<QualityReport> {
        info!("Insights: get_quality_report for link {}", link_id);
        Self::validate_id(link_id)?;

        let key = CacheKey::new(CacheOperation::QualityReport, &[link_id], &());
        memoize(
            self.cache.as_ref(),
            &key,
            Self::ttl(self.ttl.quality_report),
            options.bypass_cache,
            move || async move {
                let query = ClickQuery::for_link(link_id);
                let (link, events) = tokio::try_join!(
                    self.store.find_link(link_id),
                    self.store.load_clicks(&query),
                )?;
                if link.is_none() {
                    return Err(InsightError::not_found(format!("Link {} not found", link_id)));
                }
                let report = QualityScorer::default().score(&events);
                debug!(
                    "Insights: quality score {} for link {} ({} clicks)",
                    report.quality_score, link_id, report.total
                );
                Ok(report)
            },
        )
        .await
    }

    // ============ 热力图 ============

    pub async fn get_heatmap(
        &self,
        scope: HeatmapScope,
        options: QueryOptions,
    ) -> Result<Vec<HeatmapPoint>> {
        let radius = self.settings.density_radius_km;
        match scope {
            HeatmapScope::Link(link_id) => {
                info!("Insights: get_heatmap for link {}", link_id);
                Self::validate_id(link_id)?;
                let key = CacheKey::new(CacheOperation::Heatmap, &[link_id], &radius.to_bits());
                memoize(
                    self.cache.as_ref(),
                    &key,
                    Self::ttl(self.ttl.heatmap),
                    options.bypass_cache,
                    move || async move {
                        let query = ClickQuery::for_link(link_id);
                        let (link, events) = tokio::try_join!(
                            self.store.find_link(link_id),
                            self.store.load_clicks(&query),
                        )?;
                        if link.is_none() {
                            return Err(InsightError::not_found(format!(
                                "Link {} not found",
                                link_id
                            )));
                        }
                        let points = build_heatmap(&events, radius);
                        debug!("Insights: heatmap for link {} has {} points", link_id, points.len());
                        Ok(points)
                    },
                )
                .await
            }
            HeatmapScope::Links(link_ids) => {
                info!("Insights: get_heatmap for {} links", link_ids.len());
                let ids = Self::validate_ids(&link_ids)?;
                let key = CacheKey::new(CacheOperation::GlobalHeatmap, &ids, &radius.to_bits());
                memoize(
                    self.cache.as_ref(),
                    &key,
                    Self::ttl(self.ttl.global_heatmap),
                    options.bypass_cache,
                    move || async move {
                        let (_, active) = self.resolve_active_links(&ids).await?;
                        let events = self.load_union(&active).await?;
                        let points = build_heatmap(&events, radius);
                        debug!(
                            "Insights: heatmap for {} active links has {} points",
                            active.len(),
                            points.len()
                        );
                        Ok(points)
                    },
                )
                .await
            }
        }
    }
}

fn overview(events: &[ClickEvent], now: DateTime<Utc>, days_since_creation: i64) -> LinkOverview {
    let total = events.len() as u64;
    let unique_visitors = events
        .iter()
        .map(|e| e.ip.as_str())
        .collect::<BTreeSet<_>>()
        .len() as u64;
    let bot_clicks = events.iter().filter(|e| e.device.is_bot()).count() as u64;
    let within = |window: Duration| {
        let start = now - window;
        events
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= now)
            .count() as u64
    };

    LinkOverview {
        total_clicks: total,
        unique_visitors,
        returning_clicks: returning_clicks(events),
        human_clicks: total - bot_clicks,
        bot_clicks,
        clicks_last_24h: within(Duration::hours(24)),
        clicks_last_7_days: within(Duration::days(7)),
        // 创建不足一天按一天计算
        avg_clicks_per_day: round_to(ratio(total, days_since_creation.max(1) as u64), 2),
        first_click: events.iter().map(|e| e.timestamp).min(),
        last_click: events.iter().map(|e| e.timestamp).max(),
    }
}
