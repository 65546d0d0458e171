use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::analytics::{percentage, ratio, round_to};
use crate::storage::{ClickEvent, Link, LinkId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLink {
    pub link_id: LinkId,
    pub slug: String,
    pub clicks: u64,
    pub unique_visitors: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalSummary {
    pub total_links: usize,
    pub active_links: usize,
    pub total_clicks: u64,
    pub unique_visitors: u64,
    pub avg_clicks_per_link: f64,
    pub countries_reached: usize,
}

pub fn global_summary(links: &[Link], events: &[ClickEvent]) -> GlobalSummary {
    let visitors: HashSet<&str> = events.iter().map(|e| e.ip.as_str()).collect();
    let countries: HashSet<&str> = events.iter().filter_map(|e| e.geo.known_country()).collect();
    let total_clicks = events.len() as u64;

    GlobalSummary {
        total_links: links.len(),
        active_links: links.iter().filter(|l| l.is_active).count(),
        total_clicks,
        unique_visitors: visitors.len() as u64,
        avg_clicks_per_link: round_to(ratio(total_clicks, links.len() as u64), 2),
        countries_reached: countries.len(),
    }
}

/// 按点击数排序的链接，点击数相同时按链接顺序
pub fn top_links(links: &[Link], events: &[ClickEvent], top_n: usize) -> Vec<TopLink> {
    let mut per_link: HashMap<LinkId, (u64, HashSet<&str>)> = HashMap::new();
    for event in events {
        let entry = per_link.entry(event.link_id).or_default();
        entry.0 += 1;
        entry.1.insert(event.ip.as_str());
    }

    let total = events.len() as u64;
    let mut rows: Vec<TopLink> = links
        .iter()
        .map(|link| {
            let (clicks, visitors) = per_link
                .get(&link.id)
                .map(|(count, ips)| (*count, ips.len() as u64))
                .unwrap_or((0, 0));
            TopLink {
                link_id: link.id,
                slug: link.slug.clone(),
                clicks,
                unique_visitors: visitors,
                percentage: percentage(clicks, total),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.clicks.cmp(&a.clicks));
    rows.truncate(top_n);
    rows
}
