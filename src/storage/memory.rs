//! In-memory click store
//!
//! Holds links and clicks behind a `parking_lot::RwLock`. Used by tests and
//! by the CLI `--seed` mode, which loads a JSON snapshot:
//!
//! ```json
//! { "links": [{ "id": 1, "owner_id": 7, "slug": "promo", "created_at": "...", "is_active": true }],
//!   "clicks": [{ "id": 1, "link_id": 1, "timestamp": "...", "ip": "1.2.3.4", ... }] }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

use super::models::{ClickEvent, Link, LinkId};
use super::query::ClickQuery;
use super::ClickStore;
use crate::errors::{InsightError, Result};

#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    clicks: Vec<ClickEvent>,
}

#[derive(Default)]
pub struct MemoryClickStore {
    links: RwLock<BTreeMap<LinkId, Link>>,
    clicks: RwLock<Vec<ClickEvent>>,
}

impl MemoryClickStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 快照加载
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            InsightError::invalid_input(format!("Cannot read seed file {}: {}", path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;

        let store = Self::new();
        for link in snapshot.links {
            store.insert_link(link);
        }
        let count = snapshot.clicks.len();
        store.record_all(snapshot.clicks)?;
        debug!("MemoryClickStore seeded from {} with {} clicks", path.display(), count);
        Ok(store)
    }

    pub fn insert_link(&self, link: Link) {
        self.links.write().insert(link.id, link);
    }

    /// 追加一条点击；链接必须已存在
    pub fn record(&self, click: ClickEvent) -> Result<()> {
        if !self.links.read().contains_key(&click.link_id) {
            return Err(InsightError::not_found(format!(
                "Click {} references unknown link {}",
                click.id, click.link_id
            )));
        }
        self.clicks.write().push(click);
        Ok(())
    }

    pub fn record_all(&self, clicks: impl IntoIterator<Item = ClickEvent>) -> Result<()> {
        for click in clicks {
            self.record(click)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.clicks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clicks.read().is_empty()
    }
}

#[async_trait]
impl ClickStore for MemoryClickStore {
    async fn find_link(&self, id: LinkId) -> Result<Option<Link>> {
        Ok(self.links.read().get(&id).cloned())
    }

    async fn find_links(&self, ids: &[LinkId]) -> Result<Vec<Link>> {
        let links = self.links.read();
        let mut found: Vec<Link> = ids.iter().filter_map(|id| links.get(id).cloned()).collect();
        found.sort_by_key(|l| l.id);
        found.dedup_by_key(|l| l.id);
        Ok(found)
    }

    async fn load_clicks(&self, query: &ClickQuery) -> Result<Vec<ClickEvent>> {
        query.validate()?;
        let mut matched: Vec<ClickEvent> = self
            .clicks
            .read()
            .iter()
            .filter(|click| query.matches(click))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn count_clicks(&self, query: &ClickQuery) -> Result<u64> {
        query.validate()?;
        Ok(self
            .clicks
            .read()
            .iter()
            .filter(|click| query.matches(click))
            .count() as u64)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
