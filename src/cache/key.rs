use std::fmt;

use serde::Serialize;
use strum::{AsRefStr, Display};
use xxhash_rust::xxh64::xxh64;

use crate::storage::LinkId;

/// 链接 ID 超过该数量时以哈希代替明文
const INLINE_ID_LIMIT: usize = 8;

/// 被缓存的查询
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CacheOperation {
    LinkReport,
    QualityReport,
    Heatmap,
    GlobalReport,
    GlobalHeatmap,
}

/// `{operation}:{link ids}:{params digest}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: CacheOperation,
    link_ids: Vec<LinkId>,
    params_digest: u64,
}

impl CacheKey {
    /// 链接 ID 会被排序去重，顺序不影响 key
    pub fn new<P: Serialize>(operation: CacheOperation, link_ids: &[LinkId], params: &P) -> Self {
        let mut ids = link_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        // 参数无法序列化时退化为空摘要
        let encoded = serde_json::to_vec(params).unwrap_or_default();
        Self {
            operation,
            link_ids: ids,
            params_digest: xxh64(&encoded, 0),
        }
    }

    fn ids_part(&self) -> String {
        let joined = self
            .link_ids
            .iter()
            .map(LinkId::to_string)
            .collect::<Vec<_>>()
            .join(",");
        if self.link_ids.len() <= INLINE_ID_LIMIT {
            joined
        } else {
            format!("h{:016x}", xxh64(joined.as_bytes(), 0))
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{:016x}",
            self.operation,
            self.ids_part(),
            self.params_digest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_id_order_and_duplicates() {
        let a = CacheKey::new(CacheOperation::GlobalReport, &[3, 1, 2, 1], &10usize);
        let b = CacheKey::new(CacheOperation::GlobalReport, &[1, 2, 3], &10usize);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
        assert!(a.to_string().starts_with("global_report:1,2,3:"));
    }

    #[test]
    fn test_params_and_operation_change_key() {
        let base = CacheKey::new(CacheOperation::LinkReport, &[1], &10usize);
        let other_params = CacheKey::new(CacheOperation::LinkReport, &[1], &20usize);
        let other_op = CacheKey::new(CacheOperation::QualityReport, &[1], &10usize);
        assert_ne!(base.to_string(), other_params.to_string());
        assert_ne!(base.to_string(), other_op.to_string());
    }

    #[test]
    fn test_long_id_sets_are_hashed() {
        let ids: Vec<LinkId> = (1..=20).collect();
        let key = CacheKey::new(CacheOperation::GlobalHeatmap, &ids, &()).to_string();
        assert!(key.starts_with("global_heatmap:h"));
        assert!(key.len() < 64);
    }
}
