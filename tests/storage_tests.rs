//! SeaORM 存储后端测试
//!
//! 使用临时 SQLite 数据库，校验过滤条件下推后与内存实现语义一致。

use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::ActiveModelTrait;
use tempfile::TempDir;

use shortlinker_insights::config::DatabaseConfig;
use shortlinker_insights::storage::backend::{
    click_to_active_model, connect_sqlite, link_to_active_model,
};
use shortlinker_insights::storage::{
    ClickEvent, ClickField, ClickQuery, ClickStore, DeviceKind, GeoLocation, Link,
    MemoryClickStore, SeaOrmStorage,
};

// =============================================================================
// 测试辅助函数
// =============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 10, 0, 0).unwrap()
}

fn link(id: i64, active: bool) -> Link {
    Link {
        id,
        owner_id: 9,
        slug: format!("s{}", id),
        created_at: t0() - Duration::days(3),
        is_active: active,
    }
}

/// 插入顺序与时间顺序刻意不同；ID 按插入顺序从 1 开始
fn fixture_clicks() -> Vec<ClickEvent> {
    vec![
        ClickEvent::new(1, 1, t0() + Duration::minutes(30), "a")
            .with_country("Germany")
            .with_device(DeviceKind::Desktop)
            .with_browser("Firefox", "Linux"),
        ClickEvent::new(2, 1, t0(), "b")
            .with_country("localhost")
            .with_language("de-DE,de;q=0.9"),
        ClickEvent::new(3, 2, t0() + Duration::minutes(5), "a").with_geo(GeoLocation {
            country: Some("Japan".into()),
            city: Some("Osaka".into()),
            latitude: Some(34.6937),
            longitude: Some(135.5023),
            ..Default::default()
        }),
        ClickEvent::new(4, 1, t0() + Duration::hours(2), "c")
            .with_source("newsletter")
            .with_response_time(42.5),
        ClickEvent::new(5, 2, t0() + Duration::days(1), "d").with_referrer(""),
    ]
}

async fn create_temp_storage() -> (SeaOrmStorage, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("insights.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let config = DatabaseConfig {
        database_url: db_url,
        ..Default::default()
    };
    let storage = SeaOrmStorage::new(&config, "sqlite")
        .await
        .expect("Failed to create storage");

    for l in [link(1, true), link(2, false)] {
        link_to_active_model(&l)
            .insert(storage.connection())
            .await
            .expect("Failed to insert link");
    }
    for click in fixture_clicks() {
        click_to_active_model(&click)
            .insert(storage.connection())
            .await
            .expect("Failed to insert click");
    }

    (storage, temp_dir)
}

fn memory_store() -> MemoryClickStore {
    let store = MemoryClickStore::new();
    store.insert_link(link(1, true));
    store.insert_link(link(2, false));
    store.record_all(fixture_clicks()).unwrap();
    store
}

fn ids(clicks: &[ClickEvent]) -> Vec<i64> {
    clicks.iter().map(|c| c.id).collect()
}

// =============================================================================
// 链接查询
// =============================================================================

#[cfg(test)]
mod link_tests {
    use super::*;

    #[tokio::test]
    async fn test_find_link_roundtrip() {
        let (storage, _dir) = create_temp_storage().await;
        let found = storage.find_link(2).await.unwrap().unwrap();
        assert_eq!(found.slug, "s2");
        assert!(!found.is_active);
        assert_eq!(found.created_at, t0() - Duration::days(3));
        assert!(storage.find_link(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_links_sorted_and_skips_missing() {
        let (storage, _dir) = create_temp_storage().await;
        let found = storage.find_links(&[2, 99, 1]).await.unwrap();
        let found_ids: Vec<i64> = found.iter().map(|l| l.id).collect();
        assert_eq!(found_ids, vec![1, 2]);
        assert!(storage.find_links(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backend_name() {
        let (storage, _dir) = create_temp_storage().await;
        assert_eq!(storage.backend_name(), "sqlite");
    }
}

// =============================================================================
// 点击查询
// =============================================================================

#[cfg(test)]
mod click_query_tests {
    use super::*;

    #[tokio::test]
    async fn test_clicks_ordered_by_time() {
        let (storage, _dir) = create_temp_storage().await;
        let clicks = storage.load_clicks(&ClickQuery::for_link(1)).await.unwrap();
        assert_eq!(ids(&clicks), vec![2, 1, 4]);

        let first = &clicks[1];
        assert_eq!(first.device, DeviceKind::Desktop);
        assert_eq!(first.browser.as_deref(), Some("Firefox"));
        assert_eq!(clicks[2].response_time, Some(42.5));
    }

    #[tokio::test]
    async fn test_time_range_is_half_open() {
        let (storage, _dir) = create_temp_storage().await;
        let query = ClickQuery::for_links(&[1, 2]).between(t0(), t0() + Duration::minutes(30));
        let clicks = storage.load_clicks(&query).await.unwrap();
        assert_eq!(ids(&clicks), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_required_fields_filter() {
        let (storage, _dir) = create_temp_storage().await;
        let all = ClickQuery::for_links(&[1, 2]);

        let countries = storage
            .load_clicks(&all.clone().require(ClickField::Country))
            .await
            .unwrap();
        assert_eq!(ids(&countries), vec![3, 1]);

        let located = storage
            .load_clicks(&all.clone().require(ClickField::Coordinates))
            .await
            .unwrap();
        assert_eq!(ids(&located), vec![3]);

        // 空字符串 referrer 视为缺失
        let referred = storage
            .count_clicks(&all.clone().require(ClickField::Referrer))
            .await
            .unwrap();
        assert_eq!(referred, 0);
    }

    #[tokio::test]
    async fn test_count_matches_load() {
        let (storage, _dir) = create_temp_storage().await;
        let query = ClickQuery::for_links(&[1, 2]);
        assert_eq!(storage.count_clicks(&query).await.unwrap(), 5);
        assert_eq!(
            storage.count_clicks(&ClickQuery::for_link(2)).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let (storage, _dir) = create_temp_storage().await;
        assert!(storage.load_clicks(&ClickQuery::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_agrees_with_memory_store() {
        let (storage, _dir) = create_temp_storage().await;
        let memory = memory_store();

        let queries = [
            ClickQuery::for_links(&[1, 2]),
            ClickQuery::for_link(1).require(ClickField::AcceptLanguage),
            ClickQuery::for_links(&[1, 2]).require(ClickField::Source),
            ClickQuery::for_link(2).since(t0() + Duration::hours(1)),
            ClickQuery::for_links(&[1, 2]).require(ClickField::City),
        ];
        for query in &queries {
            let from_db = storage.load_clicks(query).await.unwrap();
            let from_memory = memory.load_clicks(query).await.unwrap();
            assert_eq!(ids(&from_db), ids(&from_memory), "query {:?}", query);
        }
    }
}

// =============================================================================
// 连接
// =============================================================================

#[cfg(test)]
mod connection_tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_sqlite_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("fresh.db");
        let url = format!("sqlite://{}", db_path.display());
        let db = connect_sqlite(&url).await.unwrap();
        let storage = SeaOrmStorage::from_connection(db, "sqlite").await.unwrap();
        assert!(db_path.exists());
        assert_eq!(
            storage.count_clicks(&ClickQuery::for_link(1)).await.unwrap(),
            0
        );
    }
}
