//! 分析引擎性能基准测试

use std::hint::black_box;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use shortlinker_insights::analytics::aggregation::{build_heatmap, geo_breakdown, temporal_breakdown};
use shortlinker_insights::analytics::{EngineSettings, FixedClock, QualityScorer, SessionReconstructor};
use shortlinker_insights::cache::NullResultCache;
use shortlinker_insights::config::CacheTtlConfig;
use shortlinker_insights::services::{InsightService, QueryOptions};
use shortlinker_insights::storage::{ClickEvent, DeviceKind, GeoLocation, Link, MemoryClickStore};

const CITIES: &[(&str, &str, f64, f64)] = &[
    ("France", "Paris", 48.8566, 2.3522),
    ("United Kingdom", "London", 51.5074, -0.1278),
    ("Germany", "Berlin", 52.52, 13.405),
    ("Japan", "Tokyo", 35.6762, 139.6503),
    ("Brazil", "Sao Paulo", -23.5505, -46.6333),
    ("United States", "New York", 40.7128, -74.006),
];

const DEVICES: &[DeviceKind] = &[
    DeviceKind::Desktop,
    DeviceKind::Mobile,
    DeviceKind::Tablet,
    DeviceKind::Bot,
];

fn synthetic_clicks(n: usize) -> Vec<ClickEvent> {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let (country, city, lat, lng) = CITIES[i % CITIES.len()];
            ClickEvent::new(
                i as i64,
                1,
                start + Duration::seconds((i * 97) as i64),
                format!("10.{}.{}.1", (i / 256) % 256, i % 256 / 3),
            )
            .with_geo(GeoLocation {
                country: Some(country.to_string()),
                city: Some(city.to_string()),
                latitude: Some(lat),
                longitude: Some(lng),
                ..Default::default()
            })
            .with_device(DEVICES[i % DEVICES.len()])
            .with_source(if i % 3 == 0 { "twitter" } else { "direct" })
        })
        .collect()
}

// ============== 纯计算 ==============

fn bench_pure_analytics(c: &mut Criterion) {
    let mut group = c.benchmark_group("analytics");
    for size in [1_000usize, 10_000] {
        let events = synthetic_clicks(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("sessions", size), &events, |b, events| {
            let reconstructor = SessionReconstructor::default();
            b.iter(|| reconstructor.stats(black_box(events)));
        });
        group.bench_with_input(BenchmarkId::new("geo", size), &events, |b, events| {
            b.iter(|| geo_breakdown(black_box(events), 10));
        });
        group.bench_with_input(BenchmarkId::new("temporal", size), &events, |b, events| {
            b.iter(|| temporal_breakdown(black_box(events)));
        });
        group.bench_with_input(BenchmarkId::new("quality", size), &events, |b, events| {
            let scorer = QualityScorer::default();
            b.iter(|| scorer.score(black_box(events)));
        });
        group.bench_with_input(BenchmarkId::new("heatmap", size), &events, |b, events| {
            b.iter(|| build_heatmap(black_box(events), 50.0));
        });
    }
    group.finish();
}

// ============== 完整报告 ==============

fn bench_link_report(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = MemoryClickStore::new();
    store.insert_link(Link {
        id: 1,
        owner_id: 1,
        slug: "bench".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap(),
        is_active: true,
    });
    store.record_all(synthetic_clicks(5_000)).unwrap();

    let service = Arc::new(InsightService::new(
        Arc::new(store),
        Arc::new(NullResultCache),
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap())),
        EngineSettings::default(),
        CacheTtlConfig::default(),
    ));

    c.bench_function("service/link_report_5000", |b| {
        b.to_async(&rt).iter(|| {
            let s = Arc::clone(&service);
            async move { s.get_link_report(1, QueryOptions::default()).await.unwrap() }
        });
    });
}

criterion_group!(benches, bench_pure_analytics, bench_link_report);
criterion_main!(benches);
