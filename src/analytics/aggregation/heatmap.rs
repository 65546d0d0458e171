//! Click heatmap
//!
//! Points are keyed by exact `(lat, lng, city, country)`. Location density
//! is the number of *other* points within the configured radius, measured
//! with the haversine great-circle distance.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{ClickEvent, LinkId};

/// 地球平均半径（公里）
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub lat: f64,
    pub lng: f64,
    pub city: Option<String>,
    pub country: String,
    pub iso_code: Option<String>,
    pub clicks: u64,
    pub last_click: DateTime<Utc>,
    pub location_density: usize,
    /// 贡献该点的不同链接数
    pub total_links: usize,
}

/// 精确坐标键；-0.0 归一化为 0.0
type PointKey = (u64, u64, Option<String>, String);

fn point_key(lat: f64, lng: f64, city: &Option<String>, country: &str) -> PointKey {
    (
        (lat + 0.0).to_bits(),
        (lng + 0.0).to_bits(),
        city.clone(),
        country.to_string(),
    )
}

/// 两点间的大圆距离（公里）
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lng1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lng2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// 计算密度并按点击数降序排列
fn assign_density(points: &mut [HeatmapPoint], radius_km: f64) {
    let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.lat, p.lng)).collect();
    for (i, point) in points.iter_mut().enumerate() {
        point.location_density = coords
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != i && haversine_km(coords[i], **other) <= radius_km)
            .count();
    }
    points.sort_by(|a, b| b.clicks.cmp(&a.clicks));
}

struct Accumulator {
    point: HeatmapPoint,
    links: BTreeSet<LinkId>,
}

#[derive(Default)]
struct HeatmapBuilder {
    index: HashMap<PointKey, usize>,
    points: Vec<Accumulator>,
}

impl HeatmapBuilder {
    fn add(&mut self, event: &ClickEvent) {
        let Some(country) = event.geo.known_country() else {
            return;
        };
        let Some((lat, lng)) = event.geo.coordinates() else {
            return;
        };
        let city = event
            .geo
            .city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let key = point_key(lat, lng, &city, country);
        match self.index.get(&key) {
            Some(&pos) => {
                let acc = &mut self.points[pos];
                acc.point.clicks += 1;
                if event.timestamp > acc.point.last_click {
                    acc.point.last_click = event.timestamp;
                }
                acc.links.insert(event.link_id);
            }
            None => {
                self.index.insert(key, self.points.len());
                self.points.push(Accumulator {
                    point: HeatmapPoint {
                        lat,
                        lng,
                        city,
                        country: country.to_string(),
                        iso_code: event.geo.iso_code.clone(),
                        clicks: 1,
                        last_click: event.timestamp,
                        location_density: 0,
                        total_links: 0,
                    },
                    links: BTreeSet::from([event.link_id]),
                });
            }
        }
    }

    fn finish(self, radius_km: f64) -> Vec<HeatmapPoint> {
        let mut points: Vec<HeatmapPoint> = self
            .points
            .into_iter()
            .map(|acc| HeatmapPoint {
                total_links: acc.links.len(),
                ..acc.point
            })
            .collect();

        assign_density(&mut points, radius_km);
        points
    }
}

/// 构建热力图，只包含国家已知且有坐标的点击
///
/// 多链接的点击可以直接传入：相同键的点合并，`total_links` 为贡献链接数。
pub fn build_heatmap(events: &[ClickEvent], radius_km: f64) -> Vec<HeatmapPoint> {
    let mut builder = HeatmapBuilder::default();
    for event in events {
        builder.add(event);
    }
    builder.finish(radius_km)
}
