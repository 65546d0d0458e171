use serde::{Deserialize, Serialize};

use super::OrderedCounter;
use crate::analytics::percentage;
use crate::storage::ClickEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStat {
    pub country: String,
    pub iso_code: Option<String>,
    pub currency: Option<String>,
    pub continent: Option<String>,
    pub clicks: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateStat {
    pub state: String,
    pub state_name: Option<String>,
    pub country: String,
    pub clicks: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStat {
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub clicks: u64,
    pub percentage: f64,
}

/// 地理分布
///
/// 只统计国家已知的点击；`unknown_clicks` 记录被排除的数量。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoBreakdown {
    pub located_clicks: u64,
    pub unknown_clicks: u64,
    pub distinct_countries: usize,
    pub countries: Vec<CountryStat>,
    pub states: Vec<StateStat>,
    pub cities: Vec<CityStat>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 国家 / 州 / 城市 Top-N
pub fn geo_breakdown(events: &[ClickEvent], top_n: usize) -> GeoBreakdown {
    let mut countries = OrderedCounter::new();
    let mut states = OrderedCounter::new();
    let mut cities = OrderedCounter::new();
    // 首次出现的附加字段（ISO、货币等）
    let mut country_meta: Vec<&ClickEvent> = Vec::new();
    let mut state_meta: Vec<&ClickEvent> = Vec::new();
    let mut city_meta: Vec<&ClickEvent> = Vec::new();
    let mut unknown_clicks = 0u64;

    for event in events {
        let Some(country) = event.geo.known_country() else {
            unknown_clicks += 1;
            continue;
        };

        if countries.add(country.to_string()) == country_meta.len() {
            country_meta.push(event);
        }
        if let Some(state) = present(&event.geo.state)
            && states.add((country.to_string(), state.to_string())) == state_meta.len()
        {
            state_meta.push(event);
        }
        if let Some(city) = present(&event.geo.city)
            && cities.add((country.to_string(), city.to_string())) == city_meta.len()
        {
            city_meta.push(event);
        }
    }

    let located_clicks = countries.total();
    let distinct_countries = countries.len();
    let state_total = states.total();
    let city_total = cities.total();

    let country_rows = countries
        .into_sorted_with_position()
        .into_iter()
        .take(top_n)
        .map(|(pos, country, clicks)| {
            let meta = &country_meta[pos].geo;
            CountryStat {
                country,
                iso_code: present(&meta.iso_code).map(str::to_string),
                currency: present(&meta.currency).map(str::to_string),
                continent: present(&meta.continent).map(str::to_string),
                clicks,
                percentage: percentage(clicks, located_clicks),
            }
        })
        .collect();

    let state_rows = states
        .into_sorted_with_position()
        .into_iter()
        .take(top_n)
        .map(|(pos, (country, state), clicks)| StateStat {
            state,
            state_name: present(&state_meta[pos].geo.state_name).map(str::to_string),
            country,
            clicks,
            percentage: percentage(clicks, state_total),
        })
        .collect();

    let city_rows = cities
        .into_sorted_with_position()
        .into_iter()
        .take(top_n)
        .map(|(pos, (country, city), clicks)| CityStat {
            city,
            state: present(&city_meta[pos].geo.state).map(str::to_string),
            country,
            clicks,
            percentage: percentage(clicks, city_total),
        })
        .collect();

    GeoBreakdown {
        located_clicks,
        unknown_clicks,
        distinct_countries,
        countries: country_rows,
        states: state_rows,
        cities: city_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::GeoLocation;
    use chrono::{TimeZone, Utc};

    fn located(id: i64, country: &str, state: Option<&str>, city: Option<&str>) -> ClickEvent {
        let ts = Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap();
        ClickEvent::new(id, 1, ts, format!("10.0.0.{}", id)).with_geo(GeoLocation {
            country: Some(country.to_string()),
            iso_code: Some(country[..2].to_uppercase()),
            currency: Some("EUR".to_string()),
            state: state.map(str::to_string),
            city: city.map(str::to_string),
            ..Default::default()
        })
    }

    #[test]
    fn test_localhost_and_empty_are_excluded_but_counted() {
        let ts = Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap();
        let events = vec![
            located(1, "France", None, Some("Paris")),
            ClickEvent::new(2, 1, ts, "127.0.0.1").with_country("localhost"),
            ClickEvent::new(3, 1, ts, "10.0.0.3").with_country(""),
            ClickEvent::new(4, 1, ts, "10.0.0.4"),
        ];
        let geo = geo_breakdown(&events, 10);
        assert_eq!(geo.located_clicks, 1);
        assert_eq!(geo.unknown_clicks, 3);
        assert_eq!(geo.distinct_countries, 1);
        assert_eq!(geo.countries[0].percentage, 100.0);
        assert_eq!(geo.countries[0].iso_code.as_deref(), Some("FR"));
        assert_eq!(geo.countries[0].currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_country_order_and_percentages() {
        let events = vec![
            located(1, "Germany", Some("BE"), Some("Berlin")),
            located(2, "France", Some("IDF"), Some("Paris")),
            located(3, "France", Some("IDF"), Some("Paris")),
            located(4, "Spain", None, None),
        ];
        let geo = geo_breakdown(&events, 10);
        let names: Vec<&str> = geo.countries.iter().map(|c| c.country.as_str()).collect();
        assert_eq!(names, vec!["France", "Germany", "Spain"]);
        let sum: f64 = geo.countries.iter().map(|c| c.percentage).sum();
        assert!((sum - 100.0).abs() <= 0.1);

        // 州和城市只统计有值的点击
        assert_eq!(geo.states.len(), 2);
        assert_eq!(geo.states[0].state, "IDF");
        assert_eq!(geo.states[0].percentage, 66.67);
        assert_eq!(geo.cities[0].city, "Paris");
        assert_eq!(geo.cities[0].state.as_deref(), Some("IDF"));
    }

    #[test]
    fn test_top_n_truncates() {
        let events: Vec<ClickEvent> = ["Aa", "Bb", "Cc", "Dd"]
            .iter()
            .enumerate()
            .map(|(i, c)| located(i as i64, c, None, None))
            .collect();
        let geo = geo_breakdown(&events, 2);
        assert_eq!(geo.countries.len(), 2);
        assert_eq!(geo.distinct_countries, 4);
    }
}
