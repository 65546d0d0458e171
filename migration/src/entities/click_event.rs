//! Click event entity (append-only visit log)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "click_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTimeUtc,
    pub ip_address: String,
    pub country: Option<String>,
    pub iso_code: Option<String>,
    pub state: Option<String>,
    pub state_name: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub continent: Option<String>,
    pub timezone: Option<String>,
    pub currency: Option<String>,
    /// mobile / desktop / tablet / bot / unknown
    pub device: String,
    pub browser: Option<String>,
    pub browser_version: Option<String>,
    pub os: Option<String>,
    pub os_version: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub referrer: Option<String>,
    /// Traffic source (utm_source param, ref:{domain}, or direct)
    pub source: Option<String>,
    pub accept_language: Option<String>,
    /// Redirect response time in milliseconds
    pub response_time: Option<f64>,
    /// Legacy per-visit session position written by the recorder
    pub session_clicks: Option<i32>,
    pub is_weekend: bool,
    pub is_business_hours: bool,
    pub hour_of_day: i16,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
