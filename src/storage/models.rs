use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// 链接 ID
pub type LinkId = i64;

/// 设备类型
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Default,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceKind {
    Mobile,
    Desktop,
    Tablet,
    Bot,
    #[default]
    Unknown,
}

impl DeviceKind {
    /// 解析存储中的设备字段，无法识别的值归为 Unknown
    pub fn parse_lossy(value: &str) -> Self {
        value.trim().parse().unwrap_or_default()
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, DeviceKind::Bot)
    }
}

/// 短链接（外部实体，只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub owner_id: i64,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// 地理位置（由记录器解析，全部可为空）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
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
}

impl GeoLocation {
    /// 国家是否可用于地理分布
    ///
    /// `"localhost"` 和空字符串视为未知。
    pub fn known_country(&self) -> Option<&str> {
        match self.country.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() && !c.eq_ignore_ascii_case("localhost") => Some(c),
            _ => None,
        }
    }

    /// 有效坐标（两者都存在且为有限值）
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }
}

/// 单次点击记录（不可变，只追加）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: i64,
    pub link_id: LinkId,
    pub timestamp: DateTime<Utc>,
    pub ip: String,
    #[serde(flatten)]
    pub geo: GeoLocation,
    #[serde(default)]
    pub device: DeviceKind,
    pub browser: Option<String>,
    pub browser_version: Option<String>,
    pub os: Option<String>,
    pub os_version: Option<String>,
    pub referrer: Option<String>,
    /// utm_source 或 `ref:{domain}`，由记录器写入
    pub source: Option<String>,
    pub accept_language: Option<String>,
    pub response_time: Option<f64>,
    /// 历史字段：记录器写入的会话位置，引擎不读取
    pub session_clicks: Option<i32>,
    pub is_weekend: bool,
    pub is_business_hours: bool,
    pub hour_of_day: u8,
}

impl ClickEvent {
    /// 创建点击记录，时间标记按 UTC 推导
    pub fn new(id: i64, link_id: LinkId, timestamp: DateTime<Utc>, ip: impl Into<String>) -> Self {
        let (is_weekend, is_business_hours, hour_of_day) = derive_time_flags(timestamp);
        Self {
            id,
            link_id,
            timestamp,
            ip: ip.into(),
            geo: GeoLocation::default(),
            device: DeviceKind::Unknown,
            browser: None,
            browser_version: None,
            os: None,
            os_version: None,
            referrer: None,
            source: None,
            accept_language: None,
            response_time: None,
            session_clicks: None,
            is_weekend,
            is_business_hours,
            hour_of_day,
        }
    }

    pub fn with_device(mut self, device: DeviceKind) -> Self {
        self.device = device;
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.geo.country = Some(country.into());
        self
    }

    pub fn with_geo(mut self, geo: GeoLocation) -> Self {
        self.geo = geo;
        self
    }

    pub fn with_browser(mut self, browser: impl Into<String>, os: impl Into<String>) -> Self {
        self.browser = Some(browser.into());
        self.os = Some(os.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_language(mut self, accept_language: impl Into<String>) -> Self {
        self.accept_language = Some(accept_language.into());
        self
    }

    pub fn with_response_time(mut self, millis: f64) -> Self {
        self.response_time = Some(millis);
        self
    }

    /// 原始流量来源
    ///
    /// 优先使用记录器写入的 source，其次是 referrer 的域名，否则为 direct。
    pub fn traffic_source(&self) -> String {
        if let Some(source) = self.source.as_deref().map(str::trim)
            && !source.is_empty()
        {
            return source.to_string();
        }

        match self.referrer.as_deref().map(str::trim) {
            Some(referrer) if !referrer.is_empty() => match url::Url::parse(referrer) {
                Ok(parsed) => match parsed.host_str() {
                    Some(host) => format!("ref:{}", host.trim_start_matches("www.")),
                    None => format!("ref:{}", referrer),
                },
                Err(_) => format!("ref:{}", referrer),
            },
            _ => "direct".to_string(),
        }
    }

    /// Accept-Language 的主语言子标签（小写），例如 `en-US,en;q=0.9` → `en`
    pub fn primary_language(&self) -> Option<String> {
        let header = self.accept_language.as_deref()?;
        let first = header.split(',').next()?.split(';').next()?.trim();
        let primary = first.split(['-', '_']).next()?.trim();
        if primary.is_empty() || primary == "*" {
            None
        } else {
            Some(primary.to_ascii_lowercase())
        }
    }

    /// 星期（0 = Sunday ... 6 = Saturday）
    pub fn day_of_week(&self) -> u8 {
        self.timestamp.weekday().num_days_from_sunday() as u8
    }
}

/// 工作时间：周一至周五 09:00–17:00
fn derive_time_flags(timestamp: DateTime<Utc>) -> (bool, bool, u8) {
    let hour = timestamp.hour() as u8;
    let is_weekend = matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun);
    let is_business_hours = !is_weekend && (9..17).contains(&hour);
    (is_weekend, is_business_hours, hour)
}
