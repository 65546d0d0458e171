use crate::storage::models::{ClickEvent, DeviceKind, GeoLocation, Link};
use migration::entities::{click_event, short_link};

/// 将 Sea-ORM Model 转换为 Link
pub fn model_to_link(model: short_link::Model) -> Link {
    Link {
        id: model.id,
        owner_id: model.owner_id,
        slug: model.slug,
        created_at: model.created_at,
        is_active: model.is_active,
    }
}

/// 将 Sea-ORM Model 转换为 ClickEvent
pub fn model_to_click(model: click_event::Model) -> ClickEvent {
    ClickEvent {
        id: model.id,
        link_id: model.link_id,
        timestamp: model.clicked_at,
        ip: model.ip_address,
        geo: GeoLocation {
            country: model.country,
            iso_code: model.iso_code,
            state: model.state,
            state_name: model.state_name,
            city: model.city,
            postal_code: model.postal_code,
            latitude: model.latitude,
            longitude: model.longitude,
            continent: model.continent,
            timezone: model.timezone,
            currency: model.currency,
        },
        device: DeviceKind::parse_lossy(&model.device),
        browser: model.browser,
        browser_version: model.browser_version,
        os: model.os,
        os_version: model.os_version,
        referrer: model.referrer,
        source: model.source,
        accept_language: model.accept_language,
        response_time: model.response_time,
        session_clicks: model.session_clicks,
        is_weekend: model.is_weekend,
        is_business_hours: model.is_business_hours,
        // 脏数据不会超出 0..=23
        hour_of_day: model.hour_of_day.clamp(0, 23) as u8,
    }
}

/// 将 Link 转换为 ActiveModel（测试夹具与数据导入使用）
pub fn link_to_active_model(link: &Link) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::*;

    short_link::ActiveModel {
        id: Set(link.id),
        owner_id: Set(link.owner_id),
        slug: Set(link.slug.clone()),
        target_url: Set(String::new()),
        created_at: Set(link.created_at),
        is_active: Set(link.is_active),
    }
}

/// 将 ClickEvent 转换为 ActiveModel，ID 由数据库分配
pub fn click_to_active_model(click: &ClickEvent) -> click_event::ActiveModel {
    use sea_orm::ActiveValue::*;

    click_event::ActiveModel {
        id: NotSet,
        link_id: Set(click.link_id),
        clicked_at: Set(click.timestamp),
        ip_address: Set(click.ip.clone()),
        country: Set(click.geo.country.clone()),
        iso_code: Set(click.geo.iso_code.clone()),
        state: Set(click.geo.state.clone()),
        state_name: Set(click.geo.state_name.clone()),
        city: Set(click.geo.city.clone()),
        postal_code: Set(click.geo.postal_code.clone()),
        latitude: Set(click.geo.latitude),
        longitude: Set(click.geo.longitude),
        continent: Set(click.geo.continent.clone()),
        timezone: Set(click.geo.timezone.clone()),
        currency: Set(click.geo.currency.clone()),
        device: Set(click.device.to_string()),
        browser: Set(click.browser.clone()),
        browser_version: Set(click.browser_version.clone()),
        os: Set(click.os.clone()),
        os_version: Set(click.os_version.clone()),
        referrer: Set(click.referrer.clone()),
        source: Set(click.source.clone()),
        accept_language: Set(click.accept_language.clone()),
        response_time: Set(click.response_time),
        session_clicks: Set(click.session_clicks),
        is_weekend: Set(click.is_weekend),
        is_business_hours: Set(click.is_business_hours),
        hour_of_day: Set(click.hour_of_day as i16),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_model() -> click_event::Model {
        click_event::Model {
            id: 7,
            link_id: 3,
            clicked_at: Utc::now(),
            ip_address: "203.0.113.9".to_string(),
            country: Some("Japan".to_string()),
            iso_code: Some("JP".to_string()),
            state: None,
            state_name: None,
            city: Some("Tokyo".to_string()),
            postal_code: None,
            latitude: Some(35.68),
            longitude: Some(139.69),
            continent: Some("Asia".to_string()),
            timezone: Some("Asia/Tokyo".to_string()),
            currency: Some("JPY".to_string()),
            device: "Tablet".to_string(),
            browser: Some("Safari".to_string()),
            browser_version: None,
            os: Some("iPadOS".to_string()),
            os_version: None,
            referrer: None,
            source: Some("newsletter".to_string()),
            accept_language: Some("ja-JP".to_string()),
            response_time: Some(12.5),
            session_clicks: Some(2),
            is_weekend: false,
            is_business_hours: true,
            hour_of_day: 42,
        }
    }

    #[test]
    fn test_model_to_click() {
        let click = model_to_click(create_test_model());
        assert_eq!(click.id, 7);
        assert_eq!(click.link_id, 3);
        assert_eq!(click.device, DeviceKind::Tablet);
        assert_eq!(click.geo.currency.as_deref(), Some("JPY"));
        assert_eq!(click.geo.coordinates(), Some((35.68, 139.69)));
        assert_eq!(click.hour_of_day, 23);
    }

    #[test]
    fn test_click_to_active_model_leaves_id_unset() {
        let click = model_to_click(create_test_model());
        let active = click_to_active_model(&click);
        assert!(matches!(active.id, sea_orm::ActiveValue::NotSet));
        assert_eq!(active.device.unwrap(), "tablet");
    }
}
