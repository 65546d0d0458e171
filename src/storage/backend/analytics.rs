//! ClickStore 的 SeaORM 实现
//!
//! 过滤条件尽量下推到 SQL，最后再用 `ClickQuery::matches` 校正
//! （例如 trim 后为空的字符串），保证与内存实现语义一致。

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use tracing::{debug, trace};

use super::SeaOrmStorage;
use super::converters::{model_to_click, model_to_link};
use crate::errors::{InsightError, Result};
use crate::storage::ClickStore;
use crate::storage::models::{ClickEvent, Link, LinkId};
use crate::storage::query::{ClickField, ClickQuery};

use migration::entities::{click_event, short_link};

fn store_error(context: &str, err: sea_orm::DbErr) -> InsightError {
    // 查询阶段的任何数据库错误都意味着事件存储不可用，交给调用方处理
    InsightError::upstream_unavailable(format!("{}: {}", context, err))
}

fn required_condition(field: ClickField) -> Condition {
    use click_event::Column;

    match field {
        ClickField::Country => Condition::all()
            .add(Column::Country.is_not_null())
            .add(Column::Country.ne(""))
            .add(Column::Country.ne("localhost")),
        ClickField::City => Condition::all()
            .add(Column::City.is_not_null())
            .add(Column::City.ne("")),
        ClickField::Coordinates => Condition::all()
            .add(Column::Latitude.is_not_null())
            .add(Column::Longitude.is_not_null()),
        ClickField::Referrer => Condition::all()
            .add(Column::Referrer.is_not_null())
            .add(Column::Referrer.ne("")),
        ClickField::Source => Condition::all()
            .add(Column::Source.is_not_null())
            .add(Column::Source.ne("")),
        ClickField::AcceptLanguage => Condition::all()
            .add(Column::AcceptLanguage.is_not_null())
            .add(Column::AcceptLanguage.ne("")),
        ClickField::ResponseTime => Condition::all().add(Column::ResponseTime.is_not_null()),
        ClickField::Browser => Condition::all()
            .add(Column::Browser.is_not_null())
            .add(Column::Browser.ne("")),
        ClickField::Os => Condition::all()
            .add(Column::Os.is_not_null())
            .add(Column::Os.ne("")),
    }
}

fn build_select(query: &ClickQuery) -> Select<click_event::Entity> {
    use click_event::Column;

    let mut select =
        click_event::Entity::find().filter(Column::LinkId.is_in(query.link_ids.clone()));
    if let Some(start) = query.start {
        select = select.filter(Column::ClickedAt.gte(start));
    }
    if let Some(end) = query.end {
        select = select.filter(Column::ClickedAt.lt(end));
    }
    for field in &query.required {
        select = select.filter(required_condition(*field));
    }
    select
}

#[async_trait]
impl ClickStore for SeaOrmStorage {
    async fn find_link(&self, id: LinkId) -> Result<Option<Link>> {
        let model = short_link::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| store_error("Link lookup failed", e))?;
        Ok(model.map(model_to_link))
    }

    async fn find_links(&self, ids: &[LinkId]) -> Result<Vec<Link>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = short_link::Entity::find()
            .filter(short_link::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(short_link::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| store_error("Link batch lookup failed", e))?;
        Ok(models.into_iter().map(model_to_link).collect())
    }

    async fn load_clicks(&self, query: &ClickQuery) -> Result<Vec<ClickEvent>> {
        query.validate()?;
        trace!("SeaOrmStorage.load_clicks: {:?}", query);

        let models = build_select(query)
            .order_by_asc(click_event::Column::ClickedAt)
            .order_by_asc(click_event::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| store_error("Click query failed", e))?;

        let clicks: Vec<ClickEvent> = models
            .into_iter()
            .map(model_to_click)
            .filter(|click| query.matches(click))
            .collect();

        debug!(
            "SeaOrmStorage.load_clicks returned {} clicks for {} link(s)",
            clicks.len(),
            query.link_ids.len()
        );
        Ok(clicks)
    }

    async fn count_clicks(&self, query: &ClickQuery) -> Result<u64> {
        query.validate()?;
        if !query.required.is_empty() {
            // 字段校正只能在 Rust 侧完成
            return Ok(self.load_clicks(query).await?.len() as u64);
        }

        build_select(query)
            .count(&self.db)
            .await
            .map_err(|e| store_error("Click count failed", e))
    }

    fn backend_name(&self) -> &str {
        &self.backend_name
    }
}
