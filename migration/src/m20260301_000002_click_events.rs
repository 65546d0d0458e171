//! 点击事件表迁移
//!
//! 创建 click_events 表，保存每次访问的完整记录：
//! - 时间戳与 IP
//! - 地理位置（国家/州/城市/坐标/时区/货币）
//! - 设备、浏览器、操作系统
//! - 来源、语言、响应时间
//! - 记录器预先计算的时间标记（周末、工作时间、小时）

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClickEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClickEvents::LinkId).big_integer().not_null())
                    .col(
                        ColumnDef::new(ClickEvents::ClickedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::IpAddress)
                            .string_len(45)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvents::Country).string_len(100).null())
                    .col(ColumnDef::new(ClickEvents::IsoCode).string_len(2).null())
                    .col(ColumnDef::new(ClickEvents::State).string_len(100).null())
                    .col(ColumnDef::new(ClickEvents::StateName).string_len(100).null())
                    .col(ColumnDef::new(ClickEvents::City).string_len(100).null())
                    .col(ColumnDef::new(ClickEvents::PostalCode).string_len(20).null())
                    .col(ColumnDef::new(ClickEvents::Latitude).double().null())
                    .col(ColumnDef::new(ClickEvents::Longitude).double().null())
                    .col(ColumnDef::new(ClickEvents::Continent).string_len(50).null())
                    .col(ColumnDef::new(ClickEvents::Timezone).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::Currency).string_len(3).null())
                    .col(
                        ColumnDef::new(ClickEvents::Device)
                            .string_len(16)
                            .not_null()
                            .default("unknown"),
                    )
                    .col(ColumnDef::new(ClickEvents::Browser).string_len(64).null())
                    .col(
                        ColumnDef::new(ClickEvents::BrowserVersion)
                            .string_len(32)
                            .null(),
                    )
                    .col(ColumnDef::new(ClickEvents::Os).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::OsVersion).string_len(32).null())
                    .col(ColumnDef::new(ClickEvents::Referrer).text().null())
                    .col(ColumnDef::new(ClickEvents::Source).string_len(255).null())
                    .col(
                        ColumnDef::new(ClickEvents::AcceptLanguage)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(ClickEvents::ResponseTime).double().null())
                    .col(ColumnDef::new(ClickEvents::SessionClicks).integer().null())
                    .col(
                        ColumnDef::new(ClickEvents::IsWeekend)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::IsBusinessHours)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::HourOfDay)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClickEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum ClickEvents {
    #[sea_orm(iden = "click_events")]
    Table,
    Id,
    LinkId,
    ClickedAt,
    IpAddress,
    Country,
    IsoCode,
    State,
    StateName,
    City,
    PostalCode,
    Latitude,
    Longitude,
    Continent,
    Timezone,
    Currency,
    Device,
    Browser,
    BrowserVersion,
    Os,
    OsVersion,
    Referrer,
    Source,
    AcceptLanguage,
    ResponseTime,
    SessionClicks,
    IsWeekend,
    IsBusinessHours,
    HourOfDay,
}
