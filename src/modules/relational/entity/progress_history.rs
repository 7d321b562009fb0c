//! `mls_progress_history`: periodic aggregate snapshot written by
//! `progress::recorder` (spec.md §4.8), retained for seven days.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_progress_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub recorded_at: DateTimeWithTimeZone,
    pub total_listings: i64,
    pub active_listings: i64,
    pub total_media: i64,
    pub hydrated_media: i64,
    pub missing_media: i64,
    pub pct_hydrated: Decimal,
    pub listings_with_missing_media: i64,
    pub downloads_completed: i64,
    pub api_rate_limited: bool,
    pub media_rate_limited: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
