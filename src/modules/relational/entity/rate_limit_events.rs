//! `mls_rate_limit_events`: append-only log of observed 429s, read only by the
//! progress recorder (spec.md §4.8).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_rate_limit_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub endpoint: String,
    pub retry_after_seconds: Option<i32>,
    pub occurred_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
