//! `mls_sync_state`: one row per `(resource, originating_system)`, the sole source of
//! resumability across process restarts (spec.md §3, §8 resumability invariant).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_sync_state")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, string_len = 64)]
    pub resource: String,

    #[sea_orm(primary_key, auto_increment = false, string_len = 64)]
    pub originating_system: String,

    pub high_water_mark: DateTimeWithTimeZone,
    pub last_run_at: Option<DateTimeWithTimeZone>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
