//! `mls_settings`: operator-tunable key/value pairs. The media governor's
//! `min_interval` is the current sole consumer (spec.md §4.2 live tuning).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, string_len = 128)]
    pub key: String,

    pub value: String,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const MEDIA_MIN_INTERVAL_MS: &str = "media_min_interval_ms";
