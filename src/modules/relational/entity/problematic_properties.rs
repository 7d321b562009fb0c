//! `mls_problematic_properties`: durable counterpart to the media worker's in-memory
//! quarantine map (spec.md §4.7) — what survives a process restart.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_problematic_properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, string_len = 64)]
    pub listing_key: String,

    pub consecutive_fails: i32,
    pub last_fail_at: Option<DateTimeWithTimeZone>,
    pub cooldown_until: Option<DateTimeWithTimeZone>,
    pub last_fail_reason: Option<String>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Property,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Property => Entity::belongs_to(super::properties::Entity)
                .from(Column::ListingKey)
                .to(super::properties::Column::ListingKey)
                .into(),
        }
    }
}

impl Related<super::properties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
