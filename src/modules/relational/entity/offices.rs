//! `mls_offices`: independent dimension, synced on its own delta cycle (spec.md §3).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_offices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, string_len = 64)]
    pub office_key: String,

    pub originating_system: String,
    pub office_name: Option<String>,
    pub office_phone: Option<String>,
    pub office_email: Option<String>,
    pub office_address1: Option<String>,
    pub office_city: Option<String>,
    pub office_state_or_province: Option<String>,
    pub office_postal_code: Option<String>,
    pub raw: Json,
    pub modification_timestamp: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Members,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Members => Entity::has_many(super::members::Entity).into(),
        }
    }
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
