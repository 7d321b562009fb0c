//! `mls_members`: the upstream `Member` (agent) resource, independent dimension synced
//! on its own delta cycle. `office_key` is a soft reference — no FK enforcement beyond
//! the migration's `SET NULL` on office deletion.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, string_len = 64)]
    pub member_key: String,

    pub originating_system: String,
    pub member_full_name: Option<String>,
    pub member_email: Option<String>,
    pub member_phone: Option<String>,
    pub office_key: Option<String>,
    pub member_status: Option<String>,
    pub raw: Json,
    pub modification_timestamp: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Office,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Office => Entity::belongs_to(super::offices::Entity)
                .from(Column::OfficeKey)
                .to(super::offices::Column::OfficeKey)
                .into(),
        }
    }
}

impl Related<super::offices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Office.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
