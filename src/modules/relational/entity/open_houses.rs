//! `mls_open_houses`: append-only per listing, de-duplicated on
//! `(listing_key, open_house_start_time, open_house_end_time)` (spec.md §3).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_open_houses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, string_len = 64)]
    pub open_house_key: String,

    pub listing_key: String,
    pub open_house_start_time: DateTimeWithTimeZone,
    pub open_house_end_time: DateTimeWithTimeZone,
    pub open_house_remarks: Option<String>,
    pub modification_timestamp: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,
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
