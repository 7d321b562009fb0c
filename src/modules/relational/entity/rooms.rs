//! `mls_rooms`: wholesale-replaced per listing on every sync cycle (spec.md §3), since
//! upstream only ever supplies the full current set, never a per-room delta.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_rooms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub listing_key: String,
    pub room_type: Option<String>,
    pub room_level: Option<String>,
    pub room_length: Option<Decimal>,
    pub room_width: Option<Decimal>,

    pub created_at: DateTimeWithTimeZone,
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
