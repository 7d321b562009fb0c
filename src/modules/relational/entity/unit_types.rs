//! `mls_unit_types`: wholesale-replaced per listing on every sync cycle, same rationale
//! as `mls_rooms`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_unit_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub listing_key: String,
    pub unit_type_type: Option<String>,
    pub beds_total: Option<i32>,
    pub baths_total: Option<Decimal>,
    pub actual_rent: Option<Decimal>,

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
