//! `mls_media`: mirrors the upstream `Media` resource. `local_url` is `NULL` until the
//! media-hydration worker uploads the asset; see spec.md §3 (MediaAsset invariants).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, string_len = 64)]
    pub media_key: String,

    pub resource_record_key: String,
    pub media_category: Option<String>,
    pub media_order: Option<i32>,
    pub media_url: Option<String>,
    pub local_url: Option<String>,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
    pub media_modification_timestamp: DateTimeWithTimeZone,

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
                .from(Column::ResourceRecordKey)
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
