//! `mls_properties`: the authoritative row per upstream `Property` (Listing). See
//! migration `m20260210_000001_create_mls_schema_and_properties` for the trigger that
//! maintains `geog` from `latitude`/`longitude`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mls_properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, string_len = 64)]
    pub listing_key: String,

    pub originating_system: String,
    pub standard_status: Option<String>,
    pub property_type: Option<String>,
    pub property_sub_type: Option<String>,

    pub list_price: Option<Decimal>,
    pub original_list_price: Option<Decimal>,

    pub bedrooms_total: Option<i32>,
    pub bathrooms_total_integer: Option<i32>,
    pub living_area: Option<i32>,
    pub year_built: Option<i32>,
    pub lot_size_area: Option<Decimal>,
    pub garage_spaces: Option<i32>,
    pub parking_total: Option<i32>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub unparsed_address: Option<String>,
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub postal_code: Option<String>,
    pub county_or_parish: Option<String>,
    pub subdivision_name: Option<String>,
    pub public_remarks: Option<String>,

    pub mlg_can_view: bool,
    pub permitted_use: Json,

    pub modification_timestamp: DateTimeWithTimeZone,
    pub photos_change_timestamp: Option<DateTimeWithTimeZone>,
    pub original_entry_timestamp: Option<DateTimeWithTimeZone>,
    pub price_change_timestamp: Option<DateTimeWithTimeZone>,
    pub major_change_timestamp: Option<DateTimeWithTimeZone>,

    pub raw: Json,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Media,
    Rooms,
    UnitTypes,
    OpenHouses,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Media => Entity::has_many(super::media::Entity).into(),
            Self::Rooms => Entity::has_many(super::rooms::Entity).into(),
            Self::UnitTypes => Entity::has_many(super::unit_types::Entity).into(),
            Self::OpenHouses => Entity::has_many(super::open_houses::Entity).into(),
        }
    }
}

impl Related<super::media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl Related<super::rooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rooms.def()
    }
}

impl Related<super::unit_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UnitTypes.def()
    }
}

impl Related<super::open_houses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OpenHouses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
