//! Lightweight domain structs the sync drivers build from raw upstream JSON records
//! before handing them to the `RelationalStore` port. Mirrors the teacher's
//! `Model`/domain-struct split in `cv` and `multimedia` — the sea-orm `Model` stays a
//! pure persistence shape, this is what application code actually passes around.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::coercion::{coerce_bool, coerce_decimal, coerce_integer, coerce_string};

#[derive(Debug, Clone)]
pub struct Listing {
    pub listing_key: String,
    pub originating_system: String,
    pub standard_status: Option<String>,
    pub property_type: Option<String>,
    pub property_sub_type: Option<String>,
    pub list_price: Option<f64>,
    pub original_list_price: Option<f64>,
    pub bedrooms_total: Option<i32>,
    pub bathrooms_total_integer: Option<i32>,
    pub living_area: Option<i32>,
    pub year_built: Option<i32>,
    pub lot_size_area: Option<f64>,
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
    pub permitted_use: Value,
    pub modification_timestamp: DateTime<Utc>,
    pub photos_change_timestamp: Option<DateTime<Utc>>,
    pub original_entry_timestamp: Option<DateTime<Utc>>,
    pub price_change_timestamp: Option<DateTime<Utc>>,
    pub major_change_timestamp: Option<DateTime<Utc>>,
    pub raw: Value,
    pub media: Vec<MediaAsset>,
    pub rooms: Vec<Room>,
    pub unit_types: Vec<UnitType>,
}

impl Listing {
    /// Parses a raw `Property` record from the upstream OData feed. Fields the
    /// structured columns don't cover are preserved verbatim in `raw` regardless of
    /// which of them this function recognizes (spec.md §4.4 preservation contract).
    pub fn from_upstream(raw: Value, originating_system: &str) -> Option<Self> {
        let listing_key = raw.get("ListingKey")?.as_str()?.to_string();
        let modification_timestamp = parse_timestamp(raw.get("ModificationTimestamp")?)?;

        let media = raw
            .get("Media")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|m| MediaAsset::from_upstream(m, &listing_key)).collect())
            .unwrap_or_default();

        let rooms = raw
            .get("Rooms")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|r| Room::from_upstream(r, &listing_key)).collect())
            .unwrap_or_default();

        let unit_types = raw
            .get("UnitTypes")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|u| UnitType::from_upstream(u, &listing_key)).collect())
            .unwrap_or_default();

        Some(Self {
            listing_key,
            originating_system: originating_system.to_string(),
            standard_status: field_str(&raw, "StandardStatus"),
            property_type: field_str(&raw, "PropertyType"),
            property_sub_type: field_str(&raw, "PropertySubType"),
            list_price: field_decimal(&raw, "ListPrice"),
            original_list_price: field_decimal(&raw, "OriginalListPrice"),
            bedrooms_total: field_int(&raw, "BedroomsTotal"),
            bathrooms_total_integer: field_int(&raw, "BathroomsTotalInteger"),
            living_area: field_int(&raw, "LivingArea"),
            year_built: field_int(&raw, "YearBuilt"),
            lot_size_area: field_decimal(&raw, "LotSizeArea"),
            garage_spaces: field_int(&raw, "GarageSpaces"),
            parking_total: field_int(&raw, "ParkingTotal"),
            latitude: field_decimal(&raw, "Latitude"),
            longitude: field_decimal(&raw, "Longitude"),
            unparsed_address: field_str(&raw, "UnparsedAddress"),
            city: field_str(&raw, "City"),
            state_or_province: field_str(&raw, "StateOrProvince"),
            postal_code: field_str(&raw, "PostalCode"),
            county_or_parish: field_str(&raw, "CountyOrParish"),
            subdivision_name: field_str(&raw, "SubdivisionName"),
            public_remarks: field_str(&raw, "PublicRemarks"),
            mlg_can_view: raw.get("MlgCanView").map(|v| coerce_bool(v, true)).unwrap_or(true),
            permitted_use: raw.get("PermittedUse").cloned().unwrap_or(Value::Array(vec![])),
            modification_timestamp,
            photos_change_timestamp: raw.get("PhotosChangeTimestamp").and_then(parse_timestamp),
            original_entry_timestamp: raw.get("OriginalEntryTimestamp").and_then(parse_timestamp),
            price_change_timestamp: raw.get("PriceChangeTimestamp").and_then(parse_timestamp),
            major_change_timestamp: raw.get("MajorChangeTimestamp").and_then(parse_timestamp),
            raw,
            media,
            rooms,
            unit_types,
        })
    }

    pub fn is_visible(&self) -> bool {
        self.mlg_can_view
    }
}

#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub media_key: String,
    pub resource_record_key: String,
    pub media_category: Option<String>,
    pub media_order: Option<i32>,
    pub media_url: Option<String>,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
    pub media_modification_timestamp: DateTime<Utc>,
}

impl MediaAsset {
    pub fn from_upstream(raw: &Value, listing_key: &str) -> Option<Self> {
        let media_key = raw.get("MediaKey")?.as_str()?.to_string();
        let media_modification_timestamp = parse_timestamp(raw.get("MediaModificationTimestamp")?)?;

        Some(Self {
            media_key,
            resource_record_key: listing_key.to_string(),
            media_category: field_str(raw, "MediaCategory"),
            media_order: field_int(raw, "Order"),
            media_url: field_str(raw, "MediaURL"),
            image_width: field_int(raw, "ImageWidth"),
            image_height: field_int(raw, "ImageHeight"),
            media_modification_timestamp,
        })
    }

    pub fn is_video(&self) -> bool {
        self.media_category
            .as_deref()
            .map(|c| c.eq_ignore_ascii_case("video"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub listing_key: String,
    pub room_type: Option<String>,
    pub room_level: Option<String>,
    pub room_length: Option<f64>,
    pub room_width: Option<f64>,
}

impl Room {
    pub fn from_upstream(raw: &Value, listing_key: &str) -> Option<Self> {
        Some(Self {
            listing_key: listing_key.to_string(),
            room_type: field_str(raw, "RoomType"),
            room_level: field_str(raw, "RoomLevel"),
            room_length: field_decimal(raw, "RoomLength"),
            room_width: field_decimal(raw, "RoomWidth"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UnitType {
    pub listing_key: String,
    pub unit_type_type: Option<String>,
    pub beds_total: Option<i32>,
    pub baths_total: Option<f64>,
    pub actual_rent: Option<f64>,
}

impl UnitType {
    pub fn from_upstream(raw: &Value, listing_key: &str) -> Option<Self> {
        Some(Self {
            listing_key: listing_key.to_string(),
            unit_type_type: field_str(raw, "UnitTypeType"),
            beds_total: field_int(raw, "BedsTotal"),
            baths_total: field_decimal(raw, "BathsTotal"),
            actual_rent: field_decimal(raw, "ActualRent"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenHouse {
    pub open_house_key: String,
    pub listing_key: String,
    pub open_house_start_time: DateTime<Utc>,
    pub open_house_end_time: DateTime<Utc>,
    pub open_house_remarks: Option<String>,
    pub modification_timestamp: DateTime<Utc>,
}

impl OpenHouse {
    pub fn from_upstream(raw: &Value) -> Option<Self> {
        Some(Self {
            open_house_key: raw.get("OpenHouseKey")?.as_str()?.to_string(),
            listing_key: raw.get("ListingKey")?.as_str()?.to_string(),
            open_house_start_time: parse_timestamp(raw.get("OpenHouseStartTime")?)?,
            open_house_end_time: parse_timestamp(raw.get("OpenHouseEndTime")?)?,
            open_house_remarks: field_str(raw, "OpenHouseRemarks"),
            modification_timestamp: parse_timestamp(raw.get("ModificationTimestamp")?)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Office {
    pub office_key: String,
    pub originating_system: String,
    pub office_name: Option<String>,
    pub office_phone: Option<String>,
    pub office_email: Option<String>,
    pub office_address1: Option<String>,
    pub office_city: Option<String>,
    pub office_state_or_province: Option<String>,
    pub office_postal_code: Option<String>,
    pub raw: Value,
    pub modification_timestamp: DateTime<Utc>,
}

impl Office {
    pub fn from_upstream(raw: Value, originating_system: &str) -> Option<Self> {
        let office_key = raw.get("OfficeKey")?.as_str()?.to_string();
        let modification_timestamp = parse_timestamp(raw.get("ModificationTimestamp")?)?;

        Some(Self {
            office_key,
            originating_system: originating_system.to_string(),
            office_name: field_str(&raw, "OfficeName"),
            office_phone: field_str(&raw, "OfficePhone"),
            office_email: field_str(&raw, "OfficeEmail"),
            office_address1: field_str(&raw, "OfficeAddress1"),
            office_city: field_str(&raw, "OfficeCity"),
            office_state_or_province: field_str(&raw, "OfficeStateOrProvince"),
            office_postal_code: field_str(&raw, "OfficePostalCode"),
            modification_timestamp,
            raw,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub member_key: String,
    pub originating_system: String,
    pub member_full_name: Option<String>,
    pub member_email: Option<String>,
    pub member_phone: Option<String>,
    pub office_key: Option<String>,
    pub member_status: Option<String>,
    pub raw: Value,
    pub modification_timestamp: DateTime<Utc>,
}

impl Member {
    pub fn from_upstream(raw: Value, originating_system: &str) -> Option<Self> {
        let member_key = raw.get("MemberKey")?.as_str()?.to_string();
        let modification_timestamp = parse_timestamp(raw.get("ModificationTimestamp")?)?;

        Some(Self {
            member_key,
            originating_system: originating_system.to_string(),
            member_full_name: field_str(&raw, "MemberFullName"),
            member_email: field_str(&raw, "MemberEmail"),
            member_phone: field_str(&raw, "MemberPhone"),
            office_key: field_str(&raw, "OfficeKey"),
            member_status: field_str(&raw, "MemberStatus"),
            modification_timestamp,
            raw,
        })
    }
}

fn field_str(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(coerce_string)
}

fn field_int(raw: &Value, key: &str) -> Option<i32> {
    raw.get(key).and_then(coerce_integer)
}

fn field_decimal(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(coerce_decimal)
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_listing_json() -> Value {
        json!({
            "ListingKey": "L1",
            "ModificationTimestamp": "2025-01-01T00:00:00Z",
            "MlgCanView": true,
            "LivingArea": "472.44",
            "Media": [
                {
                    "MediaKey": "M1",
                    "MediaCategory": "Photo",
                    "Order": 0,
                    "MediaURL": "https://example.com/1.jpg?expires=123",
                    "MediaModificationTimestamp": "2025-01-01T00:00:00Z"
                },
                {
                    "MediaKey": "M2",
                    "MediaCategory": "Video",
                    "Order": 1,
                    "MediaURL": "https://example.com/1.mp4",
                    "MediaModificationTimestamp": "2025-01-01T00:00:00Z"
                }
            ]
        })
    }

    #[test]
    fn from_upstream_parses_structured_fields_and_keeps_raw() {
        let listing = Listing::from_upstream(sample_listing_json(), "ABOR").unwrap();
        assert_eq!(listing.listing_key, "L1");
        assert_eq!(listing.living_area, Some(472));
        assert_eq!(listing.raw.get("LivingArea").unwrap().as_str(), Some("472.44"));
        assert_eq!(listing.media.len(), 2);
    }

    #[test]
    fn media_asset_is_video_detects_category_case_insensitively() {
        let listing = Listing::from_upstream(sample_listing_json(), "ABOR").unwrap();
        assert!(!listing.media[0].is_video());
        assert!(listing.media[1].is_video());
    }

    #[test]
    fn from_upstream_returns_none_without_listing_key() {
        let raw = json!({ "ModificationTimestamp": "2025-01-01T00:00:00Z" });
        assert!(Listing::from_upstream(raw, "ABOR").is_none());
    }
}
