//! Search indexer port + Meilisearch adapter: keeps one document per `Listing` in sync
//! with the relational store. The DB is authoritative (spec.md §5); this adapter's
//! writes are best-effort and self-heal on the next successful upsert.

pub mod meili;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::modules::relational::domain::Listing;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchIndexError {
    #[error("search index configuration failed: {0}")]
    Configuration(String),

    #[error("search index write failed: {0}")]
    WriteFailed(String),

    #[error("search index delete failed: {0}")]
    DeleteFailed(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Structured projection of a `Listing` for the search index. Deliberately excludes
/// `raw` — the index mirrors queryable fields only, never the opaque upstream blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDocument {
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
    pub unparsed_address: Option<String>,
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub postal_code: Option<String>,
    pub county_or_parish: Option<String>,
    pub subdivision_name: Option<String>,
    pub public_remarks: Option<String>,
    pub mlg_can_view: bool,
    pub modification_timestamp_millis: i64,
    pub original_entry_timestamp_millis: Option<i64>,
    #[serde(rename = "_geo", skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoPoint>,
}

impl From<&Listing> for ListingDocument {
    fn from(listing: &Listing) -> Self {
        let geo = match (listing.latitude, listing.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Self {
            listing_key: listing.listing_key.clone(),
            originating_system: listing.originating_system.clone(),
            standard_status: listing.standard_status.clone(),
            property_type: listing.property_type.clone(),
            property_sub_type: listing.property_sub_type.clone(),
            list_price: listing.list_price,
            original_list_price: listing.original_list_price,
            bedrooms_total: listing.bedrooms_total,
            bathrooms_total_integer: listing.bathrooms_total_integer,
            living_area: listing.living_area,
            year_built: listing.year_built,
            lot_size_area: listing.lot_size_area,
            garage_spaces: listing.garage_spaces,
            parking_total: listing.parking_total,
            unparsed_address: listing.unparsed_address.clone(),
            city: listing.city.clone(),
            state_or_province: listing.state_or_province.clone(),
            postal_code: listing.postal_code.clone(),
            county_or_parish: listing.county_or_parish.clone(),
            subdivision_name: listing.subdivision_name.clone(),
            public_remarks: listing.public_remarks.clone(),
            mlg_can_view: listing.mlg_can_view,
            modification_timestamp_millis: listing.modification_timestamp.timestamp_millis(),
            original_entry_timestamp_millis: listing
                .original_entry_timestamp
                .map(|t| t.timestamp_millis()),
            geo,
        }
    }
}

pub const SEARCHABLE_ATTRIBUTES: &[&str] = &[
    "listing_key",
    "unparsed_address",
    "city",
    "postal_code",
    "subdivision_name",
    "public_remarks",
];

pub const FILTERABLE_ATTRIBUTES: &[&str] = &[
    "mlg_can_view",
    "standard_status",
    "property_type",
    "property_sub_type",
    "city",
    "state_or_province",
    "postal_code",
    "county_or_parish",
    "list_price",
    "original_list_price",
    "bedrooms_total",
    "bathrooms_total_integer",
    "living_area",
    "year_built",
    "lot_size_area",
    "garage_spaces",
    "parking_total",
];

pub const SORTABLE_ATTRIBUTES: &[&str] = &[
    "list_price",
    "modification_timestamp_millis",
    "original_entry_timestamp_millis",
    "bedrooms_total",
    "bathrooms_total_integer",
    "living_area",
    "year_built",
    "lot_size_area",
];

#[async_trait]
pub trait SearchIndexer: Send + Sync {
    /// Idempotent startup configuration: create the index if absent, always refresh
    /// searchable attributes, and only seed filterable/sortable attributes if the
    /// index currently reports none (spec.md §4.5).
    async fn ensure_configured(&self) -> Result<(), SearchIndexError>;
    async fn upsert(&self, listing: &Listing) -> Result<(), SearchIndexError>;
    async fn delete(&self, listing_key: &str) -> Result<(), SearchIndexError>;
    async fn clear(&self) -> Result<(), SearchIndexError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn projection_sets_geo_point_when_coordinates_present() {
        let listing = Listing::from_upstream(
            json!({
                "ListingKey": "L1",
                "ModificationTimestamp": "2025-01-01T00:00:00Z",
                "MlgCanView": true,
                "Latitude": 30.1,
                "Longitude": -97.7,
            }),
            "ABOR",
        )
        .unwrap();

        let doc = ListingDocument::from(&listing);
        assert_eq!(
            doc.geo,
            Some(GeoPoint {
                lat: 30.1,
                lng: -97.7
            })
        );
    }

    #[test]
    fn projection_omits_geo_point_without_coordinates() {
        let listing = Listing::from_upstream(
            json!({
                "ListingKey": "L1",
                "ModificationTimestamp": "2025-01-01T00:00:00Z",
                "MlgCanView": true,
            }),
            "ABOR",
        )
        .unwrap();

        let doc = ListingDocument::from(&listing);
        assert!(doc.geo.is_none());
    }
}
