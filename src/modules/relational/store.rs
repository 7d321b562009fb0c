//! `RelationalStore` port: the single seam every sync driver and the media worker use
//! to reach Postgres. One `thiserror` enum, matching the teacher's one-enum-per-adapter
//! convention (`StorageQueryError`, `ProjectTopicRepositoryError`, ...).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{Listing, Member, Office, OpenHouse};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RelationalStoreError {
    #[error("relational store error: {0}")]
    Database(String),

    #[error("listing {0} not found")]
    ListingNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncResource {
    Property,
    PropertyDeletions,
    Member,
    Office,
    OpenHouse,
}

impl SyncResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Property => "Property",
            Self::PropertyDeletions => "PropertyDeletions",
            Self::Member => "Member",
            Self::Office => "Office",
            Self::OpenHouse => "OpenHouse",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressCounts {
    pub total_listings: i64,
    pub active_listings: i64,
    pub total_media: i64,
    pub hydrated_media: i64,
    pub missing_media: i64,
    pub listings_with_missing_media: i64,
}

#[derive(Debug, Clone)]
pub struct ProblematicListingState {
    pub consecutive_fails: i32,
    pub cooldown_until: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait RelationalStore: Send + Sync {
    // --- Listing lifecycle -------------------------------------------------
    async fn upsert_listing(&self, listing: &Listing) -> Result<(), RelationalStoreError>;
    async fn upsert_media_metadata(&self, listing_key: &str, assets: &[super::domain::MediaAsset]) -> Result<(), RelationalStoreError>;
    async fn replace_rooms(&self, listing_key: &str, rooms: &[super::domain::Room]) -> Result<(), RelationalStoreError>;
    async fn replace_unit_types(&self, listing_key: &str, unit_types: &[super::domain::UnitType]) -> Result<(), RelationalStoreError>;
    async fn upsert_open_house(&self, open_house: &OpenHouse) -> Result<(), RelationalStoreError>;
    async fn delete_listing(&self, listing_key: &str) -> Result<(), RelationalStoreError>;

    // --- Dimensions ----------------------------------------------------------
    async fn upsert_member(&self, member: &Member) -> Result<(), RelationalStoreError>;
    async fn upsert_office(&self, office: &Office) -> Result<(), RelationalStoreError>;

    // --- Media worker ----------------------------------------------------------
    async fn mark_media_downloaded(&self, asset_key: &str, local_url: &str) -> Result<(), RelationalStoreError>;
    async fn update_media_url(&self, asset_key: &str, url: &str, modified: DateTime<Utc>) -> Result<(), RelationalStoreError>;
    async fn delete_media_not_in(&self, listing_key: &str, keep_asset_keys: &[String]) -> Result<Vec<String>, RelationalStoreError>;
    async fn media_keys_missing_local_url(&self, listing_key: &str) -> Result<Vec<String>, RelationalStoreError>;
    async fn count_missing_media(&self) -> Result<i64, RelationalStoreError>;
    async fn pick_listing_with_missing_media(&self, exclude: &[String], limit: usize) -> Result<Vec<String>, RelationalStoreError>;
    async fn local_listing_count(&self) -> Result<i64, RelationalStoreError>;

    // --- Sync state ----------------------------------------------------------
    async fn get_high_water_mark(&self, resource: SyncResource, originating_system: &str) -> Result<Option<DateTime<Utc>>, RelationalStoreError>;
    async fn set_high_water_mark(&self, resource: SyncResource, originating_system: &str, hwm: DateTime<Utc>) -> Result<(), RelationalStoreError>;

    // --- Settings ----------------------------------------------------------
    async fn get_setting(&self, key: &str) -> Result<Option<String>, RelationalStoreError>;

    // --- Quarantine / rate-limit diagnostics ------------------------------
    async fn get_problematic_listing(&self, listing_key: &str) -> Result<Option<ProblematicListingState>, RelationalStoreError>;
    async fn record_problematic_listing(&self, listing_key: &str, consecutive_fails: i32, cooldown_until: Option<DateTime<Utc>>, reason: &str) -> Result<(), RelationalStoreError>;
    async fn clear_problematic_listing(&self, listing_key: &str) -> Result<(), RelationalStoreError>;
    async fn record_rate_limit_event(&self, endpoint: &str, retry_after_seconds: Option<i32>) -> Result<(), RelationalStoreError>;

    // --- Progress ----------------------------------------------------------
    async fn progress_counts(&self) -> Result<ProgressCounts, RelationalStoreError>;
    async fn insert_progress_sample(
        &self,
        counts: ProgressCounts,
        downloads_completed: i64,
        api_rate_limited: bool,
        media_rate_limited: bool,
    ) -> Result<(), RelationalStoreError>;
    async fn prune_progress_history(&self, older_than: DateTime<Utc>) -> Result<(), RelationalStoreError>;

    // --- Reset ----------------------------------------------------------
    async fn reset_all_tables(&self) -> Result<(), RelationalStoreError>;
}
