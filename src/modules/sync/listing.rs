//! `Listing` resource driver: upserts the listing row, its media/rooms/unit_types
//! child collections, and the search-index projection. Media bytes are not fetched
//! here — writing a `media` row with `local_url = NULL` is the entire "enqueue" step;
//! the media worker independently scans for rows in that state (spec.md §5: no
//! synchronous handoff between the sync cycle and the media worker).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::modules::relational::domain::Listing;
use crate::modules::relational::store::{RelationalStore, SyncResource};
use crate::modules::search_indexer::SearchIndexer;

use super::paging::SyncDriver;

pub struct ListingSyncDriver {
    store: Arc<dyn RelationalStore>,
    search: Arc<dyn SearchIndexer>,
    originating_system: String,
    batch_size: u64,
    max_records: Option<u64>,
}

impl ListingSyncDriver {
    pub fn new(
        store: Arc<dyn RelationalStore>,
        search: Arc<dyn SearchIndexer>,
        originating_system: String,
        batch_size: u64,
        max_records: Option<u64>,
    ) -> Self {
        Self {
            store,
            search,
            originating_system,
            batch_size,
            max_records,
        }
    }
}

#[async_trait]
impl SyncDriver for ListingSyncDriver {
    fn resource(&self) -> SyncResource {
        SyncResource::Property
    }

    fn resource_path(&self) -> &'static str {
        "/Property"
    }

    fn visibility_filter(&self) -> Option<bool> {
        Some(true)
    }

    fn expand(&self) -> &'static [&'static str] {
        &["Media", "Rooms", "UnitTypes"]
    }

    fn batch_size(&self) -> u64 {
        self.batch_size
    }

    fn max_records(&self) -> Option<u64> {
        self.max_records
    }

    async fn process_record(&self, raw: &Value) -> Option<DateTime<Utc>> {
        let listing = Listing::from_upstream(raw.clone(), &self.originating_system)?;
        let ts = listing.modification_timestamp;

        if let Err(e) = self.store.upsert_listing(&listing).await {
            warn!(error = %e, listing_key = %listing.listing_key, "failed to upsert listing, skipping record");
            return None;
        }

        if let Err(e) = self
            .store
            .upsert_media_metadata(&listing.listing_key, &listing.media)
            .await
        {
            warn!(error = %e, listing_key = %listing.listing_key, "failed to upsert media metadata");
        }

        if let Err(e) = self.store.replace_rooms(&listing.listing_key, &listing.rooms).await {
            warn!(error = %e, listing_key = %listing.listing_key, "failed to replace rooms");
        }

        if let Err(e) = self
            .store
            .replace_unit_types(&listing.listing_key, &listing.unit_types)
            .await
        {
            warn!(error = %e, listing_key = %listing.listing_key, "failed to replace unit types");
        }

        if let Err(e) = self.search.upsert(&listing).await {
            warn!(error = %e, listing_key = %listing.listing_key, "search index upsert failed, DB state stands");
        }

        Some(ts)
    }
}
