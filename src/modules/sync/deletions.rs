//! Deletions driver: mirrors the visibility-false half of the `Property` feed. A
//! tombstone triggers full cascade removal across all three systems of record.
//!
//! Short-circuits below a small local-listing-count threshold, treating that state as
//! fresh-start/reset rather than a legitimate tombstone wave (spec.md §4.6, §9 — the
//! exact threshold is an unprincipled heuristic carried over as specified).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::modules::object_store::{listing_prefix, ObjectStore};
use crate::modules::relational::store::{RelationalStore, SyncResource};
use crate::modules::search_indexer::SearchIndexer;

use super::paging::SyncDriver;

const FRESH_START_THRESHOLD: i64 = 500;

pub struct DeletionsSyncDriver {
    store: Arc<dyn RelationalStore>,
    search: Arc<dyn SearchIndexer>,
    object_store: Arc<dyn ObjectStore>,
    originating_system: String,
    storage_env: String,
    batch_size: u64,
    max_records: Option<u64>,
}

impl DeletionsSyncDriver {
    pub fn new(
        store: Arc<dyn RelationalStore>,
        search: Arc<dyn SearchIndexer>,
        object_store: Arc<dyn ObjectStore>,
        originating_system: String,
        storage_env: String,
        batch_size: u64,
        max_records: Option<u64>,
    ) -> Self {
        Self {
            store,
            search,
            object_store,
            originating_system,
            storage_env,
            batch_size,
            max_records,
        }
    }
}

#[async_trait]
impl SyncDriver for DeletionsSyncDriver {
    fn resource(&self) -> SyncResource {
        SyncResource::PropertyDeletions
    }

    fn resource_path(&self) -> &'static str {
        "/Property"
    }

    fn visibility_filter(&self) -> Option<bool> {
        Some(false)
    }

    fn select(&self) -> &'static [&'static str] {
        &["ListingKey", "ModificationTimestamp"]
    }

    fn batch_size(&self) -> u64 {
        self.batch_size
    }

    fn max_records(&self) -> Option<u64> {
        self.max_records
    }

    async fn should_skip(&self) -> bool {
        match self.store.local_listing_count().await {
            Ok(count) => count < FRESH_START_THRESHOLD,
            Err(e) => {
                warn!(error = %e, "could not read local listing count, proceeding with deletions cycle");
                false
            }
        }
    }

    async fn process_record(&self, raw: &Value) -> Option<DateTime<Utc>> {
        let listing_key = raw.get("ListingKey")?.as_str()?.to_string();
        let ts = raw
            .get("ModificationTimestamp")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))?;

        let prefix = listing_prefix(&self.storage_env, &self.originating_system, &listing_key);
        match self.object_store.list_under(&prefix).await {
            Ok(keys) if !keys.is_empty() => {
                if let Err(e) = self.object_store.delete_many(&keys).await {
                    warn!(error = %e, listing_key = %listing_key, "failed to purge object-store prefix for deleted listing");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, listing_key = %listing_key, "failed to list object-store prefix for deleted listing"),
        }

        if let Err(e) = self.search.delete(&listing_key).await {
            warn!(error = %e, listing_key = %listing_key, "search index delete failed, DB delete still proceeds");
        }

        if let Err(e) = self.store.delete_listing(&listing_key).await {
            warn!(error = %e, listing_key = %listing_key, "failed to delete listing row");
            return None;
        }

        Some(ts)
    }
}
