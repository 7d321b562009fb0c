//! `OpenHouse` resource driver: append-only per listing, dropped via cascade when the
//! parent listing is absent. Deduplication on `(listing_key, start, end)` is enforced
//! by the `mls_open_houses` unique constraint, not by application code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::modules::relational::domain::OpenHouse;
use crate::modules::relational::store::{RelationalStore, SyncResource};

use super::paging::SyncDriver;

pub struct OpenHouseSyncDriver {
    store: Arc<dyn RelationalStore>,
    batch_size: u64,
    max_records: Option<u64>,
}

impl OpenHouseSyncDriver {
    pub fn new(store: Arc<dyn RelationalStore>, batch_size: u64, max_records: Option<u64>) -> Self {
        Self {
            store,
            batch_size,
            max_records,
        }
    }
}

#[async_trait]
impl SyncDriver for OpenHouseSyncDriver {
    fn resource(&self) -> SyncResource {
        SyncResource::OpenHouse
    }

    fn resource_path(&self) -> &'static str {
        "/OpenHouse"
    }

    fn batch_size(&self) -> u64 {
        self.batch_size
    }

    fn max_records(&self) -> Option<u64> {
        self.max_records
    }

    async fn process_record(&self, raw: &Value) -> Option<DateTime<Utc>> {
        let open_house = OpenHouse::from_upstream(raw)?;
        let ts = open_house.modification_timestamp;

        if let Err(e) = self.store.upsert_open_house(&open_house).await {
            warn!(error = %e, open_house_key = %open_house.open_house_key, "failed to upsert open house");
            return None;
        }

        Some(ts)
    }
}
