//! `Office` resource driver: an independent dimension, upserted on its own delta
//! cycle, referenced from `members` by key only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::modules::relational::domain::Office;
use crate::modules::relational::store::{RelationalStore, SyncResource};

use super::paging::SyncDriver;

pub struct OfficeSyncDriver {
    store: Arc<dyn RelationalStore>,
    originating_system: String,
    batch_size: u64,
    max_records: Option<u64>,
}

impl OfficeSyncDriver {
    pub fn new(
        store: Arc<dyn RelationalStore>,
        originating_system: String,
        batch_size: u64,
        max_records: Option<u64>,
    ) -> Self {
        Self {
            store,
            originating_system,
            batch_size,
            max_records,
        }
    }
}

#[async_trait]
impl SyncDriver for OfficeSyncDriver {
    fn resource(&self) -> SyncResource {
        SyncResource::Office
    }

    fn resource_path(&self) -> &'static str {
        "/Office"
    }

    fn batch_size(&self) -> u64 {
        self.batch_size
    }

    fn max_records(&self) -> Option<u64> {
        self.max_records
    }

    async fn process_record(&self, raw: &Value) -> Option<DateTime<Utc>> {
        let office = Office::from_upstream(raw.clone(), &self.originating_system)?;
        let ts = office.modification_timestamp;

        if let Err(e) = self.store.upsert_office(&office).await {
            warn!(error = %e, office_key = %office.office_key, "failed to upsert office");
            return None;
        }

        Some(ts)
    }
}
