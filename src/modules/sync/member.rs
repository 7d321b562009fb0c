//! `Member` (agent) resource driver: an independent dimension, upserted on its own
//! delta cycle and referenced from listings by key only (no foreign key enforced).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::modules::relational::domain::Member;
use crate::modules::relational::store::{RelationalStore, SyncResource};

use super::paging::SyncDriver;

pub struct MemberSyncDriver {
    store: Arc<dyn RelationalStore>,
    originating_system: String,
    batch_size: u64,
    max_records: Option<u64>,
}

impl MemberSyncDriver {
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
impl SyncDriver for MemberSyncDriver {
    fn resource(&self) -> SyncResource {
        SyncResource::Member
    }

    fn resource_path(&self) -> &'static str {
        "/Member"
    }

    fn batch_size(&self) -> u64 {
        self.batch_size
    }

    fn max_records(&self) -> Option<u64> {
        self.max_records
    }

    async fn process_record(&self, raw: &Value) -> Option<DateTime<Utc>> {
        let member = Member::from_upstream(raw.clone(), &self.originating_system)?;
        let ts = member.modification_timestamp;

        if let Err(e) = self.store.upsert_member(&member).await {
            warn!(error = %e, member_key = %member.member_key, "failed to upsert member");
            return None;
        }

        Some(ts)
    }
}
