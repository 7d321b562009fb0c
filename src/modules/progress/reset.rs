//! Startup reset: clears every mls-owned table, every object under the
//! environment/originating-system prefix, and the search index, concurrently. Invoked
//! only when the reset-on-start flag is set; best-effort-atomic across the three
//! systems — a partial failure is logged, never fatal to startup.

use std::sync::Arc;

use tracing::warn;

use crate::modules::object_store::{system_prefix, ObjectStore};
use crate::modules::relational::store::RelationalStore;
use crate::modules::search_indexer::SearchIndexer;

pub async fn reset_all(
    store: &Arc<dyn RelationalStore>,
    object_store: &Arc<dyn ObjectStore>,
    search: &Arc<dyn SearchIndexer>,
    storage_prefix: &str,
    originating_system: &str,
) {
    let prefix = system_prefix(storage_prefix, originating_system);
    let (db_result, objects_result, search_result) = tokio::join!(
        store.reset_all_tables(),
        purge_objects(object_store, &prefix),
        search.clear(),
    );

    if let Err(e) = db_result {
        warn!(error = %e, "reset: failed to truncate relational tables");
    }
    if let Err(e) = objects_result {
        warn!(error = %e, "reset: failed to purge object store prefix");
    }
    if let Err(e) = search_result {
        warn!(error = %e, "reset: failed to clear search index");
    }
}

async fn purge_objects(object_store: &Arc<dyn ObjectStore>, prefix: &str) -> Result<(), crate::modules::object_store::ObjectStoreError> {
    let keys = object_store.list_under(prefix).await?;
    if keys.is_empty() {
        return Ok(());
    }
    object_store.delete_many(&keys).await
}
