//! `meilisearch-sdk`-backed `SearchIndexer`. Mirrors the teacher's `GcsStorageQuery`
//! seam pattern one level up: the real SDK client is held directly (it is already a
//! thin, cheaply-cloned HTTP handle, so there is no analogous fake-vs-real seam to
//! carve out the way the object store needed one for its upload path).

use async_trait::async_trait;
use meilisearch_sdk::client::Client;
use meilisearch_sdk::settings::Settings;

use crate::modules::relational::domain::Listing;

use super::{
    ListingDocument, SearchIndexError, SearchIndexer, FILTERABLE_ATTRIBUTES,
    SEARCHABLE_ATTRIBUTES, SORTABLE_ATTRIBUTES,
};

pub struct MeiliSearchIndexer {
    client: Client,
    index_name: String,
}

impl MeiliSearchIndexer {
    pub fn new(endpoint: &str, master_key: &str, index_name: &str) -> Result<Self, SearchIndexError> {
        let client = Client::new(endpoint, Some(master_key))
            .map_err(|e| SearchIndexError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            index_name: index_name.to_string(),
        })
    }
}

#[async_trait]
impl SearchIndexer for MeiliSearchIndexer {
    async fn ensure_configured(&self) -> Result<(), SearchIndexError> {
        if self.client.get_index(&self.index_name).await.is_err() {
            self.client
                .create_index(&self.index_name, Some("listing_key"))
                .await
                .map_err(|e| SearchIndexError::Configuration(e.to_string()))?;
        }

        let index = self.client.index(&self.index_name);

        index
            .set_searchable_attributes(SEARCHABLE_ATTRIBUTES)
            .await
            .map_err(|e| SearchIndexError::Configuration(e.to_string()))?;

        let current_filterable = index
            .get_filterable_attributes()
            .await
            .map_err(|e| SearchIndexError::Configuration(e.to_string()))?;

        if current_filterable.is_empty() {
            let settings = Settings::new()
                .with_filterable_attributes(FILTERABLE_ATTRIBUTES)
                .with_sortable_attributes(SORTABLE_ATTRIBUTES);

            index
                .set_settings(&settings)
                .await
                .map_err(|e| SearchIndexError::Configuration(e.to_string()))?;
        }

        Ok(())
    }

    async fn upsert(&self, listing: &Listing) -> Result<(), SearchIndexError> {
        let doc = ListingDocument::from(listing);
        let index = self.client.index(&self.index_name);
        index
            .add_documents(&[doc], Some("listing_key"))
            .await
            .map_err(|e| SearchIndexError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, listing_key: &str) -> Result<(), SearchIndexError> {
        let index = self.client.index(&self.index_name);
        index
            .delete_document(listing_key)
            .await
            .map_err(|e| SearchIndexError::DeleteFailed(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SearchIndexError> {
        let index = self.client.index(&self.index_name);
        index
            .delete_all_documents()
            .await
            .map_err(|e| SearchIndexError::DeleteFailed(e.to_string()))?;
        Ok(())
    }
}
