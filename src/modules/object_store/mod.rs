//! Object store adapter: uploads media bytes under a deterministic key namespace,
//! lists and bulk-deletes keys under a listing prefix. Generalizes the teacher's
//! single-object signed-URL adapter into one that owns the bytes directly, since this
//! core is the sole writer of listing imagery rather than handing out upload URLs to a
//! browser.

pub mod gcs;

use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object store upload failed: {0}")]
    UploadFailed(String),

    #[error("object store returned an empty body")]
    EmptyBody,

    #[error("object store list failed: {0}")]
    ListFailed(String),

    #[error("object store delete failed: {0}")]
    DeleteFailed(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, ObjectStoreError>;
    async fn list_under(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError>;
    async fn delete_many(&self, keys: &[String]) -> Result<(), ObjectStoreError>;
}

/// Builds the bit-exact key `{env}/{mls-system-lowercased}/{listing-key}/{ordinal}.{ext}`.
pub fn media_key(env: &str, originating_system: &str, listing_key: &str, ordinal: i32, ext: &str) -> String {
    format!(
        "{}/{}/{}/{}.{}",
        env,
        originating_system.to_lowercase(),
        listing_key,
        ordinal,
        ext
    )
}

/// Builds the `{cdn-base}/{key}` stable URL.
pub fn cdn_url(cdn_base: &str, key: &str) -> String {
    format!("{}/{}", cdn_base.trim_end_matches('/'), key)
}

/// Chooses the file extension from a response content-type: png/gif/webp get their own
/// extension, everything else (including a missing/unknown content-type) falls back to jpg.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let ct = content_type.to_lowercase();
    if ct.contains("png") {
        "png"
    } else if ct.contains("gif") {
        "gif"
    } else if ct.contains("webp") {
        "webp"
    } else {
        "jpg"
    }
}

/// Batches keys into chunks of at most 1000 for bulk deletion.
pub fn batch_keys(keys: &[String]) -> Vec<&[String]> {
    keys.chunks(1000).collect()
}

pub fn listing_prefix(env: &str, originating_system: &str, listing_key: &str) -> String {
    format!("{}/{}/{}/", env, originating_system.to_lowercase(), listing_key)
}

/// The `{env}/{mls-system-lowercased}/` prefix covering every listing's objects for one
/// originating system — used by the startup reset to purge everything this instance
/// owns without touching another originating system's objects under the same bucket.
pub fn system_prefix(env: &str, originating_system: &str) -> String {
    format!("{}/{}/", env, originating_system.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_key_is_bit_exact() {
        assert_eq!(
            media_key("production", "ABOR", "L123", 0, "jpg"),
            "production/abor/L123/0.jpg"
        );
    }

    #[test]
    fn cdn_url_joins_base_and_key() {
        assert_eq!(
            cdn_url("https://cdn.example.com/", "production/abor/L123/0.jpg"),
            "https://cdn.example.com/production/abor/L123/0.jpg"
        );
    }

    #[test]
    fn extension_prefers_declared_image_types() {
        assert_eq!(extension_for_content_type("image/png"), "png");
        assert_eq!(extension_for_content_type("image/gif"), "gif");
        assert_eq!(extension_for_content_type("image/webp"), "webp");
        assert_eq!(extension_for_content_type("image/jpeg"), "jpg");
        assert_eq!(extension_for_content_type(""), "jpg");
    }

    #[test]
    fn batch_keys_splits_into_chunks_of_1000() {
        let keys: Vec<String> = (0..2500).map(|i| i.to_string()).collect();
        let batches = batch_keys(&keys);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 1000);
        assert_eq!(batches[2].len(), 500);
    }

    #[test]
    fn listing_prefix_lowercases_originating_system() {
        assert_eq!(listing_prefix("production", "ABOR", "L123"), "production/abor/L123/");
    }

    #[test]
    fn system_prefix_covers_every_listing_under_one_originating_system() {
        assert_eq!(system_prefix("production", "ABOR"), "production/abor/");
        assert!(listing_prefix("production", "ABOR", "L123").starts_with(&system_prefix("production", "ABOR")));
    }
}
