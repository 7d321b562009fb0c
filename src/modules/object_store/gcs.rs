use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{batch_keys, ObjectStore, ObjectStoreError};

fn bucket_resource(bucket: &str) -> String {
    format!("projects/_/buckets/{}", bucket)
}

/// Internal seam so the adapter is testable without standing up a real GCS client.
#[async_trait]
trait GcsObjectClient: Send + Sync {
    async fn write(&self, bucket_resource: &str, object_name: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), String>;
    async fn list(&self, bucket_resource: &str, prefix: &str) -> Result<Vec<String>, String>;
    async fn delete(&self, bucket_resource: &str, object_name: &str) -> Result<(), String>;
}

#[cfg(test)]
struct ArcGcsObjectClient(Arc<dyn GcsObjectClient>);

#[cfg(test)]
#[async_trait]
impl GcsObjectClient for ArcGcsObjectClient {
    async fn write(&self, bucket_resource: &str, object_name: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), String> {
        self.0.write(bucket_resource, object_name, bytes, content_type).await
    }
    async fn list(&self, bucket_resource: &str, prefix: &str) -> Result<Vec<String>, String> {
        self.0.list(bucket_resource, prefix).await
    }
    async fn delete(&self, bucket_resource: &str, object_name: &str) -> Result<(), String> {
        self.0.delete(bucket_resource, object_name).await
    }
}

/// Uploads media bytes under a deterministic key namespace, public-read, with a
/// long cache-control lifetime (one year); lists and bulk-deletes keys under a
/// listing's prefix. Retry is explicitly not owned here (spec.md §4.3) — the media
/// worker decides whether to retry a failed upload.
pub struct GcsObjectStore {
    client: Arc<OnceCell<Box<dyn GcsObjectClient>>>,
    bucket: String,
}

impl GcsObjectStore {
    pub fn new(bucket: String) -> Self {
        Self {
            client: Arc::new(OnceCell::new()),
            bucket,
        }
    }

    #[cfg(test)]
    fn with_client(bucket: String, client: Arc<dyn GcsObjectClient>) -> Self {
        let once = OnceCell::new();
        let _ = once.set(Box::new(ArcGcsObjectClient(client)) as Box<dyn GcsObjectClient>);
        Self {
            client: Arc::new(once),
            bucket,
        }
    }

    async fn get_client(&self) -> Result<&dyn GcsObjectClient, ObjectStoreError> {
        self.client
            .get_or_try_init(|| async {
                let real = RealGcsObjectClient::new()
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Box::new(real) as Box<dyn GcsObjectClient>)
            })
            .await
            .map(|boxed| &**boxed)
            .map_err(ObjectStoreError::UploadFailed)
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, ObjectStoreError> {
        if bytes.is_empty() {
            return Err(ObjectStoreError::EmptyBody);
        }

        let client = self.get_client().await?;
        let bucket = bucket_resource(&self.bucket);

        client
            .write(&bucket, key, bytes, content_type)
            .await
            .map_err(ObjectStoreError::UploadFailed)?;

        Ok(key.to_string())
    }

    async fn list_under(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let client = self.get_client().await?;
        let bucket = bucket_resource(&self.bucket);
        client.list(&bucket, prefix).await.map_err(ObjectStoreError::ListFailed)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<(), ObjectStoreError> {
        let client = self.get_client().await?;
        let bucket = bucket_resource(&self.bucket);

        for chunk in batch_keys(keys) {
            for key in chunk {
                client
                    .delete(&bucket, key)
                    .await
                    .map_err(ObjectStoreError::DeleteFailed)?;
            }
        }

        Ok(())
    }
}

struct RealGcsObjectClient {
    storage: google_cloud_storage::client::Storage,
}

impl RealGcsObjectClient {
    async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let storage = google_cloud_storage::client::Storage::builder().build().await?;
        Ok(Self { storage })
    }
}

#[async_trait]
impl GcsObjectClient for RealGcsObjectClient {
    async fn write(&self, bucket_resource: &str, object_name: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), String> {
        self.storage
            .write_object(bucket_resource.to_string(), object_name.to_string(), bytes)
            .set_content_type(content_type.to_string())
            .set_predefined_acl("publicRead".to_string())
            .set_cache_control("public, max-age=31536000".to_string())
            .send_unbuffered()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn list(&self, bucket_resource: &str, prefix: &str) -> Result<Vec<String>, String> {
        let mut stream = self
            .storage
            .list_objects(bucket_resource.to_string())
            .set_prefix(prefix.to_string())
            .by_item();

        let mut keys = Vec::new();
        while let Some(item) = stream.next().await {
            let item = item.map_err(|e| e.to_string())?;
            keys.push(item.name);
        }

        Ok(keys)
    }

    async fn delete(&self, bucket_resource: &str, object_name: &str) -> Result<(), String> {
        self.storage
            .delete_object(bucket_resource.to_string(), object_name.to_string())
            .send()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGcsObjectClient {
        written: Mutex<Vec<(String, String, usize, String)>>,
        listed: Mutex<Vec<(String, String)>>,
        deleted: Mutex<Vec<(String, String)>>,
        list_result: Mutex<Result<Vec<String>, String>>,
        write_result: Mutex<Result<(), String>>,
    }

    impl FakeGcsObjectClient {
        fn new() -> Self {
            Self {
                list_result: Mutex::new(Ok(Vec::new())),
                write_result: Mutex::new(Ok(())),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl GcsObjectClient for FakeGcsObjectClient {
        async fn write(&self, bucket_resource: &str, object_name: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), String> {
            self.written.lock().unwrap().push((
                bucket_resource.to_string(),
                object_name.to_string(),
                bytes.len(),
                content_type.to_string(),
            ));
            self.write_result.lock().unwrap().clone()
        }

        async fn list(&self, bucket_resource: &str, prefix: &str) -> Result<Vec<String>, String> {
            self.listed
                .lock()
                .unwrap()
                .push((bucket_resource.to_string(), prefix.to_string()));
            self.list_result.lock().unwrap().clone()
        }

        async fn delete(&self, bucket_resource: &str, object_name: &str) -> Result<(), String> {
            self.deleted
                .lock()
                .unwrap()
                .push((bucket_resource.to_string(), object_name.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn put_rejects_empty_body() {
        let fake = Arc::new(FakeGcsObjectClient::new());
        let store = GcsObjectStore::with_client("bucket".into(), fake);
        let err = store.put("k", Vec::new(), "image/jpeg").await.unwrap_err();
        assert!(matches!(err, ObjectStoreError::EmptyBody));
    }

    #[tokio::test]
    async fn put_writes_bytes_with_bucket_resource_format() {
        let fake = Arc::new(FakeGcsObjectClient::new());
        let store = GcsObjectStore::with_client("listings-bucket".into(), fake.clone());
        let key = store.put("production/abor/L1/0.jpg", vec![1, 2, 3], "image/jpeg").await.unwrap();
        assert_eq!(key, "production/abor/L1/0.jpg");

        let calls = fake.written.lock().unwrap();
        assert_eq!(calls[0].0, "projects/_/buckets/listings-bucket");
        assert_eq!(calls[0].1, "production/abor/L1/0.jpg");
        assert_eq!(calls[0].2, 3);
    }

    #[tokio::test]
    async fn delete_many_batches_into_chunks_of_1000() {
        let fake = Arc::new(FakeGcsObjectClient::new());
        let store = GcsObjectStore::with_client("b".into(), fake.clone());

        let keys: Vec<String> = (0..1500).map(|i| format!("k{i}")).collect();
        store.delete_many(&keys).await.unwrap();

        assert_eq!(fake.deleted.lock().unwrap().len(), 1500);
    }

    #[tokio::test]
    async fn list_under_returns_keys_from_client() {
        let fake = Arc::new(FakeGcsObjectClient::new());
        *fake.list_result.lock().unwrap() = Ok(vec!["a".to_string(), "b".to_string()]);
        let store = GcsObjectStore::with_client("b".into(), fake);

        let keys = store.list_under("production/abor/L1/").await.unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
