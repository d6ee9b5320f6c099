use async_trait::async_trait;

use crate::error::StoreError;

/// Common trait for object storage backends
/// Keys are derived from entity IDs by the caller
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` and return the public URL
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Get the name of the storage backend
    fn backend_name(&self) -> &'static str;
}

/// Join a public base URL and an object key
pub fn object_url(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Upload batches get their own prefix so a new upload never writes over
/// objects an existing record still points at
pub fn property_image_key(
    property_id: &str,
    batch: &str,
    index: usize,
    extension: &str,
) -> String {
    if index == 0 {
        format!("properties/{property_id}/{batch}/thumbnail.{extension}")
    } else {
        format!("properties/{property_id}/{batch}/image-{index}.{extension}")
    }
}

pub fn avatar_key(user_id: &str, batch: &str, extension: &str) -> String {
    format!("avatars/{user_id}/{batch}.{extension}")
}

/// Fresh prefix for one upload attempt
pub fn upload_batch() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
