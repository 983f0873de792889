//! Object storage for uploaded resumes and profile pictures.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 upload failed: {0}")]
    Upload(String),
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;
}

pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

/// Keeps uploads in memory.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryFileStore {
    objects: tokio::sync::Mutex<std::collections::HashMap<String, (Bytes, String)>>,
}

#[cfg(test)]
impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.lock().await.get(key).cloned()
    }
}

#[cfg(test)]
#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .await
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }
}

/// Object key for a user's upload, e.g. `resumes/<user>/<random>.pdf`.
pub fn object_key(prefix: &str, user_id: Uuid, extension: &str) -> String {
    format!("{prefix}/{user_id}/{}.{extension}", Uuid::new_v4())
}
