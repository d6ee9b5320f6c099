use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::storage::traits::{object_url, ObjectStore};

/// S3 (or S3-compatible) bucket storage
#[derive(Debug)]
pub struct S3Store {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
        }
    }

    /// Build a store from the ambient AWS configuration.
    ///
    /// `endpoint` targets an S3-compatible provider with path-style
    /// addressing. Without `public_base_url` objects are addressed through
    /// the virtual-hosted bucket URL.
    pub async fn from_env(
        bucket: String,
        endpoint: Option<String>,
        public_base_url: Option<String>,
    ) -> Self {
        let shared = aws_config::load_from_env().await;
        let region = shared
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "us-east-1".to_string());

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            info!("Using S3-compatible endpoint {endpoint}");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        let public_base_url = public_base_url
            .unwrap_or_else(|| format!("https://{bucket}.s3.{region}.amazonaws.com"));

        Self::new(client, bucket, public_base_url)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .context("failed to put object")
            .map_err(|e| StoreError::Put {
                key: key.to_string(),
                reason: format!("{e:#}"),
            })?;

        debug!("stored object in bucket {}", self.bucket);
        Ok(object_url(&self.public_base_url, key))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("failed to delete object")
            .map_err(|e| StoreError::Delete {
                key: key.to_string(),
                reason: format!("{e:#}"),
            })?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
