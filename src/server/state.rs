use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::events::PropertyEvents;
use crate::records::{HttpRecords, MemoryRecords, PropertyRepository, UserRepository};
use crate::storage::{MemoryStore, ObjectStore, S3Store};
use crate::upload::ImageUploader;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub properties: Arc<dyn PropertyRepository>,
    pub users: Arc<dyn UserRepository>,
    pub uploader: Arc<ImageUploader>,
    pub events: PropertyEvents,
}

impl AppState {
    /// Wire repositories, storage and the uploader together
    pub fn new(
        config: AppConfig,
        properties: Arc<dyn PropertyRepository>,
        users: Arc<dyn UserRepository>,
        store: Arc<dyn ObjectStore>,
        events: PropertyEvents,
    ) -> Self {
        let uploader = ImageUploader::new(store, properties.clone(), users.clone(), events.clone())
            .with_options(config.convert_options())
            .with_max_upload_bytes(config.max_upload_bytes);

        Self {
            config: Arc::new(config),
            properties,
            users,
            uploader: Arc::new(uploader),
            events,
        }
    }

    /// State backed entirely by in-process memory
    pub fn in_memory(config: AppConfig) -> Self {
        let records = Arc::new(MemoryRecords::new());
        let store = Arc::new(MemoryStore::default());
        Self::new(
            config,
            records.clone(),
            records,
            store,
            PropertyEvents::default(),
        )
    }

    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = match config.storage {
            StorageBackend::Memory => {
                info!("Storing images in memory");
                Arc::new(MemoryStore::new(
                    config
                        .public_base_url
                        .clone()
                        .unwrap_or_else(|| "memory://objects".to_string()),
                ))
            }
            StorageBackend::S3 => {
                info!("Storing images in bucket {}", config.bucket);
                Arc::new(
                    S3Store::from_env(
                        config.bucket.clone(),
                        config.s3_endpoint.clone(),
                        config.public_base_url.clone(),
                    )
                    .await,
                )
            }
        };

        let (properties, users): (Arc<dyn PropertyRepository>, Arc<dyn UserRepository>) =
            match &config.records_url {
                Some(url) => {
                    info!("Using records API at {url}");
                    let records = Arc::new(HttpRecords::new(url.clone())?);
                    let properties: Arc<dyn PropertyRepository> = records.clone();
                    let users: Arc<dyn UserRepository> = records;
                    (properties, users)
                }
                None => {
                    let records = Arc::new(MemoryRecords::new());
                    let properties: Arc<dyn PropertyRepository> = records.clone();
                    let users: Arc<dyn UserRepository> = records;
                    (properties, users)
                }
            };

        Ok(Self::new(
            config,
            properties,
            users,
            store,
            PropertyEvents::default(),
        ))
    }
}
