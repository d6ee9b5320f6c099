#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use estate_hub::error::{RecordsError, StoreError};
use estate_hub::models::{
    ListingType, Location, NewProperty, Property, PropertyPatch, PropertyType,
};
use estate_hub::records::{MemoryRecords, PropertyRepository};
use estate_hub::storage::{MemoryStore, ObjectStore};
use estate_hub::upload::UploadFile;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub fn png_file(name: &str) -> UploadFile {
    UploadFile::new(name, "image/png", png(32, 24))
}

pub fn new_property(title: &str) -> NewProperty {
    NewProperty {
        title: title.to_string(),
        property_type: PropertyType::House,
        listing_type: ListingType::Sale,
        price: 7_200_000,
        location: Location {
            city: "Bengaluru".to_string(),
            district: Some("Indiranagar".to_string()),
            address: Some("4th Cross".to_string()),
            latitude: None,
            longitude: None,
        },
        bedrooms: 3,
        bathrooms: 2,
        description: "Corner plot with garden".to_string(),
        agent_id: None,
        agent_name: None,
        agent_phone: None,
    }
}

/// Wraps [`MemoryRecords`] and records every property patch
pub struct RecordingRecords {
    pub inner: Arc<MemoryRecords>,
    pub patches: Mutex<Vec<PropertyPatch>>,
    pub fail_patches: bool,
}

impl RecordingRecords {
    pub fn new(inner: Arc<MemoryRecords>, fail_patches: bool) -> Self {
        Self {
            inner,
            patches: Mutex::new(Vec::new()),
            fail_patches,
        }
    }

    pub fn patches(&self) -> Vec<PropertyPatch> {
        self.patches.lock().unwrap().clone()
    }
}

#[async_trait]
impl PropertyRepository for RecordingRecords {
    async fn create_property(&self, input: NewProperty) -> Result<Property, RecordsError> {
        self.inner.create_property(input).await
    }

    async fn get_property(&self, id: &str) -> Result<Property, RecordsError> {
        self.inner.get_property(id).await
    }

    async fn patch_property(&self, id: &str, patch: PropertyPatch) -> Result<Property, RecordsError> {
        self.patches.lock().unwrap().push(patch.clone());
        if self.fail_patches {
            return Err(RecordsError::Backend("records API unavailable".to_string()));
        }
        self.inner.patch_property(id, patch).await
    }

    async fn soft_delete_property(&self, id: &str) -> Result<Property, RecordsError> {
        self.inner.soft_delete_property(id).await
    }

    async fn list_properties(&self) -> Result<Vec<Property>, RecordsError> {
        self.inner.list_properties().await
    }

    async fn record_view(&self, id: &str) -> Result<Property, RecordsError> {
        self.inner.record_view(id).await
    }
}

/// Object store that starts failing after a number of successful puts
pub struct FlakyStore {
    pub inner: Arc<MemoryStore>,
    pub succeed_first: usize,
    pub puts: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>, succeed_first: usize) -> Self {
        Self {
            inner,
            succeed_first,
            puts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        let attempt = self.puts.fetch_add(1, Ordering::SeqCst);
        if attempt >= self.succeed_first {
            return Err(StoreError::Put {
                key: key.to_string(),
                reason: "bucket unreachable".to_string(),
            });
        }
        self.inner.put(key, bytes, content_type).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}
