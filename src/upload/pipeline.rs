use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{RecordsError, UploadError};
use crate::events::{PropertyEvent, PropertyEvents};
use crate::models::{Avatar, NewProperty, Property, PropertyPatch, User};
use crate::records::{PropertyRepository, UserRepository};
use crate::storage::{avatar_key, property_image_key, upload_batch, ObjectStore};
use crate::upload::convert::convert_in_background;
use crate::upload::prepare::{validate_file, PreparedUpload};
use crate::upload::types::{ConvertOptions, FitMode, UploadFile, MAX_UPLOAD_BYTES};

const AVATAR_SIZE: u32 = 256;

/// Result of creating a property together with its images.
///
/// The property exists even when `image_error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedProperty {
    pub property: Property,
    pub image_error: Option<String>,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone)]
struct StoredImage {
    key: String,
    url: String,
}

/// Converts, stores and attaches listing and avatar images
pub struct ImageUploader {
    store: Arc<dyn ObjectStore>,
    properties: Arc<dyn PropertyRepository>,
    users: Arc<dyn UserRepository>,
    events: PropertyEvents,
    options: ConvertOptions,
    max_upload_bytes: usize,
}

impl ImageUploader {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        properties: Arc<dyn PropertyRepository>,
        users: Arc<dyn UserRepository>,
        events: PropertyEvents,
    ) -> Self {
        Self {
            store,
            properties,
            users,
            events,
            options: ConvertOptions::default(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Create the property first, then try to attach its images.
    ///
    /// The storage keys need the property ID, so creation always comes
    /// first. Image failures are reported in `image_error` and the
    /// property stays in place without images.
    #[instrument(skip_all, fields(title = %input.title))]
    pub async fn create_property_with_images(
        &self,
        input: NewProperty,
        upload: Option<PreparedUpload>,
    ) -> Result<CreatedProperty, UploadError> {
        let property = self.properties.create_property(input).await?;
        self.events.publish(PropertyEvent::Added(property.id.clone()));

        let Some(upload) = upload else {
            return Ok(CreatedProperty {
                property,
                image_error: None,
                notices: Vec::new(),
            });
        };

        let notices = upload.notices.iter().map(ToString::to_string).collect();
        match self.upload_property_images(&property.id, upload).await {
            Ok(updated) => Ok(CreatedProperty {
                property: updated,
                image_error: None,
                notices,
            }),
            Err(err) => {
                warn!(property_id = %property.id, "property created without images: {err}");
                Ok(CreatedProperty {
                    property,
                    image_error: Some(err.to_string()),
                    notices,
                })
            }
        }
    }

    /// Store every prepared image and patch the property once.
    ///
    /// Nothing is patched unless every image was stored. Objects stored
    /// before a failure are removed again. Only listed properties take
    /// new images.
    #[instrument(skip(self, upload), fields(files = upload.file_count()))]
    pub async fn upload_property_images(
        &self,
        property_id: &str,
        upload: PreparedUpload,
    ) -> Result<Property, UploadError> {
        let current = self.properties.get_property(property_id).await?;
        if !current.status.is_listed() {
            return Err(RecordsError::NotFound {
                entity: "property",
                id: property_id.to_string(),
            }
            .into());
        }

        let batch = upload_batch();
        let mut stored: Vec<StoredImage> = Vec::with_capacity(upload.file_count());
        for (index, file) in upload.into_files().enumerate() {
            match self
                .store_property_image(property_id, &batch, index, file)
                .await
            {
                Ok(image) => stored.push(image),
                Err(err) => {
                    self.discard(&stored).await;
                    return Err(err);
                }
            }
        }

        let urls = stored.iter().map(|image| image.url.clone()).collect();
        let property = match self
            .properties
            .patch_property(property_id, PropertyPatch::images(urls))
            .await
        {
            Ok(property) => property,
            Err(err) => {
                warn!("patching images onto {property_id} failed, removing uploads");
                self.discard(&stored).await;
                return Err(err.into());
            }
        };

        info!(
            "Attached {} images to {property_id} via {}",
            stored.len(),
            self.store.backend_name()
        );
        self.events
            .publish(PropertyEvent::Updated(property_id.to_string()));
        Ok(property)
    }

    async fn store_property_image(
        &self,
        property_id: &str,
        batch: &str,
        index: usize,
        file: UploadFile,
    ) -> Result<StoredImage, UploadError> {
        let converted = convert_in_background(file, self.options.clone()).await?;
        let key = property_image_key(property_id, batch, index, &converted.extension);
        let url = self
            .store
            .put(&key, converted.bytes, &converted.content_type)
            .await?;
        Ok(StoredImage { key, url })
    }

    /// Convert and store an avatar, then point the user's profile at it
    #[instrument(skip(self, file), fields(file = %file.file_name))]
    pub async fn upload_avatar(&self, user_id: &str, file: UploadFile) -> Result<User, UploadError> {
        validate_file(&file, self.max_upload_bytes)?;
        self.users.get_user(user_id).await?;

        let options = self
            .options
            .clone()
            .resized(AVATAR_SIZE, AVATAR_SIZE, FitMode::Cover);
        let converted = convert_in_background(file, options).await?;
        let key = avatar_key(user_id, &upload_batch(), &converted.extension);
        let url = self
            .store
            .put(&key, converted.bytes, &converted.content_type)
            .await?;

        match self
            .users
            .patch_avatar(user_id, Avatar::Uploaded { url: url.clone() })
            .await
        {
            Ok(user) => {
                info!("Updated avatar for {user_id}");
                Ok(user)
            }
            Err(err) => {
                self.discard(&[StoredImage { key, url }]).await;
                Err(err.into())
            }
        }
    }

    async fn discard(&self, stored: &[StoredImage]) {
        for image in stored {
            if let Err(err) = self.store.delete(&image.key).await {
                warn!("failed to remove orphaned object {}: {err}", image.key);
            }
        }
    }
}
