use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModelError;

/// Whether a listing is for sale or for rent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Plot,
    Commercial,
}

/// Soft-deletion state of a property.
///
/// Only `Active` properties show up in public and agent listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Active,
    PendingDeletion,
    Deleted,
}

impl PropertyStatus {
    pub fn can_transition_to(self, next: PropertyStatus) -> bool {
        use PropertyStatus::*;
        match (self, next) {
            (Active, PendingDeletion) | (Active, Deleted) => true,
            (PendingDeletion, Deleted) | (PendingDeletion, Active) => true,
            (Active, Active) | (PendingDeletion, PendingDeletion) => false,
            (Deleted, _) => false,
        }
    }

    pub fn transition_to(self, next: PropertyStatus) -> Result<PropertyStatus, ModelError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ModelError::InvalidTransition {
                entity: "property",
                from: format!("{self:?}"),
                to: format!("{next:?}"),
            })
        }
    }

    pub fn is_listed(self) -> bool {
        matches!(self, PropertyStatus::Active)
    }
}

/// Location information for a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub city: String,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Core property record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: i64,
    pub location: Location,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub description: String,
    /// Primary listing image; never repeated in `images`
    pub thumbnail_image: Option<String>,
    pub images: Vec<String>,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default)]
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when a property is first created.
///
/// Images are never part of creation; they are patched in once the
/// upload pipeline has stored them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProperty {
    pub title: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: i64,
    pub location: Location,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub description: String,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PropertyStatus>,
}

impl PropertyPatch {
    /// Patch that sets the listing images: first URL becomes the thumbnail
    pub fn images(mut urls: Vec<String>) -> Self {
        let thumbnail = if urls.is_empty() {
            None
        } else {
            Some(urls.remove(0))
        };
        Self {
            thumbnail_image: thumbnail,
            images: Some(urls),
            ..Self::default()
        }
    }

    pub fn status(status: PropertyStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Property {
    pub fn new(id: String, input: NewProperty, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            property_type: input.property_type,
            listing_type: input.listing_type,
            price: input.price,
            location: input.location,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            description: input.description,
            thumbnail_image: None,
            images: Vec::new(),
            agent_id: input.agent_id,
            agent_name: input.agent_name,
            agent_phone: input.agent_phone,
            status: PropertyStatus::Active,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch. Status changes go through the transition check and
    /// the thumbnail is stripped from the gallery afterwards.
    pub fn apply_patch(&mut self, patch: PropertyPatch, now: DateTime<Utc>) -> Result<(), ModelError> {
        if let Some(status) = patch.status {
            self.status = self.status.transition_to(status)?;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(listing_type) = patch.listing_type {
            self.listing_type = listing_type;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(bedrooms) = patch.bedrooms {
            self.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = patch.bathrooms {
            self.bathrooms = bathrooms;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(thumbnail) = patch.thumbnail_image {
            self.thumbnail_image = Some(thumbnail);
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(thumbnail) = &self.thumbnail_image {
            self.images.retain(|url| url != thumbnail);
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Sequence used to mint human-readable property IDs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counter {
    pub value: u64,
}

impl Counter {
    pub fn next_property_id(&mut self) -> String {
        self.value += 1;
        format!("PROP-{:05}", self.value)
    }
}
