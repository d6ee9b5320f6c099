use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::RecordsError;
use crate::models::{Avatar, NewProperty, Property, PropertyPatch, User, UserUpdate};
use crate::records::traits::{PropertyRepository, UserRepository};

/// Records kept behind another instance of the marketplace API
pub struct HttpRecords {
    client: Client,
    base_url: String,
}

impl HttpRecords {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("estate-hub/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        response: Result<Response>,
        entity: &'static str,
        id: &str,
    ) -> Result<T, RecordsError> {
        let response = response.map_err(|e| RecordsError::Backend(format!("{e:#}")))?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(RecordsError::NotFound {
                entity,
                id: id.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Records API returned {status} for {entity} {id}: {body}");
            return Err(RecordsError::Backend(format!(
                "{entity} request failed with {status}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RecordsError::Backend(format!("invalid {entity} payload: {e}")))
    }
}

#[async_trait]
impl PropertyRepository for HttpRecords {
    async fn create_property(&self, input: NewProperty) -> Result<Property, RecordsError> {
        let response = self
            .client
            .post(self.url("/api/properties"))
            .json(&input)
            .send()
            .await
            .context("Failed to create property");
        Self::decode(response, "property", "new").await
    }

    async fn get_property(&self, id: &str) -> Result<Property, RecordsError> {
        let response = self
            .client
            .get(self.url(&format!("/api/properties/{id}")))
            .send()
            .await
            .context("Failed to fetch property");
        Self::decode(response, "property", id).await
    }

    async fn patch_property(&self, id: &str, patch: PropertyPatch) -> Result<Property, RecordsError> {
        debug!("PATCH property {id}");
        let response = self
            .client
            .patch(self.url(&format!("/api/properties/{id}")))
            .json(&patch)
            .send()
            .await
            .context("Failed to patch property");
        Self::decode(response, "property", id).await
    }

    async fn soft_delete_property(&self, id: &str) -> Result<Property, RecordsError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/properties/{id}")))
            .send()
            .await
            .context("Failed to delete property");
        Self::decode(response, "property", id).await
    }

    async fn list_properties(&self) -> Result<Vec<Property>, RecordsError> {
        let response = self
            .client
            .get(self.url("/api/admin/properties"))
            .send()
            .await
            .context("Failed to list properties");
        Self::decode(response, "property", "*").await
    }

    async fn record_view(&self, id: &str) -> Result<Property, RecordsError> {
        let response = self
            .client
            .post(self.url(&format!("/api/properties/{id}/views")))
            .send()
            .await
            .context("Failed to record property view");
        Self::decode(response, "property", id).await
    }
}

#[async_trait]
impl UserRepository for HttpRecords {
    async fn insert_user(&self, _user: User) -> Result<User, RecordsError> {
        Err(accounts_are_remote("registration"))
    }

    async fn get_user(&self, id: &str) -> Result<User, RecordsError> {
        let response = self
            .client
            .get(self.url(&format!("/api/users/{id}")))
            .send()
            .await
            .context("Failed to fetch user");
        Self::decode(response, "user", id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RecordsError> {
        let response = self
            .client
            .get(self.url("/api/users"))
            .send()
            .await
            .context("Failed to list users");
        Self::decode(response, "user", "*").await
    }

    async fn update_profile(&self, id: &str, update: UserUpdate) -> Result<User, RecordsError> {
        let response = self
            .client
            .put(self.url(&format!("/api/users/{id}")))
            .json(&update)
            .send()
            .await
            .context("Failed to update user");
        Self::decode(response, "user", id).await
    }

    async fn patch_avatar(&self, id: &str, avatar: Avatar) -> Result<User, RecordsError> {
        let response = self
            .client
            .patch(self.url(&format!("/api/users/{id}/avatar")))
            .json(&avatar)
            .send()
            .await
            .context("Failed to patch avatar");
        Self::decode(response, "user", id).await
    }

    async fn record_failed_login(
        &self,
        _id: &str,
        _now: DateTime<Utc>,
        _max_attempts: u32,
        _lockout: chrono::Duration,
    ) -> Result<bool, RecordsError> {
        Err(accounts_are_remote("login"))
    }

    async fn clear_failed_logins(&self, _id: &str) -> Result<User, RecordsError> {
        Err(accounts_are_remote("login"))
    }
}

/// Credentials never leave the records service, so account writes
/// have to go to it directly
fn accounts_are_remote(operation: &str) -> RecordsError {
    RecordsError::Backend(format!("{operation} is handled by the records service"))
}
