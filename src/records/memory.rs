use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::RecordsError;
use crate::models::{
    Avatar, Counter, NewProperty, Property, PropertyPatch, PropertyStatus, User, UserUpdate,
};
use crate::records::traits::{PropertyRepository, UserRepository};

#[derive(Default)]
struct Collections {
    properties: HashMap<String, Property>,
    users: HashMap<String, User>,
    counter: Counter,
}

/// In-process document store for properties, users and the ID counter
#[derive(Default)]
pub struct MemoryRecords {
    inner: RwLock<Collections>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }
}

fn property_not_found(id: &str) -> RecordsError {
    RecordsError::NotFound {
        entity: "property",
        id: id.to_string(),
    }
}

fn user_not_found(id: &str) -> RecordsError {
    RecordsError::NotFound {
        entity: "user",
        id: id.to_string(),
    }
}

#[async_trait]
impl PropertyRepository for MemoryRecords {
    async fn create_property(&self, input: NewProperty) -> Result<Property, RecordsError> {
        let mut inner = self.inner.write().await;
        let id = inner.counter.next_property_id();
        let property = Property::new(id.clone(), input, Utc::now());

        if let Some(agent_id) = &property.agent_id {
            if let Some(agent) = inner
                .users
                .get_mut(agent_id)
                .and_then(|user| user.agent.as_mut())
            {
                agent.record_listing();
            }
        }

        info!(property_id = %id, "created property");
        inner.properties.insert(id, property.clone());
        Ok(property)
    }

    async fn get_property(&self, id: &str) -> Result<Property, RecordsError> {
        self.inner
            .read()
            .await
            .properties
            .get(id)
            .cloned()
            .ok_or_else(|| property_not_found(id))
    }

    async fn patch_property(&self, id: &str, patch: PropertyPatch) -> Result<Property, RecordsError> {
        let mut inner = self.inner.write().await;
        let property = inner
            .properties
            .get_mut(id)
            .ok_or_else(|| property_not_found(id))?;
        property.apply_patch(patch, Utc::now())?;
        debug!(property_id = %id, "patched property");
        Ok(property.clone())
    }

    async fn soft_delete_property(&self, id: &str) -> Result<Property, RecordsError> {
        self.patch_property(id, PropertyPatch::status(PropertyStatus::Deleted))
            .await
    }

    async fn list_properties(&self) -> Result<Vec<Property>, RecordsError> {
        let inner = self.inner.read().await;
        let mut properties: Vec<_> = inner.properties.values().cloned().collect();
        properties.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(properties)
    }

    async fn record_view(&self, id: &str) -> Result<Property, RecordsError> {
        let mut inner = self.inner.write().await;
        let property = inner
            .properties
            .get_mut(id)
            .filter(|property| property.status.is_listed())
            .ok_or_else(|| property_not_found(id))?;
        property.views += 1;
        let property = property.clone();

        if let Some(agent_id) = &property.agent_id {
            if let Some(agent) = inner
                .users
                .get_mut(agent_id)
                .and_then(|user| user.agent.as_mut())
            {
                agent.record_views(1);
            }
        }
        Ok(property)
    }
}

#[async_trait]
impl UserRepository for MemoryRecords {
    async fn insert_user(&self, user: User) -> Result<User, RecordsError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.id) {
            return Err(RecordsError::Conflict {
                entity: "user",
                id: user.id,
            });
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<User, RecordsError> {
        self.inner
            .read()
            .await
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| user_not_found(id))
    }

    async fn list_users(&self) -> Result<Vec<User>, RecordsError> {
        let inner = self.inner.read().await;
        let mut users: Vec<_> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn update_profile(&self, id: &str, update: UserUpdate) -> Result<User, RecordsError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(id).ok_or_else(|| user_not_found(id))?;
        user.apply_update(update);
        Ok(user.clone())
    }

    async fn patch_avatar(&self, id: &str, avatar: Avatar) -> Result<User, RecordsError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(id).ok_or_else(|| user_not_found(id))?;
        user.profile.avatar = avatar;
        Ok(user.clone())
    }

    async fn record_failed_login(
        &self,
        id: &str,
        now: DateTime<Utc>,
        max_attempts: u32,
        lockout: Duration,
    ) -> Result<bool, RecordsError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(id).ok_or_else(|| user_not_found(id))?;
        if user.security.is_locked(now) {
            return Ok(true);
        }
        let locked = user
            .security
            .register_failed_login(now, max_attempts, lockout);
        if locked {
            warn!(user_id = %id, "account locked after repeated failed logins");
        }
        Ok(locked)
    }

    async fn clear_failed_logins(&self, id: &str) -> Result<User, RecordsError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(id).ok_or_else(|| user_not_found(id))?;
        user.security.clear_failed_logins();
        Ok(user.clone())
    }
}
