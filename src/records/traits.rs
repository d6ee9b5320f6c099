use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::RecordsError;
use crate::models::{Avatar, NewProperty, Property, PropertyPatch, User, UserUpdate};

/// Property record access
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Create a property with a freshly minted ID and no images
    async fn create_property(&self, input: NewProperty) -> Result<Property, RecordsError>;

    async fn get_property(&self, id: &str) -> Result<Property, RecordsError>;

    async fn patch_property(&self, id: &str, patch: PropertyPatch) -> Result<Property, RecordsError>;

    async fn soft_delete_property(&self, id: &str) -> Result<Property, RecordsError>;

    /// Every stored property, soft-deleted ones included.
    /// Listing code filters them out.
    async fn list_properties(&self) -> Result<Vec<Property>, RecordsError>;

    /// Count a view on the property and on its agent's running total.
    /// Only listed properties can be viewed.
    async fn record_view(&self, id: &str) -> Result<Property, RecordsError>;
}

/// User record access
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user; an existing ID is a conflict
    async fn insert_user(&self, user: User) -> Result<User, RecordsError>;

    async fn get_user(&self, id: &str) -> Result<User, RecordsError>;

    async fn list_users(&self) -> Result<Vec<User>, RecordsError>;

    async fn update_profile(&self, id: &str, update: UserUpdate) -> Result<User, RecordsError>;

    async fn patch_avatar(&self, id: &str, avatar: Avatar) -> Result<User, RecordsError>;

    /// Count a failed login against the stored security state.
    /// Returns `true` when the account is locked afterwards.
    async fn record_failed_login(
        &self,
        id: &str,
        now: DateTime<Utc>,
        max_attempts: u32,
        lockout: Duration,
    ) -> Result<bool, RecordsError>;

    async fn clear_failed_logins(&self, id: &str) -> Result<User, RecordsError>;
}
