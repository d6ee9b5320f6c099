use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ModelError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Agent,
    Admin,
}

/// Where a user's avatar comes from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Avatar {
    #[default]
    None,
    External { url: String },
    Uploaded { url: String },
}

impl Avatar {
    pub const PLACEHOLDER: &'static str = "/images/avatar-placeholder.png";

    pub fn display_url(&self) -> &str {
        match self {
            Avatar::None => Self::PLACEHOLDER,
            Avatar::External { url } | Avatar::Uploaded { url } => url,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub avatar: Avatar,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// Agent verification review state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn transition_to(self, next: VerificationStatus) -> Result<VerificationStatus, ModelError> {
        use VerificationStatus::*;
        let allowed = match (self, next) {
            (Unverified, Pending) | (Rejected, Pending) => true,
            (Pending, Verified) | (Pending, Rejected) => true,
            (Verified, Unverified) => true,
            (Unverified, _) | (Pending, _) | (Verified, _) | (Rejected, _) => false,
        };
        if allowed {
            Ok(next)
        } else {
            Err(ModelError::InvalidTransition {
                entity: "verification",
                from: format!("{self:?}"),
                to: format!("{next:?}"),
            })
        }
    }
}

/// Agent-specific sub-document.
///
/// `total_views` and `total_properties` only ever grow; removing a
/// listing does not take anything back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentProfile {
    pub license_number: Option<String>,
    pub rating: f32,
    pub verification: VerificationStatus,
    pub blue_tick: bool,
    pub total_views: u64,
    pub total_properties: u64,
}

impl AgentProfile {
    pub fn set_verification(&mut self, next: VerificationStatus) -> Result<(), ModelError> {
        self.verification = self.verification.transition_to(next)?;
        self.blue_tick = self.verification == VerificationStatus::Verified;
        Ok(())
    }

    pub fn record_listing(&mut self) {
        self.total_properties += 1;
    }

    pub fn record_views(&mut self, views: u64) {
        self.total_views += views;
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permissions {
    pub can_list_properties: bool,
    pub can_manage_users: bool,
    pub can_verify_agents: bool,
}

impl Permissions {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::User => Self::default(),
            Role::Agent => Self {
                can_list_properties: true,
                ..Self::default()
            },
            Role::Admin => Self {
                can_list_properties: true,
                can_manage_users: true,
                can_verify_agents: true,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SecurityState {
    pub failed_login_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub must_change_password: bool,
    /// Argon2id PHC string; never sent back out over the API
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
}

impl SecurityState {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Count a failed login. Returns `true` when this attempt locked the account.
    pub fn register_failed_login(
        &mut self,
        now: DateTime<Utc>,
        max_attempts: u32,
        lockout: Duration,
    ) -> bool {
        self.failed_login_attempts += 1;
        if self.failed_login_attempts >= max_attempts {
            self.locked_until = Some(now + lockout);
            self.failed_login_attempts = 0;
            return true;
        }
        false
    }

    pub fn clear_failed_logins(&mut self) {
        self.failed_login_attempts = 0;
        self.locked_until = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub profile: Profile,
    pub agent: Option<AgentProfile>,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub security: SecurityState,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            phone: None,
            role,
            profile: Profile::default(),
            agent: (role == Role::Agent).then(AgentProfile::default),
            permissions: Permissions::for_role(role),
            security: SecurityState::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn is_agent(&self) -> bool {
        self.agent.is_some()
    }

    /// Apply self-service edits. Role, security state and agent totals
    /// are never touched here.
    pub fn apply_update(&mut self, update: UserUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(bio) = update.bio {
            self.profile.bio = Some(bio);
        }
        if let Some(location) = update.location {
            self.profile.location = Some(location);
        }
    }
}

/// Fields a user may change on their own record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Digits of a phone number, with a leading `+` country code or any
/// punctuation dropped
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_falls_back_to_placeholder() {
        assert_eq!(Avatar::None.display_url(), Avatar::PLACEHOLDER);
        let external = Avatar::External {
            url: "https://cdn.example.com/me.jpg".into(),
        };
        assert_eq!(external.display_url(), "https://cdn.example.com/me.jpg");
    }

    #[test]
    fn blue_tick_follows_verification() {
        let mut agent = AgentProfile::default();
        agent.set_verification(VerificationStatus::Pending).unwrap();
        assert!(!agent.blue_tick);
        agent.set_verification(VerificationStatus::Verified).unwrap();
        assert!(agent.blue_tick);
        agent.set_verification(VerificationStatus::Unverified).unwrap();
        assert!(!agent.blue_tick);
    }

    #[test]
    fn verification_cannot_skip_review() {
        let mut agent = AgentProfile::default();
        assert!(agent.set_verification(VerificationStatus::Verified).is_err());
        assert_eq!(agent.verification, VerificationStatus::Unverified);
    }

    #[test]
    fn lockout_after_max_attempts() {
        let now = Utc::now();
        let mut security = SecurityState::default();
        assert!(!security.register_failed_login(now, 3, Duration::minutes(5)));
        assert!(!security.register_failed_login(now, 3, Duration::minutes(5)));
        assert!(security.register_failed_login(now, 3, Duration::minutes(5)));
        assert!(security.is_locked(now));
        assert!(!security.is_locked(now + Duration::minutes(6)));

        security.clear_failed_logins();
        assert!(!security.is_locked(now));
    }

    #[test]
    fn agent_role_gets_agent_profile() {
        let agent = User::new("Asha", "asha@example.com", Role::Agent);
        assert!(agent.is_agent());
        assert!(agent.permissions.can_list_properties);
        let buyer = User::new("Ravi", "ravi@example.com", Role::User);
        assert!(!buyer.is_agent());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let mut user = User::new("Asha", "asha@example.com", Role::User);
        user.security.password_hash = Some("$argon2id$secret".into());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
    }

    #[test]
    fn update_leaves_role_and_credentials_alone() {
        let mut user = User::new("Asha", "asha@example.com", Role::Agent);
        user.security.password_hash = Some("$argon2id$secret".into());
        if let Some(agent) = user.agent.as_mut() {
            agent.record_views(7);
        }

        // unknown fields such as role are ignored
        let update: UserUpdate = serde_json::from_value(serde_json::json!({
            "bio": "Sea-facing flats in Bandra",
            "role": "admin",
            "agent": { "total_views": 0 }
        }))
        .unwrap();
        user.apply_update(update);

        assert_eq!(user.profile.bio.as_deref(), Some("Sea-facing flats in Bandra"));
        assert_eq!(user.role, Role::Agent);
        assert_eq!(user.agent.unwrap().total_views, 7);
        assert!(user.security.password_hash.is_some());
        assert_eq!(user.name, "Asha");
    }

    #[test]
    fn phone_normalization_keeps_digits() {
        assert_eq!(normalize_phone("+91 98765-43210"), "919876543210");
    }
}
