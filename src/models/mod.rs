pub mod property;
pub mod user;

use thiserror::Error;

pub use property::{
    Counter, ListingType, Location, NewProperty, Property, PropertyPatch, PropertyStatus,
    PropertyType,
};
pub use user::{
    normalize_phone, AgentProfile, Avatar, Permissions, Profile, Role, SecurityState, User,
    UserUpdate, VerificationStatus,
};

/// Errors raised by model state transitions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid {entity} transition from {from:?} to {to:?}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}
