//! Listing-page filtering, sorting and agent matching.

pub mod types;

use tracing::debug;

use crate::models::{normalize_phone, Property, User};

pub use types::{ListingQuery, SortOrder};

/// Digits compared when matching phone numbers
const PHONE_MATCH_DIGITS: usize = 10;

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches_query(property: &Property, query: &ListingQuery) -> bool {
    if !property.status.is_listed() {
        return false;
    }
    if query.listing_type.is_some_and(|t| t != property.listing_type) {
        return false;
    }
    if query.property_type.is_some_and(|t| t != property.property_type) {
        return false;
    }
    if let Some(district) = query.district.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        let matches = property
            .location
            .district
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case(district));
        if !matches {
            return false;
        }
    }
    if query.min_price.is_some_and(|min| property.price < min) {
        return false;
    }
    if query.max_price.is_some_and(|max| property.price > max) {
        return false;
    }
    if query.min_bedrooms.is_some_and(|min| property.bedrooms < min) {
        return false;
    }
    if query.min_bathrooms.is_some_and(|min| property.bathrooms < min) {
        return false;
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        let location = &property.location;
        let hit = contains_ignore_case(&property.title, &needle)
            || contains_ignore_case(&location.city, &needle)
            || location
                .district
                .as_deref()
                .is_some_and(|d| contains_ignore_case(d, &needle))
            || location
                .address
                .as_deref()
                .is_some_and(|a| contains_ignore_case(a, &needle));
        if !hit {
            return false;
        }
    }
    true
}

/// Apply a listing query. Soft-deleted properties never make it through.
pub fn filter_properties(properties: &[Property], query: &ListingQuery) -> Vec<Property> {
    let mut matched: Vec<Property> = properties
        .iter()
        .filter(|p| matches_query(p, query))
        .cloned()
        .collect();

    match query.sort {
        SortOrder::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::PriceAsc => matched.sort_by_key(|p| p.price),
        SortOrder::PriceDesc => matched.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOrder::MostViewed => matched.sort_by(|a, b| b.views.cmp(&a.views)),
    }
    matched
}

fn phone_tail(phone: &str) -> String {
    let digits = normalize_phone(phone);
    digits[digits.len().saturating_sub(PHONE_MATCH_DIGITS)..].to_string()
}

/// Does this property belong to `agent`?
///
/// Properties carrying an `agent_id` are matched on it alone. Older records
/// without one fall back to the agent name or phone snapshot.
pub fn belongs_to_agent(property: &Property, agent: &User) -> bool {
    if let Some(agent_id) = &property.agent_id {
        return agent_id == &agent.id;
    }

    let name_match = property
        .agent_name
        .as_deref()
        .is_some_and(|name| name.trim().eq_ignore_ascii_case(agent.name.trim()));

    let phone_match = match (property.agent_phone.as_deref(), agent.phone.as_deref()) {
        (Some(listed), Some(own)) => {
            let listed = phone_tail(listed);
            !listed.is_empty() && listed == phone_tail(own)
        }
        _ => false,
    };

    if name_match || phone_match {
        debug!(
            property_id = %property.id,
            agent_id = %agent.id,
            "matched property to agent without agent_id"
        );
    }
    name_match || phone_match
}

/// Active listings belonging to an agent, newest first
pub fn properties_for_agent(properties: &[Property], agent: &User) -> Vec<Property> {
    let mut owned: Vec<Property> = properties
        .iter()
        .filter(|p| p.status.is_listed() && belongs_to_agent(p, agent))
        .cloned()
        .collect();
    owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    owned
}
