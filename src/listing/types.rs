use serde::{Deserialize, Serialize};

use crate::models::{ListingType, PropertyType};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    MostViewed,
}

/// Filters for the property listing page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingQuery {
    pub listing_type: Option<ListingType>,
    pub property_type: Option<PropertyType>,
    /// District name, matched case-insensitively
    pub district: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    /// Free text matched against title, city, district and address
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}
