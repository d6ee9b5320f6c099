//! Real-estate marketplace backend: listings, agents, password policy and
//! the listing image pipeline (validate, convert to WebP, store, attach,
//! notify).

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod listing;
pub mod models;
pub mod records;
pub mod server;
pub mod storage;
pub mod upload;
