//! Error types shared across the upload pipeline, storage and records.

use thiserror::Error;

use crate::models::ModelError;

/// Failures while decoding or re-encoding an image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unsupported file type: {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("encoder produced invalid output: {0}")]
    InvalidOutput(String),

    #[error("image task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to store object {key}: {reason}")]
    Put { key: String, reason: String },

    #[error("failed to delete object {key}: {reason}")]
    Delete { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} {id} already exists")]
    Conflict { entity: &'static str, id: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("records backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{file_name}: invalid file type {mime_type}")]
    InvalidMimeType { file_name: String, mime_type: String },

    #[error("{file_name}: file too large ({size} bytes, max {max_size})")]
    TooLarge {
        file_name: String,
        size: usize,
        max_size: usize,
    },

    #[error("no file provided")]
    NoFile,

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Records(#[from] RecordsError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },

    #[error("password cannot be only numbers")]
    AllNumeric,

    #[error("password cannot contain your phone number")]
    ContainsPhone,

    #[error("password hashing failed: {0}")]
    Hash(String),
}
