use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::{ImageError, PasswordError, RecordsError, UploadError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is locked, try again later")]
    AccountLocked,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Records(#[from] RecordsError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AccountLocked => StatusCode::LOCKED,
            AppError::Records(err) => records_status(err),
            AppError::Password(PasswordError::Hash(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Password(_) => StatusCode::BAD_REQUEST,
            AppError::Upload(err) => match err {
                UploadError::InvalidMimeType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                UploadError::Image(ImageError::UnsupportedType { .. }) => {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                }
                UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                UploadError::NoFile => StatusCode::BAD_REQUEST,
                UploadError::Image(_) => StatusCode::UNPROCESSABLE_ENTITY,
                UploadError::Storage(_) => StatusCode::BAD_GATEWAY,
                UploadError::Records(err) => records_status(err),
            },
        }
    }
}

fn records_status(err: &RecordsError) -> StatusCode {
    match err {
        RecordsError::NotFound { .. } => StatusCode::NOT_FOUND,
        RecordsError::Conflict { .. } | RecordsError::Model(_) => StatusCode::CONFLICT,
        RecordsError::Backend(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
