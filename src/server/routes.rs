use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{hash_password, validate_password, verify_password};
use crate::error::UploadError;
use crate::events::PropertyEvent;
use crate::listing::{filter_properties, properties_for_agent, ListingQuery};
use crate::models::{
    Avatar, NewProperty, Property, PropertyPatch, PropertyStatus, Role, User, UserUpdate,
};
use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::upload::{prepare_upload, UploadFile};

type ApiResult<T> = Result<T, AppError>;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<Vec<Property>>> {
    let properties = state.properties.list_properties().await?;
    Ok(Json(filter_properties(&properties, &query)))
}

/// Every record, soft-deleted ones included
pub async fn list_all_properties(State(state): State<AppState>) -> ApiResult<Json<Vec<Property>>> {
    Ok(Json(state.properties.list_properties().await?))
}

pub async fn create_property(
    State(state): State<AppState>,
    Json(input): Json<NewProperty>,
) -> ApiResult<(StatusCode, Json<Property>)> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    if input.price < 0 {
        return Err(AppError::BadRequest("price cannot be negative".to_string()));
    }

    let created = state.uploader.create_property_with_images(input, None).await?;
    Ok((StatusCode::CREATED, Json(created.property)))
}

pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Property>> {
    let property = state.properties.get_property(&id).await?;
    if !property.status.is_listed() {
        return Err(AppError::NotFound(format!("property {id}")));
    }
    Ok(Json(property))
}

pub async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Property>> {
    Ok(Json(state.properties.record_view(&id).await?))
}

pub async fn patch_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<PropertyPatch>,
) -> ApiResult<Json<Property>> {
    let deleting = patch.status == Some(PropertyStatus::Deleted);
    let property = state.properties.patch_property(&id, patch).await?;

    let event = if deleting {
        PropertyEvent::Deleted(id)
    } else {
        PropertyEvent::Updated(id)
    };
    state.events.publish(event);
    Ok(Json(property))
}

pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Property>> {
    let property = state.properties.soft_delete_property(&id).await?;
    info!("Soft-deleted property {id}");
    state.events.publish(PropertyEvent::Deleted(id));
    Ok(Json(property))
}

#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub property: Property,
    pub notices: Vec<String>,
}

/// Multipart upload: one `thumbnail` field and any number of `images` fields
pub async fn upload_property_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<ImagesResponse>> {
    let mut thumbnail = None;
    let mut additional = Vec::new();

    for (field, file) in read_files(multipart).await? {
        match field.as_str() {
            "thumbnail" if thumbnail.is_none() => thumbnail = Some(file),
            "thumbnail" | "images" | "images[]" => additional.push(file),
            other => warn!("ignoring unexpected multipart field {other}"),
        }
    }

    let thumbnail = thumbnail.ok_or(UploadError::NoFile)?;
    let prepared = prepare_upload(thumbnail, additional, state.uploader.max_upload_bytes())?;
    let notices = prepared.notices.iter().map(ToString::to_string).collect();

    let property = state.uploader.upload_property_images(&id, prepared).await?;
    Ok(Json(ImagesResponse { property, notices }))
}

async fn read_files(mut multipart: Multipart) -> ApiResult<Vec<(String, UploadFile)>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read {file_name}: {e}")))?;

        files.push((name, UploadFile::new(file_name, content_type, bytes.to_vec())));
    }
    Ok(files)
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.list_users().await?))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get_user(&id).await?))
}

/// Self-service profile edits; anything outside [`UserUpdate`] is ignored
pub async fn put_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut update): Json<UserUpdate>,
) -> ApiResult<Json<User>> {
    if let Some(name) = update.name.take() {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".to_string()));
        }
        update.name = Some(name.to_string());
    }
    Ok(Json(state.users.update_profile(&id, update).await?))
}

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    if input.role == Role::Admin {
        return Err(AppError::BadRequest("admins cannot self-register".to_string()));
    }
    validate_password(&input.password, input.phone.as_deref())?;

    let email = input.email.trim().to_lowercase();
    let existing = state.users.list_users().await?;
    if existing.iter().any(|u| u.email.eq_ignore_ascii_case(&email)) {
        return Err(AppError::BadRequest("email is already registered".to_string()));
    }

    let mut user = User::new(input.name.trim(), email, input.role);
    user.phone = input.phone;
    user.security.password_hash = Some(hash_password(
        &input.password,
        state.config.password_pepper.as_deref(),
    )?);

    let user = state.users.insert_user(user).await?;
    info!("Registered {:?} {}", user.role, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Check credentials and maintain the lockout counters.
/// Sessions are handled elsewhere; this only returns the user.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> ApiResult<Json<User>> {
    let now = Utc::now();
    let user = state
        .users
        .list_users()
        .await?
        .into_iter()
        .find(|u| u.email.eq_ignore_ascii_case(input.email.trim()))
        .ok_or(AppError::InvalidCredentials)?;

    if user.security.is_locked(now) {
        return Err(AppError::AccountLocked);
    }

    let Some(hash) = user.security.password_hash.as_deref() else {
        return Err(AppError::InvalidCredentials);
    };

    if verify_password(&input.password, hash, state.config.password_pepper.as_deref())? {
        let user = state.users.clear_failed_logins(&user.id).await?;
        return Ok(Json(user));
    }

    let locked = state
        .users
        .record_failed_login(
            &user.id,
            now,
            state.config.max_failed_logins,
            Duration::minutes(state.config.lockout_minutes),
        )
        .await?;
    if locked {
        return Err(AppError::AccountLocked);
    }
    Err(AppError::InvalidCredentials)
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<User>> {
    let file = read_files(multipart)
        .await?
        .into_iter()
        .find(|(field, _)| field == "avatar")
        .map(|(_, file)| file)
        .ok_or(UploadError::NoFile)?;

    Ok(Json(state.uploader.upload_avatar(&id, file).await?))
}

/// Point an avatar at an externally hosted image, or clear it
pub async fn set_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(avatar): Json<Avatar>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.patch_avatar(&id, avatar).await?))
}

pub async fn agent_properties(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Property>>> {
    let agent = state.users.get_user(&id).await?;
    if !agent.is_agent() {
        return Err(AppError::BadRequest(format!("user {id} is not an agent")));
    }
    let properties = state.properties.list_properties().await?;
    Ok(Json(properties_for_agent(&properties, &agent)))
}

/// Ask every open view to refetch
pub async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    let delivered = state.events.publish(PropertyEvent::Refresh);
    Json(json!({ "delivered": delivered }))
}
