//! Authentication and profile endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::{delete, post, put},
};
use devtodo_common::{AppError, AppResult, generate_avatar_key};
use devtodo_core::{LoginInput, RegisterInput, UpdateProfileInput};
use chrono::{DateTime, FixedOffset};
use devtodo_db::entities::user;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::MessageResponse};

/// User payload in API responses. Never exposes the hash or token column.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            name: u.name,
            avatar: u.avatar_url,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Register/login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

/// Profile mutation response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile/name", put(update_name))
        .route("/profile/photo", put(upload_photo).delete(delete_photo))
        .route("/account", delete(delete_account))
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let (created, token) = state.user_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: created.into(),
            token,
        }),
    ))
}

/// Log in with email-or-username plus password.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let (logged_in, token) = state.user_service.login(req).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: logged_in.into(),
        token,
    }))
}

/// Set or clear the display name.
async fn update_name(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<Json<ProfileResponse>> {
    let updated = state.user_service.set_name(&current.id, req).await?;

    Ok(Json(ProfileResponse {
        message: "Name updated successfully".to_string(),
        user: updated.into(),
    }))
}

/// Upload a profile photo (multipart field `photo`, body limit 5 MiB).
async fn upload_photo(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<ProfileResponse>> {
    let mut uploaded = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("photo") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("photo.bin").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;

        let key = generate_avatar_key(&current.id, &file_name);
        uploaded = Some(state.storage.upload(&key, &data, &content_type).await?);
        break;
    }

    let stored = uploaded.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    // Best-effort removal of the previous photo.
    if let Some(old_key) = current.avatar_url.as_deref().and_then(avatar_key_of_url)
        && let Err(e) = state.storage.delete(old_key).await
    {
        tracing::warn!(user_id = %current.id, error = %e, "Failed to remove previous avatar");
    }

    let updated = state
        .user_service
        .set_avatar_url(&current.id, Some(stored.url))
        .await?;

    Ok(Json(ProfileResponse {
        message: "Profile photo updated successfully".to_string(),
        user: updated.into(),
    }))
}

/// Delete the profile photo.
async fn delete_photo(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    if let Some(key) = current.avatar_url.as_deref().and_then(avatar_key_of_url)
        && let Err(e) = state.storage.delete(key).await
    {
        tracing::warn!(user_id = %current.id, error = %e, "Failed to remove avatar file");
    }

    let updated = state.user_service.set_avatar_url(&current.id, None).await?;

    Ok(Json(ProfileResponse {
        message: "Profile photo deleted successfully".to_string(),
        user: updated.into(),
    }))
}

/// Delete the account. Todos and notifications cascade in the datastore.
async fn delete_account(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> AppResult<Json<MessageResponse>> {
    let deleted = state.user_service.delete_account(&current.id).await?;

    if let Some(key) = deleted.avatar_url.as_deref().and_then(avatar_key_of_url)
        && let Err(e) = state.storage.delete(key).await
    {
        tracing::warn!(user_id = %deleted.id, error = %e, "Failed to remove avatar file");
    }

    Ok(Json(MessageResponse::new("Account deleted successfully")))
}

/// Recover the storage key from a public avatar URL.
fn avatar_key_of_url(url: &str) -> Option<&str> {
    url.find("avatars/").map(|idx| &url[idx..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_avatar_key_of_url() {
        assert_eq!(
            avatar_key_of_url("/uploads/avatars/u1/123_abc.png"),
            Some("avatars/u1/123_abc.png")
        );
        assert_eq!(avatar_key_of_url("https://cdn.example.com/x.png"), None);
    }

    #[test]
    fn test_user_response_shape() {
        let response = UserResponse {
            id: "u1".to_string(),
            email: "a@b.com".to_string(),
            username: "tester".to_string(),
            name: None,
            avatar: Some("/uploads/avatars/u1/a.png".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("avatar").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("token").is_none());
    }
}
