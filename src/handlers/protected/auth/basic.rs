// handlers/protected/auth/basic.rs - /auth/basic/* behind HTTP Basic

use axum::{extract::State, http::StatusCode, response::Json, Extension};

use crate::app::AppState;
use crate::database::models::{ProfileUpdate, UserProfile};
use crate::database::CredentialStore;
use crate::error::ApiError;
use crate::middleware::{ApiJson, CurrentUser};

/// POST /auth/basic/login/ - echo the identity behind valid Basic credentials
pub async fn basic_login_post(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

/// GET /auth/basic/profile/
pub async fn basic_profile_get(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

/// PUT /auth/basic/profile/ - fields left out of the body are kept
pub async fn basic_profile_put(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    if update.is_empty() {
        return Ok(Json(UserProfile::from(&user)));
    }
    let updated = state.store.update_profile(user.id, &update).await?;
    Ok(Json(UserProfile::from(&updated)))
}

/// DELETE /auth/basic/profile/ - soft delete; the account can no longer authenticate
pub async fn basic_profile_delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    state.store.soft_delete_user(user.id).await?;
    tracing::info!("Soft-deleted user {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}
