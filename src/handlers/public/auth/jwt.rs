// handlers/public/auth/jwt.rs - bearer token acquisition and refresh

use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::LoginRequest;
use crate::app::AppState;
use crate::auth::{AuthFailure, Presentation, TokenPair};
use crate::error::ApiError;
use crate::middleware::ApiJson;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /auth/jwt/login/ - `{access_token, refresh_token}` for valid credentials
pub async fn jwt_login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user = state
        .resolver
        .resolve(Presentation::Basic {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    let pair = state.jwt.issue_pair(user.id)?;
    tracing::info!("Issued token pair for user {}", user.id);
    Ok(Json(pair))
}

/// POST /auth/jwt/refresh/ - new access token from a refresh token
///
/// The identity behind the token is not looked up again.
pub async fn jwt_refresh_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<Value>, ApiError> {
    let claims = state
        .jwt
        .verify(&payload.refresh_token)
        .map_err(|failure| match failure {
            AuthFailure::TokenExpired => ApiError::unauthorized("Refresh token expired. Please log in."),
            other => other.into(),
        })?;
    let user_id = claims.user_id()?;

    let access_token = state.jwt.issue_access_only(user_id)?;
    Ok(Json(json!({ "access_token": access_token })))
}
