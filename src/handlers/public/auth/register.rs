// handlers/public/auth/register.rs - POST /auth/register/ and /auth/register/verify/:code/

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::ApiJson;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Create an inactive account and email it a confirmation code.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .registration
        .register(&payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Email confirmation sent to your email." })),
    ))
}

/// Redeem a confirmation code; each code works once.
pub async fn register_verify_post(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.registration.confirm(&code).await?;
    Ok(Json(json!({ "message": "User registered successfully" })))
}
