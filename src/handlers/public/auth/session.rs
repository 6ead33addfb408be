// handlers/public/auth/session.rs - cookie session login and logout

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
};

use super::LoginRequest;
use crate::app::AppState;
use crate::auth::{extract_session_token, Presentation};
use crate::error::ApiError;
use crate::middleware::ApiJson;

/// POST /auth/session/login/
///
/// Verifies `{email, password}` and answers 200 with an empty body and a
/// `session_id` cookie. Any session the user already had stops working.
pub async fn session_login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .resolver
        .resolve(Presentation::Basic {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    let token = state.sessions.issue(user.id).await?;
    let cookie = state.sessions.cookie(&token).map_err(|e| {
        tracing::error!("Session cookie not representable: {}", e);
        ApiError::internal_server_error("Could not create session")
    })?;

    Ok((StatusCode::OK, AppendHeaders([(SET_COOKIE, cookie)])))
}

/// POST /auth/session/logout/
///
/// Idempotent: always 204 and an expired cookie, whether or not a session was presented.
pub async fn session_logout_post(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.sessions.revoke(&token).await?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, state.sessions.clear_cookie())]),
    ))
}
