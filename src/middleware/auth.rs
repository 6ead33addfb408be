use axum::{
    extract::{Request, State},
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::auth::{AuthFailure, Presentation};
use crate::database::models::User;
use crate::error::ApiError;

/// Identity resolved by one of the authentication middlewares
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// HTTP Basic credentials; failures carry a `WWW-Authenticate: Basic` challenge
pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let presentation = Presentation::basic_from_headers(request.headers());
    match authenticate(&state, presentation, request, next).await {
        Ok(response) => response,
        Err(err) => {
            let challenge = err.status_code() == StatusCode::UNAUTHORIZED;
            let mut response = err.into_response();
            if challenge {
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
            }
            response
        }
    }
}

/// `session_id` cookie
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presentation = Presentation::session_from_headers(request.headers());
    authenticate(&state, presentation, request, next).await
}

/// `Authorization: Bearer` access token. A missing or unusable header reads "Invalid credentials".
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presentation = Presentation::bearer_from_headers(request.headers())
        .map_err(|_| ApiError::unauthorized(MISSING_BEARER_MESSAGE))?;
    authenticate(&state, Ok(presentation), request, next).await
}

const MISSING_BEARER_MESSAGE: &str = "Invalid credentials";

async fn authenticate(
    state: &AppState,
    presentation: Result<Presentation, AuthFailure>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state.resolver.resolve(presentation?).await?;
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
