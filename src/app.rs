use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{
    ConfirmationCodes, IdentityResolver, JwtError, JwtIssuer, PasswordHasher, RegistrationService,
    SessionIssuer,
};
use crate::config::AppConfig;
use crate::database::CredentialStore;
use crate::handlers::{protected, public};
use crate::mail::Mailer;
use crate::middleware::{basic_auth_middleware, jwt_auth_middleware, session_auth_middleware};

/// Everything a handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn CredentialStore>,
    pub sessions: SessionIssuer,
    pub jwt: JwtIssuer,
    pub resolver: IdentityResolver,
    pub registration: RegistrationService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn CredentialStore>,
        codes: Arc<dyn ConfirmationCodes>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, JwtError> {
        let hasher = PasswordHasher::new();
        let jwt = JwtIssuer::from_config(&config.security)?;
        let sessions = SessionIssuer::new(store.clone(), config.security.session_ttl());
        let resolver = IdentityResolver::new(store.clone(), hasher.clone(), sessions.clone(), jwt.clone());
        let registration = RegistrationService::new(
            store.clone(),
            hasher,
            codes,
            mailer,
            config.security.code_ttl(),
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            sessions,
            jwt,
            resolver,
            registration,
        })
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(basic_routes(state.clone()))
        .merge(session_routes(state.clone()))
        .merge(jwt_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register/", post(auth::register_post))
        .route("/auth/register/verify/:code/", post(auth::register_verify_post))
        .route("/auth/session/login/", post(auth::session_login_post))
        .route("/auth/session/logout/", post(auth::session_logout_post))
        .route("/auth/jwt/login/", post(auth::jwt_login_post))
        .route("/auth/jwt/refresh/", post(auth::jwt_refresh_post))
}

fn basic_routes(state: AppState) -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/auth/basic/login/", post(auth::basic_login_post))
        .route(
            "/auth/basic/profile/",
            get(auth::basic_profile_get)
                .put(auth::basic_profile_put)
                .delete(auth::basic_profile_delete),
        )
        .route_layer(from_fn_with_state(state, basic_auth_middleware))
}

fn session_routes(state: AppState) -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/auth/session/profile/", get(auth::session_profile_get))
        .route_layer(from_fn_with_state(state, session_auth_middleware))
}

fn jwt_routes(state: AppState) -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/auth/jwt/me/", get(auth::jwt_me_get))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

/// Permissive in development; otherwise only the configured origins, with credentials.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| {
            // A wildcard cannot be combined with credentials; tower-http panics on it.
            if origin.trim() == "*" {
                tracing::warn!("Ignoring wildcard CORS origin outside development");
                return None;
            }
            match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "News API (Rust)",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "register": "/auth/register/, /auth/register/verify/:code/",
            "basic": "/auth/basic/login/, /auth/basic/profile/ (HTTP Basic)",
            "session": "/auth/session/login/, /auth/session/profile/ (cookie), /auth/session/logout/",
            "jwt": "/auth/jwt/login/, /auth/jwt/refresh/, /auth/jwt/me/ (Bearer)",
            "health": "/health",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
