use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tracing::debug;

use super::failure::{live_identity, AuthFailure};
use super::jwt::JwtIssuer;
use super::password::PasswordHasher;
use super::session::{extract_session_token, SessionIssuer};
use crate::database::models::User;
use crate::database::CredentialStore;

/// A credential as it arrived on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Basic { email: String, password: String },
    Session { token: String },
    Bearer { token: String },
}

impl Presentation {
    /// `Authorization: Basic base64(email:password)`
    pub fn basic_from_headers(headers: &HeaderMap) -> Result<Self, AuthFailure> {
        let encoded = authorization_param(headers, "Basic")?;
        let decoded = STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(AuthFailure::NotAuthenticated)?;
        let (email, password) = decoded
            .split_once(':')
            .ok_or(AuthFailure::NotAuthenticated)?;
        Ok(Presentation::Basic {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn session_from_headers(headers: &HeaderMap) -> Result<Self, AuthFailure> {
        extract_session_token(headers)
            .map(|token| Presentation::Session { token })
            .ok_or(AuthFailure::NotAuthenticated)
    }

    /// `Authorization: Bearer <jwt>`
    pub fn bearer_from_headers(headers: &HeaderMap) -> Result<Self, AuthFailure> {
        let token = authorization_param(headers, "Bearer")?;
        Ok(Presentation::Bearer {
            token: token.to_string(),
        })
    }

    fn scheme(&self) -> &'static str {
        match self {
            Presentation::Basic { .. } => "basic",
            Presentation::Session { .. } => "session",
            Presentation::Bearer { .. } => "bearer",
        }
    }
}

/// Case-insensitive scheme match; an absent header, another scheme or an
/// empty parameter are all `NotAuthenticated`.
fn authorization_param<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, AuthFailure> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthFailure::NotAuthenticated)?;
    let (given, param) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthFailure::NotAuthenticated)?;
    let param = param.trim();
    if !given.eq_ignore_ascii_case(scheme) || param.is_empty() {
        return Err(AuthFailure::NotAuthenticated);
    }
    Ok(param)
}

/// Turns any supported presentation into a live identity.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    sessions: SessionIssuer,
    jwt: JwtIssuer,
}

impl IdentityResolver {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        sessions: SessionIssuer,
        jwt: JwtIssuer,
    ) -> Self {
        Self {
            store,
            hasher,
            sessions,
            jwt,
        }
    }

    pub async fn resolve(&self, presentation: Presentation) -> Result<User, AuthFailure> {
        let scheme = presentation.scheme();
        let result = match presentation {
            Presentation::Basic { email, password } => self.resolve_basic(&email, &password).await,
            Presentation::Session { token } => self.sessions.resolve(&token).await,
            Presentation::Bearer { token } => self.resolve_bearer(&token).await,
        };
        if let Err(failure) = &result {
            debug!("{} authentication failed: {}", scheme, failure);
        }
        result
    }

    async fn resolve_basic(&self, email: &str, password: &str) -> Result<User, AuthFailure> {
        let user = live_identity(self.store.find_user_by_email(email).await?)?;
        if !self.hasher.verify(password, &user.password_hash) {
            return Err(AuthFailure::InvalidCredentials);
        }
        Ok(user)
    }

    async fn resolve_bearer(&self, token: &str) -> Result<User, AuthFailure> {
        let user_id = self.jwt.verify(token)?.user_id()?;
        live_identity(self.store.find_user_by_id(user_id).await?)
    }
}
