//! Opaque session tokens with a single-active-session policy.
//!
//! Tokens are stored as issued (not hashed), which is the established storage
//! contract for `user_sessions`. Expired rows are removed lazily when presented
//! or by the `reap-sessions` admin command.

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use tracing::{debug, info};

use super::failure::{live_identity, AuthFailure};
use crate::database::models::User;
use crate::database::{CredentialStore, DatabaseError};

pub const SESSION_COOKIE_NAME: &str = "session_id";

/// 32 random bytes: 256 bits of entropy.
const SESSION_TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct SessionIssuer {
    store: Arc<dyn CredentialStore>,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(store: Arc<dyn CredentialStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `user_id`, superseding every earlier session of that user.
    pub async fn issue(&self, user_id: i64) -> Result<String, DatabaseError> {
        let token = generate_session_token();
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.store
            .replace_session(user_id, &token, now, expires_at)
            .await?;
        info!("Issued session for user {}", user_id);
        Ok(token)
    }

    /// Missing and expired tokens are both `NotAuthenticated`; an expired row is deleted on sight.
    pub async fn resolve(&self, token: &str) -> Result<User, AuthFailure> {
        let session = self
            .store
            .find_session(token)
            .await?
            .ok_or(AuthFailure::NotAuthenticated)?;

        if session.is_expired_at(Utc::now()) {
            debug!("Session for user {} expired at {}", session.user_id, session.expires_at);
            self.store.delete_session(token).await?;
            return Err(AuthFailure::NotAuthenticated);
        }

        live_identity(self.store.find_user_by_id(session.user_id).await?)
    }

    pub async fn revoke(&self, token: &str) -> Result<(), DatabaseError> {
        self.store.delete_session(token).await
    }

    /// `Set-Cookie` value carrying `token` for the configured lifetime.
    pub fn cookie(&self, token: &str) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
        let max_age = self.ttl.num_seconds();
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE_NAME}={token}; HttpOnly; Max-Age={max_age}; Path=/; SameSite=Strict; Secure"
        ))
    }

    /// `Set-Cookie` value that expires the session cookie immediately.
    pub fn clear_cookie(&self) -> HeaderValue {
        HeaderValue::from_static("session_id=; HttpOnly; Max-Age=0; Path=/; SameSite=Strict; Secure")
    }
}

/// URL-safe random token, never padded.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Pull the session token out of the request's `Cookie` header(s).
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}
