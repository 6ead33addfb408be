use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::failure::AuthFailure;
use crate::config::SecurityConfig;

/// Claims carried by both access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id as a decimal string
    pub sub: String,
    /// Expiry, unix seconds
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthFailure> {
        self.sub.parse().map_err(|_| AuthFailure::InvalidToken)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Unsupported JWT algorithm '{0}'")]
    UnsupportedAlgorithm(String),
}

/// Issues and verifies HMAC-signed, time-boxed tokens.
#[derive(Clone)]
pub struct JwtIssuer {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtIssuer {
    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(
            &security.jwt_secret,
            &security.jwt_algorithm,
            security.access_ttl(),
            security.refresh_ttl(),
        )
    }

    pub fn new(
        secret: &str,
        algorithm: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        let algorithm = Algorithm::from_str(algorithm)
            .ok()
            .filter(|a| matches!(a, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512))
            .ok_or_else(|| JwtError::UnsupportedAlgorithm(algorithm.to_string()))?;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn issue_pair(&self, user_id: i64) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, self.access_ttl)?,
            refresh_token: self.sign(user_id, self.refresh_ttl)?,
        })
    }

    /// Access token alone, minted by the refresh flow.
    pub fn issue_access_only(&self, user_id: i64) -> Result<String, JwtError> {
        self.sign(user_id, self.access_ttl)
    }

    /// Check signature, structure and expiry.
    ///
    /// Expiry is `exp < now` with zero leeway. Expired tokens with a valid
    /// signature fail as `TokenExpired`; anything else as `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthFailure> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthFailure::TokenExpired,
                _ => AuthFailure::InvalidToken,
            })
    }

    fn sign(&self, user_id: i64, ttl: Duration) -> Result<String, JwtError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| JwtError::TokenGeneration("token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(access: Duration, refresh: Duration) -> JwtIssuer {
        JwtIssuer::new("test-secret", "HS256", access, refresh).unwrap()
    }

    #[test]
    fn pair_verifies_immediately() {
        let jwt = issuer(Duration::minutes(30), Duration::days(7));
        let pair = jwt.issue_pair(42).unwrap();

        let access = jwt.verify(&pair.access_token).unwrap();
        let refresh = jwt.verify(&pair.refresh_token).unwrap();
        assert_eq!(access.sub, "42");
        assert_eq!(refresh.user_id().unwrap(), 42);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn expired_token_is_distinguished() {
        let jwt = issuer(Duration::seconds(-5), Duration::days(7));
        let token = jwt.issue_access_only(7).unwrap();
        assert!(matches!(jwt.verify(&token), Err(AuthFailure::TokenExpired)));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let ours = issuer(Duration::minutes(30), Duration::days(7));
        let theirs = JwtIssuer::new("other-secret", "HS256", Duration::minutes(30), Duration::days(7)).unwrap();
        let token = theirs.issue_access_only(7).unwrap();
        assert!(matches!(ours.verify(&token), Err(AuthFailure::InvalidToken)));
    }

    #[test]
    fn expired_foreign_token_is_invalid_not_expired() {
        let ours = issuer(Duration::minutes(30), Duration::days(7));
        let theirs = JwtIssuer::new("other-secret", "HS256", Duration::seconds(-5), Duration::days(7)).unwrap();
        let token = theirs.issue_access_only(7).unwrap();
        assert!(matches!(ours.verify(&token), Err(AuthFailure::InvalidToken)));
    }

    #[test]
    fn algorithm_must_match() {
        let hs256 = issuer(Duration::minutes(30), Duration::days(7));
        let hs512 = JwtIssuer::new("test-secret", "HS512", Duration::minutes(30), Duration::days(7)).unwrap();
        let token = hs512.issue_access_only(1).unwrap();
        assert!(matches!(hs256.verify(&token), Err(AuthFailure::InvalidToken)));
    }

    #[test]
    fn garbage_is_invalid() {
        let jwt = issuer(Duration::minutes(30), Duration::days(7));
        assert!(matches!(jwt.verify("not.a.jwt"), Err(AuthFailure::InvalidToken)));
        assert!(matches!(jwt.verify(""), Err(AuthFailure::InvalidToken)));
    }

    #[test]
    fn rejects_bad_setup() {
        assert!(matches!(
            JwtIssuer::new("", "HS256", Duration::minutes(1), Duration::days(1)),
            Err(JwtError::InvalidSecret)
        ));
        assert!(matches!(
            JwtIssuer::new("s", "RS256", Duration::minutes(1), Duration::days(1)),
            Err(JwtError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn lifetime_beyond_calendar_is_an_error() {
        let jwt = issuer(Duration::milliseconds(i64::MAX), Duration::days(1));
        assert!(matches!(jwt.issue_pair(1), Err(JwtError::TokenGeneration(_))));
    }

    #[test]
    fn non_numeric_subject_is_invalid() {
        let claims = Claims {
            sub: "abc".to_string(),
            exp: 0,
        };
        assert!(matches!(claims.user_id(), Err(AuthFailure::InvalidToken)));
    }
}
