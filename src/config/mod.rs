use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Secret used by the development preset. Refused in production.
pub const DEVELOPMENT_SECRET: &str = "development-secret-change-me";

const SUPPORTED_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

// Upper bounds keep expiry arithmetic well inside chrono's range.
const MAX_ACCESS_MINUTES: i64 = 60 * 24 * 365;
const MAX_TTL_DAYS: i64 = 3650;
const MAX_CODE_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub session_id_expire_days: i64,
    pub confirmation_code_ttl_secs: u64,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub email_address: String,
    #[serde(skip_serializing)]
    pub email_password: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SECRET_KEY must be set")]
    MissingSecret,

    #[error("SECRET_KEY uses the development default in production")]
    DevelopmentSecretInProduction,

    #[error("unsupported signing algorithm '{0}', expected one of HS256, HS384, HS512")]
    UnsupportedAlgorithm(String),

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("{0} is larger than {1}")]
    TooLarge(&'static str, u64),

    #[error("SECURITY_CORS_ORIGINS may not contain '*' outside development")]
    WildcardCorsOrigin,
}

impl SecurityConfig {
    // Clamped to the validated bounds so an unvalidated config cannot overflow chrono.
    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expire_minutes.clamp(0, MAX_ACCESS_MINUTES))
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_token_expire_days.clamp(0, MAX_TTL_DAYS))
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_id_expire_days.clamp(0, MAX_TTL_DAYS))
    }

    pub fn code_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.confirmation_code_ttl_secs.min(MAX_CODE_TTL_SECS))
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("NEWS_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("LOG_LEVEL") {
            self.server.log_level = v.to_lowercase();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(normalize_database_url(&v));
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("SECRET_KEY") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("ALGORITHM") {
            self.security.jwt_algorithm = v.trim().to_uppercase();
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.security.access_token_expire_minutes =
                v.parse().unwrap_or(self.security.access_token_expire_minutes);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_EXPIRE_DAYS") {
            self.security.refresh_token_expire_days =
                v.parse().unwrap_or(self.security.refresh_token_expire_days);
        }
        if let Ok(v) = env::var("SESSION_ID_EXPIRE_DAYS") {
            self.security.session_id_expire_days =
                v.parse().unwrap_or(self.security.session_id_expire_days);
        }
        if let Ok(v) = env::var("CONFIRMATION_CODE_TTL_SECS") {
            self.security.confirmation_code_ttl_secs =
                v.parse().unwrap_or(self.security.confirmation_code_ttl_secs);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Mail overrides
        if let Ok(v) = env::var("SMTP_SERVER") {
            self.mail.smtp_server = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.mail.smtp_port = v.parse().unwrap_or(self.mail.smtp_port);
        }
        if let Ok(v) = env::var("EMAIL_ADDRESS") {
            self.mail.email_address = v;
        }
        if let Ok(v) = env::var("EMAIL_PASSWORD") {
            self.mail.email_password = v;
        }

        self
    }

    /// Reject settings the auth core cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let security = &self.security;
        if security.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.environment == Environment::Production && security.jwt_secret == DEVELOPMENT_SECRET {
            return Err(ConfigError::DevelopmentSecretInProduction);
        }
        if !SUPPORTED_ALGORITHMS.contains(&security.jwt_algorithm.as_str()) {
            return Err(ConfigError::UnsupportedAlgorithm(security.jwt_algorithm.clone()));
        }
        if security.access_token_expire_minutes <= 0 {
            return Err(ConfigError::NonPositive("ACCESS_TOKEN_EXPIRE_MINUTES"));
        }
        if security.refresh_token_expire_days <= 0 {
            return Err(ConfigError::NonPositive("REFRESH_TOKEN_EXPIRE_DAYS"));
        }
        if security.session_id_expire_days <= 0 {
            return Err(ConfigError::NonPositive("SESSION_ID_EXPIRE_DAYS"));
        }
        if security.confirmation_code_ttl_secs == 0 {
            return Err(ConfigError::NonPositive("CONFIRMATION_CODE_TTL_SECS"));
        }
        if security.access_token_expire_minutes > MAX_ACCESS_MINUTES {
            return Err(ConfigError::TooLarge("ACCESS_TOKEN_EXPIRE_MINUTES", MAX_ACCESS_MINUTES as u64));
        }
        if security.refresh_token_expire_days > MAX_TTL_DAYS {
            return Err(ConfigError::TooLarge("REFRESH_TOKEN_EXPIRE_DAYS", MAX_TTL_DAYS as u64));
        }
        if security.session_id_expire_days > MAX_TTL_DAYS {
            return Err(ConfigError::TooLarge("SESSION_ID_EXPIRE_DAYS", MAX_TTL_DAYS as u64));
        }
        if security.confirmation_code_ttl_secs > MAX_CODE_TTL_SECS {
            return Err(ConfigError::TooLarge("CONFIRMATION_CODE_TTL_SECS", MAX_CODE_TTL_SECS));
        }
        // tower-http cannot pair a wildcard origin with credentialed requests.
        if !self.is_development() && security.cors_origins.iter().any(|o| o.trim() == "*") {
            return Err(ConfigError::WildcardCorsOrigin);
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8000,
                log_level: "debug".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_SECRET.to_string(),
                jwt_algorithm: "HS256".to_string(),
                access_token_expire_minutes: 30,
                refresh_token_expire_days: 7,
                session_id_expire_days: 7,
                confirmation_code_ttl_secs: 120,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            mail: MailConfig {
                smtp_server: None,
                smtp_port: 587,
                email_address: "noreply@localhost".to_string(),
                email_password: String::new(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8000,
                log_level: "info".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: "HS256".to_string(),
                access_token_expire_minutes: 30,
                refresh_token_expire_days: 7,
                session_id_expire_days: 7,
                confirmation_code_ttl_secs: 120,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            mail: MailConfig {
                smtp_server: None,
                smtp_port: 587,
                email_address: String::new(),
                email_password: String::new(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8000,
                log_level: "info".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: "HS256".to_string(),
                access_token_expire_minutes: 15,
                refresh_token_expire_days: 7,
                session_id_expire_days: 3,
                confirmation_code_ttl_secs: 120,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            mail: MailConfig {
                smtp_server: None,
                smtp_port: 587,
                email_address: String::new(),
                email_password: String::new(),
            },
        }
    }
}

/// Existing deployment URLs carry an asyncpg driver prefix; sqlx wants plain postgres URLs.
fn normalize_database_url(url: &str) -> String {
    url.replacen("postgresql+asyncpg://", "postgresql://", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.is_development());
        assert_eq!(config.security.jwt_algorithm, "HS256");
        assert_eq!(config.security.confirmation_code_ttl_secs, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config_requires_secret() {
        let config = AppConfig::production();
        assert_eq!(config.validate(), Err(ConfigError::MissingSecret));
    }

    #[test]
    fn production_refuses_development_secret() {
        let mut config = AppConfig::production();
        config.security.jwt_secret = DEVELOPMENT_SECRET.to_string();
        assert_eq!(config.validate(), Err(ConfigError::DevelopmentSecretInProduction));
    }

    #[test]
    fn rejects_asymmetric_algorithm() {
        let mut config = AppConfig::development();
        config.security.jwt_algorithm = "RS256".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnsupportedAlgorithm("RS256".to_string()))
        );
    }

    #[test]
    fn rejects_non_positive_session_ttl() {
        let mut config = AppConfig::development();
        config.security.session_id_expire_days = 0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositive("SESSION_ID_EXPIRE_DAYS")));
    }

    #[test]
    fn rejects_ttls_beyond_bounds() {
        let mut config = AppConfig::development();
        config.security.session_id_expire_days = 200_000_000;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooLarge("SESSION_ID_EXPIRE_DAYS", 3650))
        );

        let mut config = AppConfig::development();
        config.security.access_token_expire_minutes = i64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::TooLarge("ACCESS_TOKEN_EXPIRE_MINUTES", _))));

        let mut config = AppConfig::development();
        config.security.confirmation_code_ttl_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::TooLarge("CONFIRMATION_CODE_TTL_SECS", _))));
    }

    #[test]
    fn ttl_helpers_clamp_unvalidated_values() {
        let mut config = AppConfig::development();
        config.security.session_id_expire_days = 200_000_000;
        config.security.access_token_expire_minutes = i64::MAX;
        config.security.refresh_token_expire_days = i64::MAX;
        assert_eq!(config.security.session_ttl().num_days(), 3650);
        assert_eq!(config.security.refresh_ttl().num_days(), 3650);
        assert_eq!(config.security.access_ttl().num_minutes(), 60 * 24 * 365);
    }

    #[test]
    fn wildcard_cors_origin_is_refused_outside_development() {
        let mut config = AppConfig::production();
        config.security.jwt_secret = "a-real-secret".to_string();
        config.security.cors_origins = vec!["*".to_string()];
        assert_eq!(config.validate(), Err(ConfigError::WildcardCorsOrigin));

        let mut config = AppConfig::development();
        config.security.cors_origins = vec!["*".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn session_ttl_converts_days() {
        let config = AppConfig::development();
        assert_eq!(config.security.session_ttl().num_seconds(), 7 * 24 * 60 * 60);
    }

    #[test]
    fn rewrites_asyncpg_scheme() {
        assert_eq!(
            normalize_database_url("postgresql+asyncpg://u:p@db:5432/news"),
            "postgresql://u:p@db:5432/news"
        );
        assert_eq!(normalize_database_url("postgres://db/news"), "postgres://db/news");
    }
}
