use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use super::codes::{generate_confirmation_code, ConfirmationCodes};
use super::password::PasswordHasher;
use crate::database::models::{NewUser, User};
use crate::database::{CredentialStore, DatabaseError};
use crate::mail::{MailError, Mailer};

pub const CONFIRMATION_SUBJECT: &str = "Email confirmation";

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("User already exists")]
    AlreadyExists,

    #[error("Invalid code")]
    InvalidCode,

    #[error("User not found")]
    NotFound,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Could not send confirmation email: {0}")]
    Mail(#[from] MailError),

    #[error(transparent)]
    Store(DatabaseError),
}

impl From<DatabaseError> for RegistrationError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(_) => RegistrationError::AlreadyExists,
            DatabaseError::NotFound(_) => RegistrationError::NotFound,
            other => RegistrationError::Store(other),
        }
    }
}

/// Sign-up with emailed confirmation codes.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    codes: Arc<dyn ConfirmationCodes>,
    mailer: Arc<dyn Mailer>,
    code_ttl: Duration,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        codes: Arc<dyn ConfirmationCodes>,
        mailer: Arc<dyn Mailer>,
        code_ttl: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            codes,
            mailer,
            code_ttl,
        }
    }

    /// Email a confirmation code, then create the inactive identity.
    ///
    /// Nothing is stored when delivery fails, so the caller can simply retry.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, RegistrationError> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(RegistrationError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(RegistrationError::EmptyPassword);
        }
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(RegistrationError::AlreadyExists);
        }

        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| RegistrationError::Hash(e.to_string()))?;

        let code = generate_confirmation_code();
        self.codes.put(&code, email, self.code_ttl).await;

        let body = format!("Your confirmation code is {code}");
        if let Err(e) = self.mailer.send(email, CONFIRMATION_SUBJECT, &body).await {
            error!("Confirmation mail to {} failed: {}", email, e);
            self.codes.take(&code).await;
            return Err(e.into());
        }

        // A concurrent registration may have taken the address since the check above.
        let user = match self
            .store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(e) => {
                self.codes.take(&code).await;
                return Err(e.into());
            }
        };
        info!("Registered user {} (superuser: {})", user.id, user.is_superuser);

        Ok(user)
    }

    /// Consume `code` and activate the identity it was issued for.
    pub async fn confirm(&self, code: &str) -> Result<User, RegistrationError> {
        let Some(email) = self.codes.take(code).await else {
            warn!("Unknown or expired confirmation code presented");
            return Err(RegistrationError::InvalidCode);
        };

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(RegistrationError::NotFound)?;
        self.store.activate_user(user.id).await?;
        info!("Activated user {}", user.id);

        Ok(User {
            is_active: true,
            ..user
        })
    }
}

/// Shape check only: one `@`, non-empty local part, dotted domain, no whitespace.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .all(|label| !label.is_empty())
        && domain.contains('.')
}
