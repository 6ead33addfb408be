use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::manager::DatabaseError;
use super::models::{NewUser, ProfileUpdate, SessionToken, User};

/// Persistence contract for identities and session tokens.
///
/// Every method is a single unit of work: implementations must make the
/// multi-step mutations (`create_user`, `replace_session`) atomic with respect
/// to concurrent callers.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Connectivity probe for `/health`.
    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    /// Insert an inactive identity. The very first identity in the store is
    /// created with staff and superuser flags set. Fails with
    /// [`DatabaseError::Conflict`] when the email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError>;

    async fn activate_user(&self, id: i64) -> Result<(), DatabaseError>;

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<User, DatabaseError>;

    /// Deactivate, flag deleted and move `email` into `deleted_email`.
    async fn soft_delete_user(&self, id: i64) -> Result<(), DatabaseError>;

    /// Delete every session owned by `user_id` and insert the new one, committed together.
    async fn replace_session(
        &self,
        user_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionToken, DatabaseError>;

    async fn find_session(&self, token: &str) -> Result<Option<SessionToken>, DatabaseError>;

    /// Idempotent.
    async fn delete_session(&self, token: &str) -> Result<(), DatabaseError>;

    /// Remove rows with `expires_at <= now`, returning how many were removed.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;
}
