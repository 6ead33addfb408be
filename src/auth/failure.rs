use thiserror::Error;

use crate::database::models::User;
use crate::database::DatabaseError;

/// Why a credential presentation did not yield an identity.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    /// The credential store failed; not an authentication outcome.
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Shared liveness gate for every authentication path: absent and
/// soft-deleted identities are both `NotFound`.
pub(crate) fn live_identity(user: Option<User>) -> Result<User, AuthFailure> {
    match user {
        Some(user) if !user.is_deleted => Ok(user),
        _ => Err(AuthFailure::NotFound),
    }
}
