use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Row from `user_sessions`. The token column holds the raw cookie value.
#[derive(Debug, Clone, FromRow)]
pub struct SessionToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// Live only while `now < expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
