use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identity row from the `user` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub posts_count: i64,
    pub posts_read_count: i64,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_deleted: bool,
    pub deleted_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registration. Privilege flags are decided by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.bio.is_none()
    }
}

/// Public view of an identity returned by profile endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub posts_count: i64,
    pub posts_read_count: i64,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_deleted: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            posts_count: user.posts_count,
            posts_read_count: user.posts_read_count,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            is_deleted: user.is_deleted,
        }
    }
}
