// handlers/protected/auth/session.rs - GET /auth/session/profile/

use axum::{response::Json, Extension};

use crate::database::models::UserProfile;
use crate::middleware::CurrentUser;

pub async fn session_profile_get(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}
