// handlers/protected/auth/jwt.rs - GET /auth/jwt/me/

use axum::{response::Json, Extension};

use crate::database::models::UserProfile;
use crate::middleware::CurrentUser;

/// Identity behind the bearer access token
pub async fn jwt_me_get(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}
