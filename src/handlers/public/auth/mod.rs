// handlers/public/auth/mod.rs - Registration and credential exchange

use serde::Deserialize;

pub mod jwt;
pub mod register;
pub mod session;

pub use jwt::{jwt_login_post, jwt_refresh_post};
pub use register::{register_post, register_verify_post};
pub use session::{session_login_post, session_logout_post};

/// `{email, password}` body shared by the session and JWT logins
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
