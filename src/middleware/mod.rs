pub mod auth;
pub mod json;

pub use auth::{basic_auth_middleware, jwt_auth_middleware, session_auth_middleware, CurrentUser};
pub use json::ApiJson;
