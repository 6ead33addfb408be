// handlers/protected/auth/mod.rs - Identity and profile endpoints

pub mod basic;
pub mod jwt;
pub mod session;

pub use basic::{basic_login_post, basic_profile_delete, basic_profile_get, basic_profile_put};
pub use jwt::jwt_me_get;
pub use session::session_profile_get;
