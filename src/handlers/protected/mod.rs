// handlers/protected/mod.rs - Handlers behind an authentication middleware
//
// Each route group is wrapped by the middleware for its scheme (Basic,
// session cookie or bearer token); handlers read the resolved identity
// from the `CurrentUser` extension and never see raw credentials.

pub mod auth;

pub use auth::*;
