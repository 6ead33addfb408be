// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Registration and credential exchange: these endpoints accept raw
// credentials in the body or path and hand out sessions or tokens.

pub mod auth;

pub use auth::*;
