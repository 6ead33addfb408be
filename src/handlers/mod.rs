// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth)  → registration, logins, refresh, logout
// Protected         → profile endpoints behind Basic, session or bearer middleware

pub mod public;
pub mod protected;

pub use protected::*;
pub use public::*;
