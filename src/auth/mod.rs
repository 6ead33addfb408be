//! Credential verification and token lifecycles.

pub mod codes;
pub mod failure;
pub mod jwt;
pub mod password;
pub mod registration;
pub mod resolver;
pub mod session;

pub use codes::{generate_confirmation_code, ConfirmationCodes, MemoryConfirmationCodes};
pub use failure::AuthFailure;
pub use jwt::{Claims, JwtError, JwtIssuer, TokenPair};
pub use password::PasswordHasher;
pub use registration::{RegistrationError, RegistrationService};
pub use resolver::{IdentityResolver, Presentation};
pub use session::{extract_session_token, SessionIssuer, SESSION_COOKIE_NAME};
