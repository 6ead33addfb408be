pub mod session;
pub mod user;

pub use session::SessionToken;
pub use user::{NewUser, ProfileUpdate, User, UserProfile};
