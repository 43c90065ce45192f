pub mod password;
pub mod session;

pub use password::{generate_token, hash_password, hash_token, verify_password};
pub use session::{CurrentUser, SessionStore};
