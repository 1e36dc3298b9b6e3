//! Authentication: password hashing, session tokens, and the request gate.

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{require_session, Authenticated};
pub use password::PasswordHasher;
pub use token::{IssueError, IssuedToken, TokenCodec, TokenError};
