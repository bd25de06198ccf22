//! Credential primitives shared by Around services.
//!
//! - [`jwt`]: HS256 signed tokens carrying a username and an expiry
//! - [`password`]: Argon2id password hashing

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtError, TokenIssuer};
pub use password::{hash_password, verify_password, PasswordError};
