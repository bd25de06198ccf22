pub mod auth;
pub mod cors;

pub use auth::Caller;
pub use cors::{cors_headers, fallback, preflight};
