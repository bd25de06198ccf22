pub mod auth;
pub mod health;
pub mod posts;
pub mod predict;
pub mod search;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::AppError;

/// Decode a JSON body regardless of its declared content type.
fn decode_json<T: DeserializeOwned>(body: &[u8], message: &'static str) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "{}", message);
        AppError::BadRequest(message)
    })
}
