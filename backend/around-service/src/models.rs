//! Request, storage and upstream payload types.
//!
//! Missing or `null` JSON fields decode to their zero values; clients are
//! allowed to send partial documents.
use serde::{Deserialize, Deserializer, Serialize};

/// `null` decodes like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "null_as_default")]
    pub lat: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub lon: f64,
}

/// A geo-tagged message. Stored as-is in the post index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    #[serde(deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: Location,
}

/// User document, keyed by `username` in the user index.
///
/// `password` holds an Argon2 PHC hash once stored; on the wire (signup and
/// login bodies) it is the plaintext the client typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(deserialize_with = "null_as_default")]
    pub age: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub gender: String,
}

// ============================================
// Search
// ============================================

/// Raw `/search` query values; numbers are parsed leniently by the handler.
#[derive(Debug, Default)]
pub struct SearchParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub range: Option<String>,
}

/// Radius query against the post index
#[derive(Debug, Clone, PartialEq)]
pub struct GeoQuery {
    pub lat: f64,
    pub lon: f64,
    /// Elasticsearch distance string, e.g. "200km"
    pub distance: String,
}

// ============================================
// ML prediction API
// ============================================

#[derive(Debug, Serialize)]
pub struct MlRequest {
    pub instances: Vec<Instance>,
}

#[derive(Debug, Serialize)]
pub struct Instance {
    pub image_bytes: ImageBytes,
    /// Opaque tracking key echoed back by the ML service
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct ImageBytes {
    /// Base64 (standard alphabet) of the uploaded image
    pub b64: String,
}

#[derive(Debug, Deserialize)]
pub struct MlResponse {
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub prediction: i64,
    #[serde(default)]
    pub key: String,
    pub scores: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub score: f64,
}
