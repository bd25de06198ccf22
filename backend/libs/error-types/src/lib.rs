use serde::{Deserialize, Serialize};

/// Unified API error body returned by every Around endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short HTTP reason phrase ("Bad Request", "Unauthorized", ...)
    pub error: String,

    /// Human readable message, safe to show to clients
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Coarse error category, one of the constants in [`error_types`]
    pub error_type: String,

    /// Stable machine-readable code, one of the constants in [`error_codes`]
    pub code: String,

    /// Extra diagnostic information (e.g. raw upstream body)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

/// Standard error codes
pub mod error_codes {
    // Request decoding / validation
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const USERNAME_INVALID: &str = "USERNAME_INVALID";

    // Users / authentication
    pub const USER_ALREADY_EXISTS: &str = "USER_ALREADY_EXISTS";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
    pub const TOKEN_MISSING: &str = "TOKEN_MISSING";
    pub const TOKEN_GENERATION_FAILED: &str = "TOKEN_GENERATION_FAILED";

    // Search backend
    pub const SEARCH_BACKEND_ERROR: &str = "SEARCH_BACKEND_ERROR";

    // Prediction upstream
    pub const PREDICTION_EMPTY_RESPONSE: &str = "PREDICTION_EMPTY_RESPONSE";
    pub const PREDICTION_MALFORMED_RESPONSE: &str = "PREDICTION_MALFORMED_RESPONSE";
    pub const PREDICTION_UNAVAILABLE: &str = "PREDICTION_UNAVAILABLE";

    // System
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
}

/// Standard error types
pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const CONFLICT_ERROR: &str = "conflict_error";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const SERVER_ERROR: &str = "server_error";
    pub const SERVICE_UNAVAILABLE_ERROR: &str = "service_unavailable_error";
}
