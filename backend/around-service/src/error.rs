/// Error types for around-service
///
/// Every handler failure ends up here and is rendered as the shared JSON
/// `ErrorResponse`. The `Display` output is meant for logs and may include
/// upstream detail; clients only see [`AppError::client_message`].
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::JwtError;
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use thiserror::Error;

use crate::providers::PredictionError;
use crate::repository::StoreError;

/// Result type for around-service handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Body or query could not be decoded
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Invalid username or password")]
    InvalidUsername,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[source] JwtError),

    /// Search backend failure; `message` is what the client sees
    #[error("{message}: {source}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("Failed to generate token: {0}")]
    TokenGeneration(#[source] JwtError),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn store(message: &'static str, source: StoreError) -> Self {
        AppError::Store { message, source }
    }

    /// Message safe to return to clients
    pub fn client_message(&self) -> String {
        match self {
            AppError::Store { message, .. } => (*message).to_string(),
            AppError::InvalidToken(_) => "Invalid or expired token".to_string(),
            AppError::TokenGeneration(_) => "Failed to generate token".to_string(),
            AppError::Prediction(PredictionError::EmptyResponse) => {
                "Prediction service returned an empty response".to_string()
            }
            AppError::Prediction(PredictionError::MalformedResponse { .. }) => {
                "Prediction service returned an unexpected response".to_string()
            }
            AppError::Prediction(PredictionError::Transport(_)) => {
                "Prediction service unavailable".to_string()
            }
            AppError::Prediction(PredictionError::Credentials(_)) => {
                "Failed to authenticate with prediction service".to_string()
            }
            AppError::ServiceUnavailable(_) => "Service unavailable".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn kind_and_code(&self) -> (&'static str, &'static str) {
        match self {
            AppError::BadRequest(_) => (kinds::VALIDATION_ERROR, error_codes::INVALID_REQUEST),
            AppError::InvalidUsername => (kinds::VALIDATION_ERROR, error_codes::USERNAME_INVALID),
            AppError::UserAlreadyExists => (kinds::CONFLICT_ERROR, error_codes::USER_ALREADY_EXISTS),
            AppError::InvalidCredentials => {
                (kinds::AUTHENTICATION_ERROR, error_codes::INVALID_CREDENTIALS)
            }
            AppError::MissingToken => (kinds::AUTHENTICATION_ERROR, error_codes::TOKEN_MISSING),
            AppError::InvalidToken(_) => (kinds::AUTHENTICATION_ERROR, error_codes::TOKEN_INVALID),
            AppError::Store { .. } => (kinds::SERVER_ERROR, error_codes::SEARCH_BACKEND_ERROR),
            AppError::Prediction(err) => match err {
                PredictionError::EmptyResponse => {
                    (kinds::UPSTREAM_ERROR, error_codes::PREDICTION_EMPTY_RESPONSE)
                }
                PredictionError::MalformedResponse { .. } => {
                    (kinds::UPSTREAM_ERROR, error_codes::PREDICTION_MALFORMED_RESPONSE)
                }
                PredictionError::Transport(_) => {
                    (kinds::UPSTREAM_ERROR, error_codes::PREDICTION_UNAVAILABLE)
                }
                PredictionError::Credentials(_) => {
                    (kinds::SERVER_ERROR, error_codes::INTERNAL_SERVER_ERROR)
                }
            },
            AppError::TokenGeneration(_) => {
                (kinds::SERVER_ERROR, error_codes::TOKEN_GENERATION_FAILED)
            }
            AppError::ServiceUnavailable(_) => (
                kinds::SERVICE_UNAVAILABLE_ERROR,
                error_codes::SERVICE_UNAVAILABLE,
            ),
            AppError::Internal(_) => (kinds::SERVER_ERROR, error_codes::INTERNAL_SERVER_ERROR),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidUsername | AppError::UserAlreadyExists => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidCredentials | AppError::MissingToken | AppError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Store { .. } | AppError::TokenGeneration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Prediction(PredictionError::Credentials(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Prediction(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_type, code) = self.kind_and_code();

        let mut response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            &self.client_message(),
            status.as_u16(),
            error_type,
            code,
        );

        if let AppError::Prediction(PredictionError::MalformedResponse { body }) = self {
            response = response.with_details(body.clone());
        }

        HttpResponse::build(status).json(response)
    }
}
