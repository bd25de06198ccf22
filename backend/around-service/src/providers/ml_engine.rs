//! Google Cloud ML Engine `:predict` integration for image scoring
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gcp_auth::TokenProvider;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::MlConfig;
use crate::models::{ImageBytes, Instance, MlRequest, MlResponse};

/// Tracking key sent with every instance; the service echoes it back
const INSTANCE_KEY: &str = "1";

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("empty google response")]
    EmptyResponse,

    #[error("cannot parse prediction response: {body}")]
    MalformedResponse { body: String },

    #[error("prediction request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to obtain access token: {0}")]
    Credentials(String),
}

/// Anything that can turn image bytes into a single score.
#[async_trait]
pub trait ImageScorer: Send + Sync {
    async fn score(&self, image: &[u8]) -> Result<f64, PredictionError>;
}

/// Authentication mode for the prediction API
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Pre-issued bearer token, mostly for local runs
    StaticToken(String),
    /// Application Default Credentials (service account, workload identity)
    Adc,
}

pub struct MlEngineClient {
    client: Client,
    predict_url: String,
    scope: String,
    auth_mode: AuthMode,
    token_provider: Arc<RwLock<Option<Arc<dyn TokenProvider>>>>,
}

impl MlEngineClient {
    pub fn new(config: &MlConfig) -> Result<Self, PredictionError> {
        let auth_mode = match &config.access_token {
            Some(token) => AuthMode::StaticToken(token.clone()),
            None => AuthMode::Adc,
        };
        Self::with_auth_mode(config, auth_mode)
    }

    pub fn with_auth_mode(config: &MlConfig, auth_mode: AuthMode) -> Result<Self, PredictionError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            predict_url: config.predict_url(),
            scope: config.scope.clone(),
            auth_mode,
            token_provider: Arc::new(RwLock::new(None)),
        })
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }

    async fn token_provider(&self) -> Result<Arc<dyn TokenProvider>, PredictionError> {
        if let Some(provider) = self.token_provider.read().await.as_ref() {
            return Ok(Arc::clone(provider));
        }

        let mut guard = self.token_provider.write().await;
        if let Some(provider) = guard.as_ref() {
            return Ok(Arc::clone(provider));
        }

        let provider = gcp_auth::provider()
            .await
            .map_err(|e| PredictionError::Credentials(e.to_string()))?;
        *guard = Some(Arc::clone(&provider));
        Ok(provider)
    }

    async fn access_token(&self) -> Result<String, PredictionError> {
        match &self.auth_mode {
            AuthMode::StaticToken(token) => Ok(token.clone()),
            AuthMode::Adc => {
                let provider = self.token_provider().await?;
                let token = provider
                    .token(&[self.scope.as_str()])
                    .await
                    .map_err(|e| PredictionError::Credentials(e.to_string()))?;
                Ok(token.as_str().to_string())
            }
        }
    }
}

#[async_trait]
impl ImageScorer for MlEngineClient {
    async fn score(&self, image: &[u8]) -> Result<f64, PredictionError> {
        info!(image_bytes = image.len(), "Requesting image prediction");

        let request = MlRequest {
            instances: vec![Instance {
                image_bytes: ImageBytes {
                    b64: STANDARD.encode(image),
                },
                key: INSTANCE_KEY.to_string(),
            }],
        };

        let token = self.access_token().await?;
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.predict_url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Prediction request failed");
                PredictionError::Transport(e)
            })?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(
            status = %status,
            elapsed_ms = start.elapsed().as_millis(),
            body_len = body.len(),
            "Prediction response received"
        );

        // Error statuses carry a JSON error document, which fails the
        // prediction decode below and surfaces as MalformedResponse.
        if !status.is_success() {
            warn!(status = %status, "Prediction API returned an error status");
        }

        parse_prediction(&body)
    }
}

/// First score of the first prediction in a raw `:predict` response body.
pub fn parse_prediction(body: &[u8]) -> Result<f64, PredictionError> {
    if body.is_empty() {
        return Err(PredictionError::EmptyResponse);
    }

    let malformed = || PredictionError::MalformedResponse {
        body: String::from_utf8_lossy(body).into_owned(),
    };

    let response: MlResponse = serde_json::from_slice(body).map_err(|_| malformed())?;
    response
        .predictions
        .first()
        .and_then(|p| p.scores.first().copied())
        .ok_or_else(malformed)
}
