use actix_web::{web, HttpResponse};
use tracing::{error, info};

use crate::error::Result;
use crate::middleware::Caller;
use crate::models::PredictResponse;
use crate::providers::PredictionError;
use crate::AppState;

/// Score the uploaded image bytes with the configured ML model.
pub async fn predict(
    state: web::Data<AppState>,
    _caller: Caller,
    body: web::Bytes,
) -> Result<HttpResponse> {
    info!(image_bytes = body.len(), "Received one predict request");

    let score = state.scorer.score(&body).await.map_err(|e| {
        match &e {
            PredictionError::MalformedResponse { body } => {
                error!(response_body = %body, "Prediction response could not be used")
            }
            other => error!(error = %other, "Prediction failed"),
        }
        e
    })?;

    info!(score, "Prediction received");
    Ok(HttpResponse::Ok().json(PredictResponse { score }))
}
