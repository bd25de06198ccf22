use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::AppState;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Ready once the search backend answers a ping.
pub async fn ready(state: web::Data<AppState>) -> Result<HttpResponse> {
    state.posts.ping().await.map_err(|e| {
        warn!(error = %e, "Readiness check failed");
        AppError::ServiceUnavailable(e.to_string())
    })?;

    Ok(HttpResponse::Ok().json(json!({ "status": "ready" })))
}
