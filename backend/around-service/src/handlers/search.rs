use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{error, info};
use url::form_urlencoded;

use crate::error::{AppError, Result};
use crate::middleware::Caller;
use crate::models::{GeoQuery, SearchParams};
use crate::AppState;

pub async fn search(
    state: web::Data<AppState>,
    _caller: Caller,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let params = parse_search_params(req.query_string());
    let query = GeoQuery {
        lat: parse_coordinate(params.lat.as_deref()),
        lon: parse_coordinate(params.lon.as_deref()),
        distance: search_distance(params.range.as_deref(), &state.config.search.default_distance),
    };
    info!(lat = query.lat, lon = query.lon, distance = %query.distance, "Received one search request");

    let posts = state.posts.search_nearby(&query).await.map_err(|e| {
        error!(error = %e, "Failed to read post from Elasticsearch");
        AppError::store("Failed to read post from Elasticsearch", e)
    })?;

    info!(hits = posts.len(), "Search completed");
    Ok(HttpResponse::Ok().json(posts))
}

/// Query string to params. Never fails; the first value of a repeated key wins.
pub fn parse_search_params(query_string: &str) -> SearchParams {
    let mut params = SearchParams::default();
    for (key, value) in form_urlencoded::parse(query_string.as_bytes()) {
        let slot = match key.as_ref() {
            "lat" => &mut params.lat,
            "lon" => &mut params.lon,
            "range" => &mut params.range,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }
    params
}

/// Lenient coordinate parsing: anything missing or unparsable is 0.0.
pub fn parse_coordinate(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// `range` is a bare number of kilometres; empty means the configured default.
pub fn search_distance(range: Option<&str>, default: &str) -> String {
    match range.map(str::trim) {
        Some(r) if !r.is_empty() => format!("{}km", r),
        _ => default.to_string(),
    }
}
