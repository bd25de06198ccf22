//! Permissive CORS: every response allows any origin, and preflight
//! requests are answered before reaching a handler.
use actix_web::{http::Method, middleware::DefaultHeaders, HttpRequest, HttpResponse};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Content-Type,Authorization";

/// Headers stamped on every response, errors included.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", ALLOW_ORIGIN))
        .add(("Access-Control-Allow-Headers", ALLOW_HEADERS))
}

/// Empty 200 for `OPTIONS` on a known route
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// Default service: `OPTIONS` on any path is a preflight, everything else 404.
pub async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        HttpResponse::Ok().finish()
    } else {
        HttpResponse::NotFound().finish()
    }
}
