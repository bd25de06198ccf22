//! Around Service
//!
//! Geo-tagged posts with radius search, image scoring through a hosted ML
//! model, and username/password accounts issuing signed tokens.

pub mod config;
pub mod elasticsearch;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod repository;

use actix_web::{http::Method, web};
use crypto_core::TokenIssuer;
use std::sync::Arc;

pub use config::Config;
pub use error::{AppError, Result};

use providers::ImageScorer;
use repository::{PostRepository, UserRepository};

/// Upper bound on request bodies; uploads to `/predict` are whole images.
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared handler state, built once at startup.
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    pub scorer: Arc<dyn ImageScorer>,
    pub tokens: TokenIssuer,
    pub config: Config,
}

/// Route table. Every route also answers `OPTIONS` as a CORS preflight.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
        .service(
            web::resource("/post")
                .route(web::post().to(handlers::posts::create_post))
                .route(web::method(Method::OPTIONS).to(middleware::preflight)),
        )
        .service(
            web::resource("/search")
                .route(web::get().to(handlers::search::search))
                .route(web::method(Method::OPTIONS).to(middleware::preflight)),
        )
        .service(
            web::resource("/predict")
                .route(web::post().to(handlers::predict::predict))
                .route(web::method(Method::OPTIONS).to(middleware::preflight)),
        )
        .service(
            web::resource("/login")
                .route(web::post().to(handlers::auth::login))
                .route(web::method(Method::OPTIONS).to(middleware::preflight)),
        )
        .service(
            web::resource("/signup")
                .route(web::post().to(handlers::auth::signup))
                .route(web::method(Method::OPTIONS).to(middleware::preflight)),
        )
        .route("/health", web::get().to(handlers::health::health))
        .route("/health/ready", web::get().to(handlers::health::ready))
        .default_service(web::to(middleware::fallback));
}
