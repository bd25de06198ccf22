/// Around Service - HTTP Server
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use around_service::elasticsearch::ElasticsearchClient;
use around_service::providers::MlEngineClient;
use around_service::{configure, middleware, AppState, Config};
use crypto_core::TokenIssuer;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "around_service=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting around-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store = ElasticsearchClient::new(&config.elasticsearch, &config.search)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, url = %config.elasticsearch.url, "Elasticsearch bootstrap failed");
            e
        })
        .context("Failed to initialize Elasticsearch")?;
    let store = Arc::new(store);
    tracing::info!(
        post_index = %config.elasticsearch.post_index,
        user_index = %config.elasticsearch.user_index,
        "Elasticsearch indices ready"
    );

    let scorer = MlEngineClient::new(&config.ml).context("Failed to build ML client")?;
    tracing::info!(url = %scorer.predict_url(), "ML prediction client ready");

    let tokens = TokenIssuer::new(config.auth.jwt_secret.as_bytes(), config.auth.token_ttl_hours)
        .context("Failed to initialize token issuer")?;
    if config.auth.required {
        tracing::info!("Bearer token required on /post, /search and /predict");
    }

    let bind_address = config.app.bind_address();
    let state = web::Data::new(AppState {
        posts: store.clone(),
        users: store,
        scorer: Arc::new(scorer),
        tokens,
        config,
    });

    tracing::info!("Starting HTTP server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::cors_headers())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
