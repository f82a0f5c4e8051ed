//! API server: REST router plus the Prometheus exporter.

use crate::recommend_rest;
use crate::rest::{self, AppState};
use crate::user_rest;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Every route the service exposes, with middleware applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Recommendations
        .route(
            "/v1/recommendations/users/:user_id",
            get(recommend_rest::user_recommendations),
        )
        .route(
            "/v1/recommendations/users/:user_id/hybrid",
            get(recommend_rest::user_hybrid_recommendations),
        )
        .route("/v1/recommendations/books", get(recommend_rest::books_by_title))
        .route(
            "/v1/recommendations/books/:isbn/similar",
            get(recommend_rest::similar_books),
        )
        .route("/v1/recommendations/popular", get(recommend_rest::popular_books))
        // Search
        .route("/v1/search", get(recommend_rest::search_titles))
        .route("/v1/search/quick", get(recommend_rest::quick_search))
        // Readers and catalog
        .route("/v1/users/stats", get(user_rest::catalog_statistics))
        .route("/v1/users/:user_id", get(user_rest::user_profile))
        .route("/v1/stats", get(rest::engine_stats))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let api = &self.state.config.api;
        let addr = SocketAddr::new(api.host.parse()?, api.http_port);
        let app = router(self.state.clone());

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let config = &self.state.config;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                config.api.host.parse()?,
                config.metrics.port,
            ))
            .install()?;

        info!(port = config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
