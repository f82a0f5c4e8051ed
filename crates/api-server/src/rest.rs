//! Shared handler state, list envelope and operational endpoints.

use crate::error::ApiError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use shelfwise_cache::ResultCache;
use shelfwise_catalog::Catalog;
use shelfwise_core::{AppConfig, Recommendation, ShelfError};
use shelfwise_engine::{EngineStats, Recommender};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub catalog: Arc<RwLock<Arc<Catalog>>>,
    pub cache: Arc<ResultCache<Value>>,
    pub config: Arc<AppConfig>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, catalog: Catalog, recommender: Recommender) -> Self {
        Self {
            cache: Arc::new(ResultCache::from_config(&config.cache)),
            recommender: Arc::new(recommender),
            catalog: Arc::new(RwLock::new(Arc::new(catalog))),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().clone()
    }

    /// Clamp a requested result count into the configured bounds.
    pub fn k(&self, requested: Option<usize>) -> usize {
        self.config.engine.clamp_k(requested)
    }

    /// Serve `key` from the cache, or compute and cache it. Failures are
    /// returned as-is and never cached.
    pub fn cached<T, F>(&self, key: String, compute: F) -> Result<Json<Value>, ApiError>
    where
        T: Serialize,
        F: FnOnce() -> Result<T, ApiError>,
    {
        metrics::counter!("api.requests").increment(1);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Json(hit));
        }
        let value = serde_json::to_value(compute()?).map_err(ShelfError::from)?;
        self.cache.put(key, value.clone());
        Ok(Json(value))
    }
}

pub(crate) fn parse_user_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::invalid(format!(
            "user id must be a non-negative integer, got '{raw}'"
        ))
    })
}

/// Trimmed, non-empty free-text parameter.
pub(crate) fn required_text<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::invalid(format!("query parameter '{name}' is required"))),
    }
}

/// Envelope for every ranked list the API returns.
#[derive(Debug, Serialize)]
pub struct RecommendationList {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Recommendation>,
    pub total: usize,
    pub results: Vec<Recommendation>,
}

impl RecommendationList {
    pub fn new(method: impl Into<String>, results: Vec<Recommendation>) -> Self {
        Self {
            method: method.into(),
            query: None,
            reference: None,
            total: results.len(),
            results,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_reference(mut self, reference: Recommendation) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        generation: state.recommender.generation(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready: Ready once an engine snapshot has been published.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.recommender.generation() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live: Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /v1/stats: Sizes of the live engine snapshot.
pub async fn engine_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.recommender.snapshot();
    Json(StatsResponse {
        generation: state.recommender.generation(),
        cache_entries: state.cache.len(),
        engine: snapshot.stats(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub generation: u64,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub generation: u64,
    pub cache_entries: usize,
    pub engine: EngineStats,
}
