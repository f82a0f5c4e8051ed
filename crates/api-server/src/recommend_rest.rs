//! Recommendation and title search endpoints.

use crate::error::ApiError;
use crate::rest::{parse_user_id, required_text, AppState, RecommendationList};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use shelfwise_cache::CacheKey;
use shelfwise_core::MatchMethod;
use shelfwise_engine::{HybridWeights, SearchMethod};
use std::str::FromStr;
use tracing::debug;

/// Result count of `/v1/search/quick`.
const QUICK_SEARCH_K: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct CountQuery {
    pub k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HybridQuery {
    pub k: Option<usize>,
    pub weight_cf: Option<f64>,
    pub weight_cb: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
    pub k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub method: Option<String>,
    pub k: Option<usize>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuickSearchQuery {
    pub q: Option<String>,
}

fn weight(name: &str, value: Option<f64>, default: f64) -> Result<f64, ApiError> {
    match value {
        None => Ok(default),
        Some(w) if w.is_finite() && w >= 0.0 => Ok(w),
        Some(w) => Err(ApiError::invalid(format!(
            "{name} must be a non-negative number, got {w}"
        ))),
    }
}

/// GET /v1/recommendations/users/:user_id: Collaborative recommendations.
pub async fn user_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let k = state.k(query.k);
    let key = CacheKey::new("collaborative")
        .arg(state.recommender.generation())
        .arg(user_id)
        .arg(k)
        .build();

    state.cached(key, || {
        let results = state.recommender.snapshot().recommend_collaborative(user_id, k)?;
        Ok(RecommendationList::new(MatchMethod::Collaborative.as_str(), results))
    })
}

/// GET /v1/recommendations/users/:user_id/hybrid: Weighted CF + content blend.
pub async fn user_hybrid_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HybridQuery>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let k = state.k(query.k);
    let engine = &state.config.engine;
    let weights = HybridWeights {
        collaborative: weight("weight_cf", query.weight_cf, engine.weight_cf)?,
        content: weight("weight_cb", query.weight_cb, engine.weight_cb)?,
    };
    let key = CacheKey::new("hybrid")
        .arg(state.recommender.generation())
        .arg(user_id)
        .arg(k)
        .arg(weights.collaborative)
        .arg(weights.content)
        .build();

    state.cached(key, || {
        let results = state
            .recommender
            .snapshot()
            .recommend_hybrid(user_id, k, Some(weights))?;
        Ok(RecommendationList::new(MatchMethod::Hybrid.as_str(), results))
    })
}

/// GET /v1/recommendations/books?title=: Books similar to a title match.
pub async fn books_by_title(
    State(state): State<AppState>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<Value>, ApiError> {
    let title = required_text("title", query.title.as_deref())?;
    let k = state.k(query.k);
    let key = CacheKey::new("content_title")
        .arg(state.recommender.generation())
        .text(title)
        .arg(k)
        .build();

    state.cached(key, || {
        let (reference, results) = state
            .recommender
            .snapshot()
            .similar_books_by_title(title, k)?;
        debug!(title, reference = %reference.item_id, "Title resolved");
        Ok(
            RecommendationList::new(MatchMethod::ContentBased.as_str(), results)
                .with_query(title)
                .with_reference(reference),
        )
    })
}

/// GET /v1/recommendations/books/:isbn/similar: Content neighbors of a book.
pub async fn similar_books(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Value>, ApiError> {
    let k = state.k(query.k);
    let key = CacheKey::new("content")
        .arg(state.recommender.generation())
        .arg(&isbn)
        .arg(k)
        .build();

    state.cached(key, || {
        let results = state.recommender.snapshot().similar_books(&isbn, k)?;
        Ok(RecommendationList::new(MatchMethod::ContentBased.as_str(), results))
    })
}

/// GET /v1/recommendations/popular: Most-rated books.
pub async fn popular_books(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Value>, ApiError> {
    let k = state.k(query.k);
    let key = CacheKey::new("popular")
        .arg(state.recommender.generation())
        .arg(k)
        .build();

    state.cached(key, || {
        let results = state.recommender.snapshot().popular(k);
        Ok(RecommendationList::new(MatchMethod::Popularity.as_str(), results))
    })
}

/// GET /v1/search: Title search with an explicit method and threshold.
pub async fn search_titles(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let q = required_text("q", query.q.as_deref())?;
    let method = match query.method.as_deref() {
        Some(raw) => SearchMethod::from_str(raw)?,
        None => SearchMethod::default(),
    };
    let threshold = query
        .threshold
        .unwrap_or(state.config.engine.search_threshold);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ApiError::invalid(format!(
            "threshold must be within [0, 1], got {threshold}"
        )));
    }
    let k = state.k(query.k);
    let key = CacheKey::new("search")
        .arg(state.recommender.generation())
        .text(q)
        .arg(method.tag())
        .arg(k)
        .arg(threshold)
        .build();

    state.cached(key, || {
        let results = state.recommender.snapshot().search(q, k, threshold, method)?;
        Ok(RecommendationList::new(method.tag().as_str(), results).with_query(q))
    })
}

/// GET /v1/search/quick: Hybrid search with a strict threshold, for
/// type-ahead boxes.
pub async fn quick_search(
    State(state): State<AppState>,
    Query(query): Query<QuickSearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let q = required_text("q", query.q.as_deref())?;
    let threshold = state.config.engine.quick_search_threshold;
    let key = CacheKey::new("quick_search")
        .arg(state.recommender.generation())
        .text(q)
        .build();

    state.cached(key, || {
        let results = state.recommender.snapshot().search(
            q,
            QUICK_SEARCH_K,
            threshold,
            SearchMethod::Hybrid,
        )?;
        Ok(RecommendationList::new(MatchMethod::Hybrid.as_str(), results).with_query(q))
    })
}
