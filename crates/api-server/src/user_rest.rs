//! Reader profile and catalog statistics endpoints.

use crate::error::ApiError;
use crate::rest::{parse_user_id, AppState};
use axum::extract::{Path, State};
use axum::Json;
use shelfwise_catalog::{CatalogStatistics, UserProfile};

/// GET /v1/users/:user_id: Profile and rating summary of one reader.
pub async fn user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    metrics::counter!("api.requests").increment(1);
    Ok(Json(state.catalog().user_profile(user_id)?))
}

/// GET /v1/users/stats: Totals across the loaded catalog.
pub async fn catalog_statistics(State(state): State<AppState>) -> Json<CatalogStatistics> {
    metrics::counter!("api.requests").increment(1);
    Json(state.catalog().statistics())
}
