//! Event catalog endpoint

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::ApiResult;
use crate::services::CatalogEntry;
use crate::AppState;

/// GET /api/events/:year
pub async fn events_for_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> ApiResult<Json<Vec<CatalogEntry>>> {
    Ok(Json(state.events.events_for_year(year).await?))
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/api/events/:year", get(events_for_year))
}
