//! Cache inspection and invalidation
//!
//! Snapshots never expire on their own; these endpoints are the only way to
//! force a refetch short of restarting the service.

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use birdclub_common::CacheDomain;
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CacheKeys {
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub removed: usize,
}

/// GET /api/cache
pub async fn list_cache(State(state): State<AppState>) -> Json<CacheKeys> {
    Json(CacheKeys {
        keys: state.cache.keys().await,
    })
}

/// DELETE /api/cache/:key
pub async fn invalidate_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<InvalidateResponse>> {
    let domain = CacheDomain::from_key(&key)
        .ok_or_else(|| ApiError::NotFound(format!("unknown cache key: {}", key)))?;

    let removed = usize::from(state.cache.invalidate(&domain).await);
    info!(key = %domain, removed, "Cache invalidation requested");
    Ok(Json(InvalidateResponse { removed }))
}

/// DELETE /api/cache
pub async fn clear_cache(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.cache.clear().await;
    info!(removed, "Cache cleared");
    Json(InvalidateResponse { removed })
}

pub fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cache", get(list_cache).delete(clear_cache))
        .route("/api/cache/:key", delete(invalidate_key))
}
