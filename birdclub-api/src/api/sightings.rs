//! Observation endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::services::{Observation, Subregion, TaxonEntry};
use crate::AppState;

const DEFAULT_RADIUS_KM: u32 = 25;
const DEFAULT_DAYS_BACK: u32 = 14;

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lng: f64,
    /// Radius in km
    pub dist: Option<u32>,
    /// Look-back window in days
    pub back: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub back: Option<u32>,
}

impl WindowParams {
    fn days_back(&self) -> u32 {
        self.back.unwrap_or(DEFAULT_DAYS_BACK)
    }
}

/// GET /api/sightings/notable?lat=&lng=&dist=&back=
pub async fn notable_nearby(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> ApiResult<Json<Vec<Observation>>> {
    let observations = state
        .sightings
        .recent_notable(
            params.lat,
            params.lng,
            params.dist.unwrap_or(DEFAULT_RADIUS_KM),
            params.back.unwrap_or(DEFAULT_DAYS_BACK),
        )
        .await?;
    Ok(Json(observations))
}

/// GET /api/sightings/region/:code/notable
pub async fn notable_in_region(
    State(state): State<AppState>,
    Path(region_code): Path<String>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<Vec<Observation>>> {
    let observations = state
        .sightings
        .regional_notable(&region_code, params.days_back())
        .await?;
    Ok(Json(observations))
}

/// GET /api/sightings/region/:code/recent
pub async fn recent_in_region(
    State(state): State<AppState>,
    Path(region_code): Path<String>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<Vec<Observation>>> {
    let observations = state
        .sightings
        .regional_recent(&region_code, params.days_back())
        .await?;
    Ok(Json(observations))
}

/// GET /api/sightings/location/:location_id
pub async fn location_birds(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<Vec<Observation>>> {
    let observations = state
        .sightings
        .location_birds(&location_id, params.days_back())
        .await?;
    Ok(Json(observations))
}

/// GET /api/regions/:country/states
pub async fn states(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> ApiResult<Json<Vec<Subregion>>> {
    Ok(Json(state.sightings.states(&country).await?))
}

/// GET /api/taxonomy
pub async fn taxonomy(State(state): State<AppState>) -> ApiResult<Json<Vec<TaxonEntry>>> {
    Ok(Json(state.sightings.taxonomy().await?))
}

pub fn sightings_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sightings/notable", get(notable_nearby))
        .route("/api/sightings/region/:code/notable", get(notable_in_region))
        .route("/api/sightings/region/:code/recent", get(recent_in_region))
        .route("/api/sightings/location/:location_id", get(location_birds))
        .route("/api/regions/:country/states", get(states))
        .route("/api/taxonomy", get(taxonomy))
}
