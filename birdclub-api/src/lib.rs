//! birdclub-api library
//!
//! Membership role lookup, bird sightings and the club event catalog behind
//! one small HTTP service.

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use birdclub_common::SessionCache;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use crate::services::{
    EventCatalog, EventFeed, ObservationFeed, RoleResolver, RoleStore, SightingsAggregator,
};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub roles: Arc<RoleResolver>,
    pub sightings: Arc<SightingsAggregator>,
    pub events: Arc<EventCatalog>,
    /// Snapshot cache shared by sightings and events
    pub cache: SessionCache,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        role_store: Arc<dyn RoleStore>,
        observation_feed: Arc<dyn ObservationFeed>,
        event_feed: Arc<dyn EventFeed>,
    ) -> Self {
        let cache = SessionCache::new();
        Self {
            roles: Arc::new(RoleResolver::new(role_store)),
            sightings: Arc::new(SightingsAggregator::new(observation_feed, cache.clone())),
            events: Arc::new(EventCatalog::new(event_feed, cache.clone())),
            cache,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::role_routes())
        .merge(api::sightings_routes())
        .merge(api::event_routes())
        .merge(api::cache_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
