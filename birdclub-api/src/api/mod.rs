//! HTTP API handlers for birdclub-api

pub mod buildinfo;
pub mod cache;
pub mod events;
pub mod health;
pub mod role;
pub mod sightings;

pub use buildinfo::get_build_info;
pub use cache::cache_routes;
pub use events::event_routes;
pub use health::health_routes;
pub use role::role_routes;
pub use sightings::sightings_routes;
