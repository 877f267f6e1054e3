//! Domain services: role resolution, sightings aggregation, event catalog,
//! and the upstream feed clients they depend on

pub mod ebird_client;
pub mod event_catalog;
pub mod events_client;
pub mod feed;
pub mod role_resolver;
pub mod sightings;

pub use ebird_client::{EbirdClient, Observation, ObservationFeed, ObservationQuery, Subregion, TaxonEntry};
pub use event_catalog::{date_label, CatalogEntry, EventCatalog};
pub use events_client::{Event, EventFeed, HttpEventFeed, Participant, Photo, Sighting};
pub use feed::FeedError;
pub use role_resolver::{IdentityKey, ResolvedRole, Role, RoleProfile, RoleResolver, RoleStore};
pub use sightings::{dedupe_latest, SightingsAggregator};
