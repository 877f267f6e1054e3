//! Sightings aggregation
//!
//! Wraps the observation feed, collapses duplicate reports of the same
//! species in the same region down to the most recent one, and caches the
//! reference lists (states, taxonomy, hotspot birds) for the session.

use std::collections::HashMap;
use std::sync::Arc;

use birdclub_common::{CacheDomain, SessionCache};
use tracing::{debug, warn};

use super::ebird_client::{
    validate_code, Observation, ObservationFeed, ObservationQuery, Subregion, TaxonEntry,
};
use super::feed::FeedError;

/// Keep the latest observation per (species, region)
///
/// Output order is the order in which each key was first seen; a later
/// duplicate replaces the kept record in place only when it is strictly
/// newer.
pub fn dedupe_latest(observations: Vec<Observation>) -> Vec<Observation> {
    let mut slots: HashMap<(String, String), usize> = HashMap::new();
    let mut kept: Vec<Observation> = Vec::with_capacity(observations.len());

    for obs in observations {
        match slots.get(&obs.dedup_key()) {
            Some(&index) => {
                if obs.observed_at > kept[index].observed_at {
                    kept[index] = obs;
                }
            }
            None => {
                slots.insert(obs.dedup_key(), kept.len());
                kept.push(obs);
            }
        }
    }

    kept
}

/// Observation queries plus per-session reference caches
pub struct SightingsAggregator {
    feed: Arc<dyn ObservationFeed>,
    cache: SessionCache,
}

impl SightingsAggregator {
    pub fn new(feed: Arc<dyn ObservationFeed>, cache: SessionCache) -> Self {
        Self { feed, cache }
    }

    /// Notable sightings within `radius_km` of a point over `days_back` days
    pub async fn recent_notable(
        &self,
        lat: f64,
        lng: f64,
        radius_km: u32,
        days_back: u32,
    ) -> Result<Vec<Observation>, FeedError> {
        self.fetch_deduped(ObservationQuery::NotableNearby {
            lat,
            lng,
            radius_km,
            days_back,
        })
        .await
    }

    /// Notable sightings in a region
    pub async fn regional_notable(
        &self,
        region_code: &str,
        days_back: u32,
    ) -> Result<Vec<Observation>, FeedError> {
        self.fetch_deduped(ObservationQuery::NotableInRegion {
            region_code: region_code.to_string(),
            days_back,
        })
        .await
    }

    /// All recent sightings in a region
    pub async fn regional_recent(
        &self,
        region_code: &str,
        days_back: u32,
    ) -> Result<Vec<Observation>, FeedError> {
        self.fetch_deduped(ObservationQuery::RecentInRegion {
            region_code: region_code.to_string(),
            days_back,
        })
        .await
    }

    /// Recent birds at one hotspot, cached for the session
    ///
    /// The cache is keyed by location only; the first window requested wins
    /// until the entry is invalidated.
    pub async fn location_birds(
        &self,
        location_id: &str,
        days_back: u32,
    ) -> Result<Vec<Observation>, FeedError> {
        let location_id = validate_code(location_id.to_string())?;
        let query = ObservationQuery::RecentAtLocation {
            location_id: location_id.clone(),
            days_back,
        };

        self.cache
            .get_or_try_insert_with(CacheDomain::LocationBirds(location_id), || {
                self.fetch_deduped(query)
            })
            .await
    }

    /// States/provinces of a country, cached for the session
    pub async fn states(&self, country_code: &str) -> Result<Vec<Subregion>, FeedError> {
        let country_code = country_code.trim().to_ascii_uppercase();
        self.cache
            .get_or_try_insert_with(CacheDomain::states(&country_code), || {
                self.feed.subregions(&country_code)
            })
            .await
    }

    /// Species taxonomy, cached for the session
    pub async fn taxonomy(&self) -> Result<Vec<TaxonEntry>, FeedError> {
        self.cache
            .get_or_try_insert_with(CacheDomain::Taxonomy, || self.feed.taxonomy())
            .await
    }

    async fn fetch_deduped(&self, query: ObservationQuery) -> Result<Vec<Observation>, FeedError> {
        let query = query.validated()?;
        let raw = match self.feed.observations(&query).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %query.path(), "Observation feed request failed: {}", e);
                return Err(e);
            }
        };

        let fetched = raw.len();
        let deduped = dedupe_latest(raw);
        debug!(
            path = %query.path(),
            fetched,
            kept = deduped.len(),
            "Observations deduplicated"
        );
        Ok(deduped)
    }
}
