//! eBird observation feed client
//!
//! Every request is an authenticated GET carrying the `X-eBirdApiToken`
//! header. Which endpoint is hit is decided by [`ObservationQuery`], never by
//! string-building at the call site.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::feed::{build_http_client, get_json, join_url, FeedError};

pub const EBIRD_BASE_URL: &str = "https://api.ebird.org/v2";
pub const API_KEY_HEADER: &str = "X-eBirdApiToken";

/// Largest search radius the feed accepts
pub const MAX_RADIUS_KM: u32 = 50;
/// Largest look-back window the feed accepts
pub const MAX_DAYS_BACK: u32 = 30;

/// A single observation as delivered by the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub species_code: String,
    #[serde(rename = "comName")]
    pub common_name: String,
    #[serde(rename = "sciName", default)]
    pub scientific_name: String,
    #[serde(rename = "locId", default)]
    pub location_id: String,
    #[serde(rename = "locName", default)]
    pub location_name: String,
    /// County-level region, absent on hotspot feeds
    #[serde(rename = "subnational2Name", default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    #[serde(rename = "subnational1Name", default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    #[serde(rename = "obsDt", with = "birdclub_common::time::feed_timestamp")]
    pub observed_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_many: Option<u32>,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    #[serde(rename = "obsValid", default)]
    pub valid: bool,
    #[serde(rename = "obsReviewed", default)]
    pub reviewed: bool,
    #[serde(default)]
    pub location_private: bool,
    #[serde(rename = "subId", default)]
    pub checklist_id: String,
    #[serde(rename = "userDisplayName", default, skip_serializing_if = "Option::is_none")]
    pub observer: Option<String>,
}

impl Observation {
    /// Region used for deduplication: county when known, else location
    pub fn region_key(&self) -> &str {
        self.region_name.as_deref().unwrap_or(&self.location_name)
    }

    /// Deduplication key: species plus region
    pub fn dedup_key(&self) -> (String, String) {
        (self.species_code.clone(), self.region_key().to_string())
    }
}

/// First-level subregion (state/province)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subregion {
    pub code: String,
    pub name: String,
}

/// One taxonomy entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonEntry {
    pub species_code: String,
    #[serde(rename = "comName")]
    pub common_name: String,
    #[serde(rename = "sciName")]
    pub scientific_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub taxon_order: f64,
    #[serde(rename = "familyComName", default, skip_serializing_if = "Option::is_none")]
    pub family_common_name: Option<String>,
}

/// Which observation list to fetch
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationQuery {
    /// Notable sightings within a radius of a point
    NotableNearby {
        lat: f64,
        lng: f64,
        radius_km: u32,
        days_back: u32,
    },
    /// Notable sightings in a region (country, state or county code)
    NotableInRegion { region_code: String, days_back: u32 },
    /// All recent sightings in a region
    RecentInRegion { region_code: String, days_back: u32 },
    /// All recent sightings at one hotspot
    RecentAtLocation { location_id: String, days_back: u32 },
}

impl ObservationQuery {
    /// Feed path relative to the base URL
    pub fn path(&self) -> String {
        match self {
            ObservationQuery::NotableNearby { .. } => "data/obs/geo/recent/notable".to_string(),
            ObservationQuery::NotableInRegion { region_code, .. } => {
                format!("data/obs/{}/recent/notable", region_code)
            }
            ObservationQuery::RecentInRegion { region_code, .. } => {
                format!("data/obs/{}/recent", region_code)
            }
            ObservationQuery::RecentAtLocation { location_id, .. } => {
                format!("data/obs/{}/recent", location_id)
            }
        }
    }

    /// Query-string parameters
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            ObservationQuery::NotableNearby {
                lat,
                lng,
                radius_km,
                days_back,
            } => vec![
                ("lat", format!("{:.4}", lat)),
                ("lng", format!("{:.4}", lng)),
                ("dist", radius_km.to_string()),
                ("back", days_back.to_string()),
                ("detail", "full".to_string()),
            ],
            ObservationQuery::NotableInRegion { days_back, .. } => vec![
                ("back", days_back.to_string()),
                ("detail", "full".to_string()),
            ],
            ObservationQuery::RecentInRegion { days_back, .. }
            | ObservationQuery::RecentAtLocation { days_back, .. } => {
                vec![("back", days_back.to_string())]
            }
        }
    }

    /// Check codes and coordinates, clamp radius and window to feed limits
    pub fn validated(self) -> Result<Self, FeedError> {
        let days = |d: u32| d.clamp(1, MAX_DAYS_BACK);
        match self {
            ObservationQuery::NotableNearby {
                lat,
                lng,
                radius_km,
                days_back,
            } => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    return Err(FeedError::InvalidQuery(format!(
                        "coordinates out of range: {}, {}",
                        lat, lng
                    )));
                }
                Ok(ObservationQuery::NotableNearby {
                    lat,
                    lng,
                    radius_km: radius_km.clamp(1, MAX_RADIUS_KM),
                    days_back: days(days_back),
                })
            }
            ObservationQuery::NotableInRegion {
                region_code,
                days_back,
            } => Ok(ObservationQuery::NotableInRegion {
                region_code: validate_code(region_code)?,
                days_back: days(days_back),
            }),
            ObservationQuery::RecentInRegion {
                region_code,
                days_back,
            } => Ok(ObservationQuery::RecentInRegion {
                region_code: validate_code(region_code)?,
                days_back: days(days_back),
            }),
            ObservationQuery::RecentAtLocation {
                location_id,
                days_back,
            } => Ok(ObservationQuery::RecentAtLocation {
                location_id: validate_code(location_id)?,
                days_back: days(days_back),
            }),
        }
    }
}

/// Region codes and location ids are short ASCII alphanumerics with dashes
pub fn validate_code(code: String) -> Result<String, FeedError> {
    let trimmed = code.trim();
    let ok = !trimmed.is_empty()
        && trimmed.len() <= 32
        && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if ok {
        Ok(trimmed.to_string())
    } else {
        Err(FeedError::InvalidQuery(format!("invalid region or location code: {:?}", code)))
    }
}

/// Source of observation, region and taxonomy data
#[async_trait]
pub trait ObservationFeed: Send + Sync {
    async fn observations(&self, query: &ObservationQuery) -> Result<Vec<Observation>, FeedError>;

    async fn subregions(&self, country_code: &str) -> Result<Vec<Subregion>, FeedError>;

    async fn taxonomy(&self) -> Result<Vec<TaxonEntry>, FeedError>;
}

/// HTTP client for the eBird API
pub struct EbirdClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl EbirdClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, FeedError> {
        Ok(Self {
            http_client: build_http_client()?,
            base_url: base_url.into(),
            api_key,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, FeedError> {
        let api_key = self.api_key.as_deref().ok_or(FeedError::NotConfigured("eBird"))?;
        let url = join_url(&self.base_url, path);
        debug!(url = %url, "Querying eBird API");
        get_json(&self.http_client, &url, API_KEY_HEADER, api_key, params).await
    }
}

#[async_trait]
impl ObservationFeed for EbirdClient {
    async fn observations(&self, query: &ObservationQuery) -> Result<Vec<Observation>, FeedError> {
        let observations: Vec<Observation> = self.get(&query.path(), &query.params()).await?;
        debug!(count = observations.len(), "eBird observations received");
        Ok(observations)
    }

    async fn subregions(&self, country_code: &str) -> Result<Vec<Subregion>, FeedError> {
        let country_code = validate_code(country_code.to_string())?;
        self.get(&format!("ref/region/list/subnational1/{}", country_code), &[])
            .await
    }

    async fn taxonomy(&self) -> Result<Vec<TaxonEntry>, FeedError> {
        self.get("ref/taxonomy/ebird", &[("fmt", "json".to_string())])
            .await
    }
}
