//! Club event feed client

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::feed::{build_http_client, get_json, join_url, FeedError};

pub const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
}

/// Species seen on a field trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub common: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    #[serde(default)]
    pub caption: String,
    pub media_ref: String,
}

/// Club event (meeting, field trip, workshop)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(with = "birdclub_common::time::feed_timestamp")]
    pub start: NaiveDateTime,
    #[serde(default, with = "birdclub_common::time::feed_timestamp::option")]
    pub end: Option<NaiveDateTime>,
    pub title: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_report: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub sightings: Vec<Sighting>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_file: Option<String>,
}

/// Source of club events
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Events whose start falls within `[from, to]` (inclusive dates)
    async fn events_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Event>, FeedError>;
}

/// HTTP client for the club content API
pub struct HttpEventFeed {
    http_client: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl HttpEventFeed {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Result<Self, FeedError> {
        Ok(Self {
            http_client: build_http_client()?,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl EventFeed for HttpEventFeed {
    async fn events_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Event>, FeedError> {
        let (Some(base_url), Some(api_key)) = (self.base_url.as_deref(), self.api_key.as_deref()) else {
            return Err(FeedError::NotConfigured("Events"));
        };

        let url = join_url(base_url, "events");
        let params = [
            ("start", from.format("%Y-%m-%d").to_string()),
            ("end", to.format("%Y-%m-%d").to_string()),
        ];

        debug!(url = %url, %from, %to, "Querying event feed");
        let events: Vec<Event> = get_json(&self.http_client, &url, API_KEY_HEADER, api_key, &params).await?;
        debug!(count = events.len(), "Events received");
        Ok(events)
    }
}
