//! Event catalog
//!
//! Turns a year of raw events into the display list: sorted by start,
//! nested lists sorted, date labels precomputed. The finished list is
//! cached per session under `{year}events`; `isPast` is recomputed on
//! every read.

use std::sync::Arc;

use birdclub_common::{CacheDomain, SessionCache};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::events_client::{Event, EventFeed};
use super::feed::FeedError;

/// Id carried by the "no events scheduled" placeholder
pub const PLACEHOLDER_ID: &str = "0";
pub const PLACEHOLDER_TITLE: &str = "No events scheduled";

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2200;

/// Event annotated for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub event: Event,
    pub date_label: String,
    pub is_past: bool,
}

impl CatalogEntry {
    pub fn is_placeholder(&self) -> bool {
        self.event.id == PLACEHOLDER_ID
    }

    /// Whether the event's last day is before `today`
    pub fn ends_before(&self, today: NaiveDate) -> bool {
        !self.is_placeholder() && self.event.end.unwrap_or(self.event.start).date() < today
    }
}

/// Reset `is_past` on every entry against `today`
pub fn mark_past(entries: &mut [CatalogEntry], today: NaiveDate) {
    for entry in entries {
        entry.is_past = entry.ends_before(today);
    }
}

/// Human-readable date range: `March 10` or `March 30 - April 2`
///
/// A missing end, or an end on the same calendar day (or before the start),
/// renders as the start date alone.
pub fn date_label(start: NaiveDateTime, end: Option<NaiveDateTime>) -> String {
    let start_label = start.format("%B %-d").to_string();
    match end {
        Some(end) if end.date() > start.date() => {
            format!("{} - {}", start_label, end.format("%B %-d"))
        }
        _ => start_label,
    }
}

/// Sort, filter to `year` and annotate raw events
///
/// Returns a single placeholder entry when nothing falls in the year.
pub fn build_catalog(mut events: Vec<Event>, year: i32, today: NaiveDate) -> Vec<CatalogEntry> {
    events.retain(|event| event.start.year() == year);

    if events.is_empty() {
        return vec![placeholder(year)];
    }

    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    events
        .into_iter()
        .map(|mut event| {
            event
                .sightings
                .sort_by_cached_key(|s| s.common.to_lowercase());
            event
                .participants
                .sort_by_cached_key(|p| p.name.to_lowercase());

            let mut entry = CatalogEntry {
                date_label: date_label(event.start, event.end),
                is_past: false,
                event,
            };
            entry.is_past = entry.ends_before(today);
            entry
        })
        .collect()
}

fn placeholder(year: i32) -> CatalogEntry {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN);
    CatalogEntry {
        event: Event {
            id: PLACEHOLDER_ID.to_string(),
            start,
            end: None,
            title: PLACEHOLDER_TITLE.to_string(),
            details: String::new(),
            trip_report: None,
            cancelled: false,
            participants: Vec::new(),
            sightings: Vec::new(),
            photos: Vec::new(),
            pdf_file: None,
        },
        date_label: String::new(),
        is_past: false,
    }
}

/// Year-by-year event listing backed by the event feed
pub struct EventCatalog {
    feed: Arc<dyn EventFeed>,
    cache: SessionCache,
}

impl EventCatalog {
    pub fn new(feed: Arc<dyn EventFeed>, cache: SessionCache) -> Self {
        Self { feed, cache }
    }

    /// Display-ready events for `year`, fetched at most once per session
    pub async fn events_for_year(&self, year: i32) -> Result<Vec<CatalogEntry>, FeedError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(FeedError::InvalidQuery(format!("year out of range: {}", year)));
        }

        let mut catalog = self
            .cache
            .get_or_try_insert_with(CacheDomain::Events(year), || self.fetch_year(year))
            .await?;
        mark_past(&mut catalog, Local::now().date_naive());
        Ok(catalog)
    }

    async fn fetch_year(&self, year: i32) -> Result<Vec<CatalogEntry>, FeedError> {
        let (Some(from), Some(to)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Err(FeedError::InvalidQuery(format!("year out of range: {}", year)));
        };

        let events = self.feed.events_between(from, to).await?;
        let fetched = events.len();
        let catalog = build_catalog(events, year, Local::now().date_naive());

        if catalog.len() == 1 && catalog[0].is_placeholder() {
            info!(year, "No events scheduled");
        } else {
            debug!(year, fetched, listed = catalog.len(), "Event catalog built");
        }
        Ok(catalog)
    }
}
