//! Test helper utilities shared by birdclub-api integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use birdclub_api::db::SqliteRoleStore;
use birdclub_api::services::{
    Event, EventFeed, FeedError, Observation, ObservationFeed, ObservationQuery, Subregion,
    TaxonEntry,
};
use birdclub_api::AppState;
use birdclub_common::db::{init_memory_database, Member, MemberStatus, Officer};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Fresh in-memory role store with the full schema
pub async fn memory_role_store() -> SqliteRoleStore {
    let pool = init_memory_database()
        .await
        .expect("in-memory database should initialize");
    SqliteRoleStore::new(pool)
}

pub fn officer(id: &str, email: &str, position: &str) -> Officer {
    Officer {
        id: id.to_string(),
        name: format!("Officer {}", id),
        email: email.to_string(),
        position: position.to_string(),
        role: None,
        is_admin: false,
        external_id: None,
    }
}

pub fn member(id: &str, email: &str, status: MemberStatus) -> Member {
    Member {
        id: id.to_string(),
        name: format!("Member {}", id),
        email: email.to_string(),
        external_id: None,
        member_since: Utc::now(),
        status,
        auto_enrolled: false,
    }
}

pub fn timestamp(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

pub fn observation(species: &str, region: &str, observed_at: NaiveDateTime) -> Observation {
    Observation {
        species_code: species.to_string(),
        common_name: species.to_string(),
        scientific_name: String::new(),
        location_id: "L1".to_string(),
        location_name: "Test Marsh".to_string(),
        region_name: Some(region.to_string()),
        state_name: Some("New York".to_string()),
        observed_at,
        how_many: Some(1),
        lat: 42.0,
        lng: -76.0,
        valid: true,
        reviewed: false,
        location_private: false,
        checklist_id: format!("S-{}-{}", species, observed_at.format("%d%H")),
        observer: None,
    }
}

pub fn event(id: &str, start: NaiveDateTime, end: Option<NaiveDateTime>) -> Event {
    Event {
        id: id.to_string(),
        start,
        end,
        title: format!("Event {}", id),
        details: String::new(),
        trip_report: None,
        cancelled: false,
        participants: Vec::new(),
        sightings: Vec::new(),
        photos: Vec::new(),
        pdf_file: None,
    }
}

/// Observation feed returning a fixed list
#[derive(Default)]
pub struct FakeObservationFeed {
    pub observations: Vec<Observation>,
    pub fail: bool,
    pub calls: AtomicUsize,
    pub last_query: Mutex<Option<ObservationQuery>>,
}

#[async_trait]
impl ObservationFeed for FakeObservationFeed {
    async fn observations(&self, query: &ObservationQuery) -> Result<Vec<Observation>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        if self.fail {
            return Err(FeedError::Network("connection refused".into()));
        }
        Ok(self.observations.clone())
    }

    async fn subregions(&self, country_code: &str) -> Result<Vec<Subregion>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Subregion {
            code: format!("{}-NY", country_code),
            name: "New York".to_string(),
        }])
    }

    async fn taxonomy(&self) -> Result<Vec<TaxonEntry>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![TaxonEntry {
            species_code: "amerob".to_string(),
            common_name: "American Robin".to_string(),
            scientific_name: "Turdus migratorius".to_string(),
            category: "species".to_string(),
            taxon_order: 27_000.0,
            family_common_name: Some("Thrushes and Allies".to_string()),
        }])
    }
}

/// Event feed returning a fixed list regardless of range
#[derive(Default)]
pub struct FakeEventFeed {
    pub events: Vec<Event>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl EventFeed for FakeEventFeed {
    async fn events_between(&self, _from: NaiveDate, _to: NaiveDate) -> Result<Vec<Event>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.events.clone())
    }
}

/// App state over an in-memory store and the given fake feeds
pub fn app_state(
    store: SqliteRoleStore,
    observations: Arc<FakeObservationFeed>,
    events: Arc<FakeEventFeed>,
) -> AppState {
    AppState::new(Arc::new(store), observations, events)
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
