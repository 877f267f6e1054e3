//! HTTP feed clients against a local stand-in upstream
//!
//! A throwaway axum server on 127.0.0.1:0 plays the part of the eBird and
//! event APIs so request shape and error mapping are checked end to end.

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use birdclub_api::services::{
    EbirdClient, EventFeed, FeedError, HttpEventFeed, ObservationFeed, ObservationQuery,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashMap;

const EBIRD_KEY: &str = "test-ebird-key";
const EVENTS_KEY: &str = "test-events-key";

async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn has_key(headers: &HeaderMap, name: &str, expected: &str) -> bool {
    headers.get(name).and_then(|v| v.to_str().ok()) == Some(expected)
}

fn ebird_upstream() -> Router {
    Router::new()
        .route(
            "/v2/data/obs/geo/recent/notable",
            get(|headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                if !has_key(&headers, "X-eBirdApiToken", EBIRD_KEY) {
                    return (StatusCode::UNAUTHORIZED, Json(json!([])));
                }
                let body = json!([{
                    "speciesCode": "snoowl1",
                    "comName": "Snowy Owl",
                    "sciName": "Bubo scandiacus",
                    "locId": "L1",
                    "locName": "Jones Beach",
                    "obsDt": "2024-01-12 15:40",
                    "subnational2Name": "Nassau",
                    "subId": format!("dist={};back={}", q["dist"], q["back"])
                }]);
                (StatusCode::OK, Json(body))
            }),
        )
        .route(
            "/v2/data/obs/:region/recent",
            get(|Path(region): Path<String>| async move {
                if region == "US-XX" {
                    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"})))
                } else {
                    (StatusCode::OK, Json(json!({"not": "a list"})))
                }
            }),
        )
        .route(
            "/v2/ref/region/list/subnational1/:country",
            get(|Path(country): Path<String>| async move {
                Json(json!([{ "code": format!("{}-NY", country), "name": "New York" }]))
            }),
        )
}

#[tokio::test]
async fn test_ebird_client_sends_key_and_params() {
    let base = spawn_upstream(ebird_upstream()).await;
    let client = EbirdClient::new(format!("{}/v2", base), Some(EBIRD_KEY.into())).unwrap();

    let query = ObservationQuery::NotableNearby {
        lat: 40.6,
        lng: -73.5,
        radius_km: 15,
        days_back: 5,
    };
    let observations = client.observations(&query).await.unwrap();

    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].region_key(), "Nassau");
    assert_eq!(observations[0].checklist_id, "dist=15;back=5");
}

#[tokio::test]
async fn test_ebird_client_bad_key() {
    let base = spawn_upstream(ebird_upstream()).await;
    let client = EbirdClient::new(format!("{}/v2", base), Some("wrong".into())).unwrap();

    let query = ObservationQuery::NotableNearby {
        lat: 0.0,
        lng: 0.0,
        radius_km: 1,
        days_back: 1,
    };
    assert!(matches!(
        client.observations(&query).await,
        Err(FeedError::InvalidApiKey)
    ));
}

#[tokio::test]
async fn test_ebird_client_error_mapping() {
    let base = spawn_upstream(ebird_upstream()).await;
    let client = EbirdClient::new(format!("{}/v2", base), Some(EBIRD_KEY.into())).unwrap();

    let failing = ObservationQuery::RecentInRegion {
        region_code: "US-XX".into(),
        days_back: 3,
    };
    assert!(matches!(
        client.observations(&failing).await,
        Err(FeedError::Api(500, _))
    ));

    let malformed = ObservationQuery::RecentInRegion {
        region_code: "US-NY".into(),
        days_back: 3,
    };
    assert!(matches!(
        client.observations(&malformed).await,
        Err(FeedError::Parse(_))
    ));
}

#[tokio::test]
async fn test_ebird_client_subregions() {
    let base = spawn_upstream(ebird_upstream()).await;
    let client = EbirdClient::new(format!("{}/v2/", base), Some(EBIRD_KEY.into())).unwrap();

    let states = client.subregions("US").await.unwrap();
    assert_eq!(states[0].code, "US-NY");
}

#[tokio::test]
async fn test_unreachable_upstream_is_network_error() {
    // Bind then drop to get a port nobody is listening on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = EbirdClient::new(format!("http://{}", addr), Some(EBIRD_KEY.into())).unwrap();
    assert!(matches!(client.taxonomy().await, Err(FeedError::Network(_))));
}

#[tokio::test]
async fn test_event_feed_sends_range_and_key() {
    let router = Router::new().route(
        "/api/events",
        get(|headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
            if !has_key(&headers, "X-Api-Key", EVENTS_KEY) {
                return (StatusCode::FORBIDDEN, Json(Value::Null));
            }
            let body = json!([{
                "id": "e1",
                "start": q["start"],
                "end": q["end"],
                "title": "Range echo"
            }]);
            (StatusCode::OK, Json(body))
        }),
    );
    let base = spawn_upstream(router).await;

    let feed = HttpEventFeed::new(Some(format!("{}/api", base)), Some(EVENTS_KEY.into())).unwrap();
    let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

    let events = feed.events_between(from, to).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start.date(), from);
    assert_eq!(events[0].end.unwrap().date(), to);

    let wrong_key = HttpEventFeed::new(Some(format!("{}/api", base)), Some("nope".into())).unwrap();
    assert!(matches!(
        wrong_key.events_between(from, to).await,
        Err(FeedError::InvalidApiKey)
    ));
}
