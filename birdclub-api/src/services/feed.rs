//! Shared HTTP plumbing for upstream data feeds
//!
//! Both feeds are plain authenticated GETs returning JSON arrays, so the
//! request/response handling and the error mapping live here.

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

const USER_AGENT: &str = concat!("birdclub-api/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upstream feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{0} feed is not configured")]
    NotConfigured(&'static str),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Cached snapshot could not be stored or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] birdclub_common::Error),
}

/// Build the HTTP client used by every feed
pub fn build_http_client() -> Result<reqwest::Client, FeedError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| FeedError::Network(e.to_string()))
}

/// GET `url` with the API key header and decode a JSON body
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    key_header: &str,
    api_key: &str,
    params: &[(&str, String)],
) -> Result<T, FeedError> {
    let response = client
        .get(url)
        .header(key_header, api_key)
        .query(params)
        .send()
        .await
        .map_err(|e| FeedError::Network(e.to_string()))?;

    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(FeedError::InvalidApiKey);
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(FeedError::Api(status.as_u16(), error_text));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| FeedError::Parse(e.to_string()))
}

/// Join a base URL and a path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
