//! Typed session cache
//!
//! Holds JSON snapshots of the last successful fetch per cache domain.
//! Entries never expire; they are dropped only through [`SessionCache::invalidate`]
//! or [`SessionCache::clear`].

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Error, Result};

/// Cache domains, one per kind of snapshot the site keeps
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheDomain {
    /// Species taxonomy list
    Taxonomy,
    /// Club news items. Reserved for the site front end; no service here fills it.
    News,
    /// Newsletter archive. Reserved like [`CacheDomain::News`].
    Newsletters,
    /// First-level subregions (states/provinces) of a country.
    /// Build through [`CacheDomain::states`] so the code is upper-cased.
    States(String),
    /// Annotated event catalog for a calendar year
    Events(i32),
    /// Recent observations at a single hotspot
    LocationBirds(String),
}

impl CacheDomain {
    /// States domain for a country code, normalized to upper case
    pub fn states(country_code: &str) -> Self {
        CacheDomain::States(country_code.trim().to_ascii_uppercase())
    }

    /// Stable storage key for this domain
    pub fn key(&self) -> String {
        match self {
            CacheDomain::Taxonomy => "taxonomy".to_string(),
            CacheDomain::News => "news".to_string(),
            CacheDomain::Newsletters => "newsletters".to_string(),
            CacheDomain::States(country) => format!("{}states", country),
            CacheDomain::Events(year) => format!("{}events", year),
            CacheDomain::LocationBirds(location_id) => format!("{}Birds", location_id),
        }
    }

    /// Inverse of [`CacheDomain::key`]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "taxonomy" => return Some(CacheDomain::Taxonomy),
            "news" => return Some(CacheDomain::News),
            "newsletters" => return Some(CacheDomain::Newsletters),
            _ => {}
        }

        if let Some(year) = key.strip_suffix("events") {
            return year.parse().ok().map(CacheDomain::Events);
        }
        if let Some(country) = key.strip_suffix("states") {
            if !country.is_empty() {
                return Some(CacheDomain::states(country));
            }
        }
        if let Some(location_id) = key.strip_suffix("Birds") {
            if !location_id.is_empty() {
                return Some(CacheDomain::LocationBirds(location_id.to_string()));
            }
        }
        None
    }
}

impl fmt::Display for CacheDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Session-lifetime snapshot cache shared across handlers
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct SessionCache {
    entries: Arc<RwLock<HashMap<CacheDomain, Value>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and decode a snapshot, `None` on miss
    pub async fn get<T: DeserializeOwned>(&self, domain: &CacheDomain) -> Result<Option<T>> {
        let entries = self.entries.read().await;
        match entries.get(domain) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Store a snapshot, replacing any previous one
    pub async fn put<T: Serialize>(&self, domain: CacheDomain, value: &T) -> Result<()> {
        let snapshot = serde_json::to_value(value)?;
        debug!(key = %domain, "Caching snapshot");
        self.entries.write().await.insert(domain, snapshot);
        Ok(())
    }

    /// Return the cached snapshot or run `fetch` and cache its result
    ///
    /// Failed fetches are not cached. Two concurrent misses may both fetch;
    /// the later write wins, which is harmless for idempotent reads.
    pub async fn get_or_try_insert_with<T, E, F, Fut>(
        &self,
        domain: CacheDomain,
        fetch: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<Error>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(&domain).await? {
            debug!(key = %domain, "Cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.put(domain, &value).await?;
        Ok(value)
    }

    /// Drop one domain; returns whether anything was cached
    pub async fn invalidate(&self, domain: &CacheDomain) -> bool {
        let removed = self.entries.write().await.remove(domain).is_some();
        if removed {
            debug!(key = %domain, "Cache entry invalidated");
        }
        removed
    }

    /// Drop everything; returns the number of entries removed
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        count
    }

    /// Storage keys currently cached, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().map(CacheDomain::key).collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_domain_keys_match_legacy_names() {
        assert_eq!(CacheDomain::Taxonomy.key(), "taxonomy");
        assert_eq!(CacheDomain::Events(2024).key(), "2024events");
        assert_eq!(CacheDomain::LocationBirds("L123".into()).key(), "L123Birds");
        assert_eq!(CacheDomain::States("US".into()).key(), "USstates");
    }

    #[test]
    fn test_from_key_inverts_key() {
        for domain in [
            CacheDomain::Taxonomy,
            CacheDomain::News,
            CacheDomain::Newsletters,
            CacheDomain::States("CA".into()),
            CacheDomain::Events(2025),
            CacheDomain::LocationBirds("L99".into()),
        ] {
            assert_eq!(CacheDomain::from_key(&domain.key()), Some(domain));
        }
        assert_eq!(CacheDomain::from_key("bogus"), None);
        assert_eq!(CacheDomain::from_key("Birds"), None);
        assert_eq!(CacheDomain::from_key("xxevents"), None);
    }

    #[test]
    fn test_states_key_is_case_insensitive() {
        assert_eq!(CacheDomain::states(" us "), CacheDomain::States("US".into()));
        assert_eq!(CacheDomain::from_key("usstates"), Some(CacheDomain::states("US")));
        assert_eq!(CacheDomain::from_key("usstates").map(|d| d.key()), Some("USstates".to_string()));
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = SessionCache::new();
        cache.put(CacheDomain::News, &vec!["a", "b"]).await.unwrap();

        let hit: Option<Vec<String>> = cache.get(&CacheDomain::News).await.unwrap();
        assert_eq!(hit, Some(vec!["a".to_string(), "b".to_string()]));

        let miss: Option<Vec<String>> = cache.get(&CacheDomain::Newsletters).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_get_or_try_insert_fetches_once() {
        let cache = SessionCache::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..3 {
            let value: Vec<u32> = cache
                .get_or_try_insert_with(CacheDomain::Events(2024), || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Error>(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = SessionCache::new();

        let result: Result<Vec<u32>> = cache
            .get_or_try_insert_with(CacheDomain::Taxonomy, || async {
                Err(Error::Internal("upstream down".into()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = SessionCache::new();
        cache.put(CacheDomain::Events(2023), &1).await.unwrap();
        cache.put(CacheDomain::Events(2024), &2).await.unwrap();
        cache.put(CacheDomain::Taxonomy, &3).await.unwrap();

        assert!(cache.invalidate(&CacheDomain::Events(2023)).await);
        assert!(!cache.invalidate(&CacheDomain::Events(2023)).await);
        assert_eq!(cache.keys().await, vec!["2024events", "taxonomy"]);

        assert_eq!(cache.clear().await, 2);
        assert!(cache.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = SessionCache::new();
        let other = cache.clone();
        other.put(CacheDomain::News, &"hello").await.unwrap();

        let hit: Option<String> = cache.get(&CacheDomain::News).await.unwrap();
        assert_eq!(hit.as_deref(), Some("hello"));
    }
}
