use crate::domain::ports::{Clock, LocalStore, MarkerStore};
use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;

const LAST_CHECKED_KEY: &str = "cache:last_checked_at";

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Absolute age ceiling for a cached payload.
    pub ttl: Duration,
    /// Minimum spacing between remote marker polls.
    pub check_interval: Duration,
}

impl CacheConfig {
    pub fn new(ttl_secs: i64, check_interval_secs: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs),
            check_interval: Duration::seconds(check_interval_secs),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig::new(600, 30)
    }
}

#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    payload: T,
    fetched_at: DateTime<Utc>,
}

/// Client-local keyed cache with bounded staleness.
///
/// A cached payload is served as long as it is younger than the TTL and
/// the domain's modification marker has not advanced past its fetch
/// time. Marker polls are rate-limited by `check_interval`, so a foreign
/// write may stay invisible for at most that long (plus the poll that
/// discovers it). A failed marker poll degrades to TTL-only staleness.
pub struct StalenessCache<S: LocalStore, M: MarkerStore, K: Clock> {
    local: Arc<S>,
    markers: Arc<M>,
    clock: Arc<K>,
    config: CacheConfig,
    known_domains: Mutex<HashSet<String>>,
}

impl<S: LocalStore, M: MarkerStore, K: Clock> StalenessCache<S, M, K> {
    pub fn new(local: Arc<S>, markers: Arc<M>, clock: Arc<K>, config: CacheConfig) -> Self {
        Self {
            local,
            markers,
            clock,
            config,
            known_domains: Mutex::new(HashSet::new()),
        }
    }

    pub async fn read<T, F, Fut>(&self, domain: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let now = self.clock.now();
        let key = Self::entry_key(domain);

        let entry: Option<CacheEntry<T>> = self
            .local
            .get(&key)
            .and_then(|raw| serde_json::from_str(&raw).ok());

        let entry = match entry {
            Some(entry) => entry,
            None => {
                tracing::debug!("Cache miss for {}", domain);
                return self.refresh(domain, &key, fetch, now).await;
            }
        };

        if now - entry.fetched_at > self.config.ttl {
            tracing::debug!("Cache entry for {} past TTL, refetching", domain);
            return self.refresh(domain, &key, fetch, now).await;
        }

        if let Some(last_checked) = self.last_checked_at() {
            if now - last_checked < self.config.check_interval {
                return Ok(entry.payload);
            }
        }

        self.local.set(LAST_CHECKED_KEY, now.to_rfc3339());
        match self.markers.marker(domain).await {
            Ok(Some(marker)) if marker.last_modified_at > entry.fetched_at => {
                tracing::debug!("Marker for {} advanced, refetching", domain);
                self.refresh(domain, &key, fetch, now).await
            }
            Ok(_) => Ok(entry.payload),
            Err(e) => {
                // Degraded mode: the TTL check above is the only
                // staleness signal left, and the entry passed it.
                tracing::warn!("Marker poll for {} failed, serving cached: {}", domain, e);
                Ok(entry.payload)
            }
        }
    }

    pub fn invalidate(&self, domain: &str) {
        tracing::debug!("Invalidating cache for {}", domain);
        self.local.delete(&Self::entry_key(domain));
    }

    pub fn invalidate_all(&self) {
        let domains: Vec<String> = self
            .known_domains
            .lock()
            .expect("cache domain set poisoned")
            .iter()
            .cloned()
            .collect();
        for domain in domains {
            self.local.delete(&Self::entry_key(&domain));
        }
        self.local.delete(LAST_CHECKED_KEY);
    }

    async fn refresh<T, F, Fut>(&self, domain: &str, key: &str, fetch: F, now: DateTime<Utc>) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let payload = fetch().await?;
        let entry = CacheEntry {
            payload,
            fetched_at: now,
        };
        self.local.set(key, serde_json::to_string(&entry)?);
        self.known_domains
            .lock()
            .expect("cache domain set poisoned")
            .insert(domain.to_string());
        Ok(entry.payload)
    }

    fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.local
            .get(LAST_CHECKED_KEY)
            .and_then(|raw| raw.parse::<DateTime<Utc>>().ok())
    }

    fn entry_key(domain: &str) -> String {
        format!("cache:{}", domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ModificationMarker;
    use crate::utils::error::CatalogError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MapLocalStore {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MapLocalStore {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
            }
        }
    }

    impl LocalStore for MapLocalStore {
        fn get(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: String) {
            self.entries.lock().unwrap().insert(key.to_string(), value);
        }

        fn delete(&self, key: &str) {
            self.entries.lock().unwrap().remove(key);
        }
    }

    struct MockMarkerStore {
        marker: Mutex<Option<ModificationMarker>>,
        fail: Mutex<bool>,
        polls: AtomicUsize,
    }

    impl MockMarkerStore {
        fn new() -> Self {
            Self {
                marker: Mutex::new(None),
                fail: Mutex::new(false),
                polls: AtomicUsize::new(0),
            }
        }

        fn set_marker(&self, domain: &str, at: DateTime<Utc>) {
            *self.marker.lock().unwrap() = Some(ModificationMarker {
                domain: domain.to_string(),
                last_modified_at: at,
            });
        }

        fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn poll_count(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarkerStore for MockMarkerStore {
        async fn marker(&self, _domain: &str) -> Result<Option<ModificationMarker>> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            if *self.fail.lock().unwrap() {
                return Err(CatalogError::RemoteUnavailable("marker store down".into()));
            }
            Ok(self.marker.lock().unwrap().clone())
        }

        async fn touch(&self, domain: &str) -> Result<()> {
            self.set_marker(domain, Utc::now());
            Ok(())
        }
    }

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn starting_at(now: DateTime<Utc>) -> Self {
            Self { now: Mutex::new(now) }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    struct Harness {
        cache: StalenessCache<MapLocalStore, MockMarkerStore, ManualClock>,
        markers: Arc<MockMarkerStore>,
        clock: Arc<ManualClock>,
        fetches: AtomicUsize,
    }

    impl Harness {
        fn new() -> Self {
            let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
            let local = Arc::new(MapLocalStore::new());
            let markers = Arc::new(MockMarkerStore::new());
            let clock = Arc::new(ManualClock::starting_at(start));
            let cache = StalenessCache::new(
                local,
                markers.clone(),
                clock.clone(),
                CacheConfig::default(),
            );
            Self {
                cache,
                markers,
                clock,
                fetches: AtomicUsize::new(0),
            }
        }

        async fn read(&self, value: &str) -> String {
            self.cache
                .read("catalog", || {
                    self.fetches.fetch_add(1, Ordering::SeqCst);
                    let value = value.to_string();
                    async move { Ok(value) }
                })
                .await
                .unwrap()
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_first_read_fetches_and_caches() {
        let h = Harness::new();

        assert_eq!(h.read("v1").await, "v1");
        assert_eq!(h.fetch_count(), 1);
        assert_eq!(h.markers.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_reads_within_check_interval_skip_marker_poll() {
        let h = Harness::new();

        h.read("v1").await;
        // First repeat read polls (no last-checked recorded yet), the
        // rest stay inside the interval and serve locally.
        h.clock.advance(Duration::seconds(5));
        assert_eq!(h.read("v2").await, "v1");
        assert_eq!(h.markers.poll_count(), 1);

        h.clock.advance(Duration::seconds(5));
        assert_eq!(h.read("v2").await, "v1");
        assert_eq!(h.markers.poll_count(), 1);
        assert_eq!(h.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_marker_keeps_cached_value() {
        let h = Harness::new();
        let before_fetch = h.clock.now() - Duration::seconds(60);
        h.markers.set_marker("catalog", before_fetch);

        h.read("v1").await;
        h.clock.advance(Duration::seconds(31));
        assert_eq!(h.read("v2").await, "v1");
        assert_eq!(h.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_advanced_marker_forces_refetch() {
        let h = Harness::new();

        h.read("v1").await;
        // Seed the poll clock: this read polls, finds no marker, and
        // records the check time.
        assert_eq!(h.read("v1").await, "v1");

        // A foreign write lands after our fetch.
        h.clock.advance(Duration::seconds(10));
        h.markers.set_marker("catalog", h.clock.now());

        // Still inside the check interval: stale value tolerated.
        h.clock.advance(Duration::seconds(10));
        assert_eq!(h.read("v2").await, "v1");

        // Past the interval the poll sees the marker and refetches.
        h.clock.advance(Duration::seconds(25));
        assert_eq!(h.read("v2").await, "v2");
        assert_eq!(h.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_ttl_expiry_forces_refetch() {
        let h = Harness::new();

        h.read("v1").await;
        h.clock.advance(Duration::seconds(601));
        assert_eq!(h.read("v2").await, "v2");
        assert_eq!(h.fetch_count(), 2);
        // TTL path refetches without consulting the marker.
        assert_eq!(h.markers.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let h = Harness::new();

        h.read("v1").await;
        h.cache.invalidate("catalog");
        assert_eq!(h.read("v2").await, "v2");
        assert_eq!(h.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_marker_failure_degrades_to_ttl() {
        let h = Harness::new();

        h.read("v1").await;
        h.markers.set_failing(true);

        // Within TTL: failed poll, cached value served.
        h.clock.advance(Duration::seconds(60));
        assert_eq!(h.read("v2").await, "v1");
        assert_eq!(h.fetch_count(), 1);

        // Past TTL: refetch regardless of the broken marker store.
        h.clock.advance(Duration::seconds(601));
        assert_eq!(h.read("v2").await, "v2");
        assert_eq!(h.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_every_domain() {
        let h = Harness::new();

        h.read("v1").await;
        h.cache
            .read("ratings", || async { Ok("r1".to_string()) })
            .await
            .unwrap();

        h.cache.invalidate_all();

        assert_eq!(h.read("v2").await, "v2");
        let ratings: String = h
            .cache
            .read("ratings", || async { Ok("r2".to_string()) })
            .await
            .unwrap();
        assert_eq!(ratings, "r2");
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_on_cold_cache() {
        let h = Harness::new();

        let result: Result<String> = h
            .cache
            .read("catalog", || async {
                Err(CatalogError::RemoteUnavailable("store down".into()))
            })
            .await;
        assert!(matches!(result, Err(CatalogError::RemoteUnavailable(_))));
    }
}
