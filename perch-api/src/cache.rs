//! Optional GET response cache.
use dashmap::DashMap;
use perch_http::{HttpMethod, RawResponse};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Storage for successful responses, keyed by [`cache_key`].
///
/// Concurrent misses for the same key each go to the network; the last store
/// wins.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<RawResponse>;
    fn store(&self, key: String, response: RawResponse);
    /// Drop expired entries.
    fn cleanup(&self);
    /// Drop everything.
    fn flush(&self);
}

/// `METHOD scheme://host/path?k=v&…` with named params sorted by key, so
/// argument order does not split the cache. The origin keeps the API and
/// search hosts apart even when their roots coincide.
///
/// ```
/// use perch_api::cache::cache_key;
/// use perch_http::HttpMethod;
/// use url::Url;
///
/// let url = Url::parse("http://api.twitter.com/1/statuses/show/5.json?b=2&a=1").unwrap();
/// let key = cache_key(HttpMethod::Get, &url, &[("b".into(), "2".into()), ("a".into(), "1".into())]);
/// assert_eq!(key, "GET http://api.twitter.com/1/statuses/show/5.json?a=1&b=2");
/// ```
pub fn cache_key(method: HttpMethod, url: &Url, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    let query = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let origin = url.origin().ascii_serialization();
    let path = url.path();
    if query.is_empty() {
        format!("{method} {origin}{path}")
    } else {
        format!("{method} {origin}{path}?{query}")
    }
}

struct Entry {
    stored_at: Instant,
    response: RawResponse,
}

/// In-process TTL cache. Cloning shares the underlying map.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, Entry>>,
    timeout: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MemoryCache {
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn expired(&self, entry: &Entry) -> bool {
        entry.stored_at.elapsed() >= self.timeout
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<RawResponse> {
        if let Some(entry) = self.entries.get(key) {
            if !self.expired(&entry) {
                return Some(entry.response.clone());
            }
        }
        // guard above is released before touching the shard again
        self.entries.remove_if(key, |_, entry| self.expired(entry));
        None
    }

    fn store(&self, key: String, response: RawResponse) {
        self.entries.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                response,
            },
        );
    }

    fn cleanup(&self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.expired(entry));
        tracing::debug!(
            evicted = before.saturating_sub(self.entries.len()),
            "cache.cleanup"
        );
    }

    fn flush(&self) {
        self.entries.clear();
    }
}
