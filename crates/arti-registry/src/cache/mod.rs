//! Memoizing ref cache with TTL and LRU bounds.
//!
//! Each derived artifact (raw refs, tags, versions, branches) gets its
//! own map keyed by the raw source string. The stored value is the
//! shared in-flight future itself, published under the map lock before
//! the network call starts, so concurrent callers for one key always
//! share a single round-trip. Entry lifecycle:
//!
//! `Empty -> Pending(future) -> Resolved(value) -> (after TTL) Empty`
//!
//! A failed fetch transitions `Pending -> Empty` instead: the error is
//! delivered to every waiter but never cached.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use arti_core::ArtiResult;

use crate::refs::VersionEntry;

/// Entries per map before the least-recently-used one is evicted
pub const MAX_ENTRIES: usize = 50;

/// How long a resolved entry stays served from memory
pub const ENTRY_TTL: Duration = Duration::from_secs(5 * 60);

type SharedFetch<T> = Shared<BoxFuture<'static, ArtiResult<T>>>;

struct Entry<T: Clone> {
    fetch: SharedFetch<T>,
    stored_at: Instant,
    last_used: Instant,
}

/// One memoizing map: raw source string -> shared fetch future.
pub struct MemoMap<T: Clone> {
    entries: Mutex<HashMap<String, Entry<T>>>,
    ttl: Duration,
    capacity: usize,
}

impl<T> MemoMap<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_policy(ENTRY_TTL, MAX_ENTRIES)
    }

    /// Map with a custom expiry/bound policy (shorter values in tests)
    pub fn with_policy(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Return the cached value for `key`, or run `fetch` to produce it.
    ///
    /// On a miss the future is stored before it is first polled, so a
    /// second caller arriving while the fetch is in flight awaits the
    /// same future. A fetch that fails has its entry removed; callers
    /// already awaiting it still observe the error.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> ArtiResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ArtiResult<T>> + Send + 'static,
    {
        let shared = {
            let now = Instant::now();
            let mut entries = self.entries.lock();

            let fresh = match entries.get_mut(key) {
                Some(entry) if now.duration_since(entry.stored_at) < self.ttl => {
                    entry.last_used = now;
                    Some(entry.fetch.clone())
                }
                _ => None,
            };

            match fresh {
                Some(shared) => shared,
                None => {
                    let shared = fetch().boxed().shared();
                    if !entries.contains_key(key) && entries.len() >= self.capacity {
                        evict_least_recently_used(&mut entries);
                    }
                    entries.insert(
                        key.to_string(),
                        Entry {
                            fetch: shared.clone(),
                            stored_at: now,
                            last_used: now,
                        },
                    );
                    shared
                }
            }
        };

        let result = shared.clone().await;
        if result.is_err() {
            let mut entries = self.entries.lock();
            // Only drop the entry if it still holds the failed fetch; a
            // newer attempt under the same key stays untouched.
            if entries
                .get(key)
                .is_some_and(|entry| entry.fetch.ptr_eq(&shared))
            {
                entries.remove(key);
            }
        }
        result
    }

    /// Number of entries currently held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drop expired entries, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.stored_at) < self.ttl);
        before - entries.len()
    }
}

fn evict_least_recently_used<T: Clone>(entries: &mut HashMap<String, Entry<T>>) {
    if let Some(key) = entries
        .iter()
        .min_by_key(|(_, entry)| entry.last_used)
        .map(|(key, _)| key.clone())
    {
        entries.remove(&key);
    }
}

impl<T> Default for MemoMap<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The four independent memo maps, one per derived artifact.
///
/// Keys and values are never shared across maps; all maps follow the
/// same bound/TTL policy. The process-wide instance lives for the whole
/// process, entries self-expire.
pub struct RefCache {
    pub refs: MemoMap<Vec<String>>,
    pub tags: MemoMap<BTreeMap<String, String>>,
    pub versions: MemoMap<Vec<VersionEntry>>,
    pub branches: MemoMap<BTreeMap<String, String>>,
}

impl RefCache {
    pub fn new() -> Self {
        Self::with_policy(ENTRY_TTL, MAX_ENTRIES)
    }

    pub fn with_policy(ttl: Duration, capacity: usize) -> Self {
        Self {
            refs: MemoMap::with_policy(ttl, capacity),
            tags: MemoMap::with_policy(ttl, capacity),
            versions: MemoMap::with_policy(ttl, capacity),
            branches: MemoMap::with_policy(ttl, capacity),
        }
    }

    /// The cache shared by every resolution session in this process
    pub fn shared() -> Arc<RefCache> {
        static SHARED: Lazy<Arc<RefCache>> = Lazy::new(|| Arc::new(RefCache::new()));
        SHARED.clone()
    }
}

impl Default for RefCache {
    fn default() -> Self {
        Self::new()
    }
}
