//! Per-key TTL cache that degrades to stale or synthetic data.
//!
//! Lookup order for [`ResilientCache::get`]:
//!
//! 1. A fresh entry (`age < ttl`) is returned without touching the network.
//! 2. While the provider is backing off, the stale entry, else the fallback,
//!    else `None` is returned. No request is made.
//! 3. Otherwise one bounded request is made. Success overwrites the entry;
//!    any failure returns the stale entry or the fallback. Errors never reach
//!    the caller.
//!
//! [`ResilientCache::get_or_refresh`] never waits on the network: a miss is
//! answered with the fallback (stored as a placeholder) and a stale entry is
//! answered as-is, while a refresh runs in the background.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::fetcher::{BackoffFetcher, FetchError};

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

/// A cached value and when it was obtained.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: Instant,
    /// When the request that produced this value was issued.
    requested_at: Instant,
    /// Fallback stand-in stored on a miss. Never counts as fresh.
    placeholder: bool,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        !self.placeholder && now.saturating_duration_since(self.fetched_at) < ttl
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

struct Slots<T> {
    entries: HashMap<String, CacheEntry<T>>,
    /// Keys with a background refresh in flight.
    refreshing: HashSet<String>,
}

impl<T> Slots<T> {
    /// Store a fetched value unless a more recently requested one is already
    /// there. Placeholders are always replaced.
    fn store(&mut self, key: String, value: T, requested_at: Instant) -> bool {
        if let Some(existing) = self.entries.get(&key) {
            if !existing.placeholder && existing.requested_at > requested_at {
                return false;
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                requested_at,
                placeholder: false,
            },
        );
        true
    }
}

fn lock<T>(slots: &Mutex<Slots<T>>) -> MutexGuard<'_, Slots<T>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears a key's in-flight refresh marker when dropped, including when the
/// refresh task unwinds.
struct RefreshMarker<T> {
    slots: Arc<Mutex<Slots<T>>>,
    key: String,
}

impl<T> Drop for RefreshMarker<T> {
    fn drop(&mut self) {
        lock(&self.slots).refreshing.remove(&self.key);
    }
}

// ---------------------------------------------------------------------------
// ResilientCache
// ---------------------------------------------------------------------------

/// TTL cache for one provider. Cheap to clone; clones share state.
pub struct ResilientCache<T> {
    slots: Arc<Mutex<Slots<T>>>,
    fetcher: Arc<BackoffFetcher>,
}

impl<T> Clone for ResilientCache<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<T> ResilientCache<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(fetcher: Arc<BackoffFetcher>) -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                entries: HashMap::new(),
                refreshing: HashSet::new(),
            })),
            fetcher,
        }
    }

    /// Return the value for `key`, fetching it if the entry is missing or
    /// older than `ttl`. Never fails; see the module docs for the order.
    pub async fn get<F, Fut, FB>(&self, key: &str, ttl: Duration, fetch: F, fallback: FB) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
        FB: FnOnce() -> Option<T>,
    {
        let now = Instant::now();
        let stale = {
            let slots = lock(&self.slots);
            match slots.entries.get(key) {
                Some(entry) if entry.is_fresh(ttl, now) => return Some(entry.value.clone()),
                Some(entry) => Some(entry.value.clone()),
                None => None,
            }
        };

        if let Some(remaining) = self.fetcher.backoff_remaining() {
            tracing::debug!(
                provider = self.fetcher.provider(),
                key,
                remaining_secs = remaining.as_secs(),
                "Provider backing off, serving cached data"
            );
            return stale.or_else(fallback);
        }

        let slots = Arc::clone(&self.slots);
        let owned_key = key.to_string();
        let result = self
            .fetcher
            .fetch(fetch(), move |result: &Result<T, FetchError>| {
                if let Ok(value) = result {
                    lock(&slots).store(owned_key, value.clone(), now);
                }
            })
            .await;

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    provider = self.fetcher.provider(),
                    key,
                    error = %e,
                    has_stale = stale.is_some(),
                    "Fetch failed, serving stale or fallback data"
                );
                stale.or_else(fallback)
            }
        }
    }

    /// Stale-while-revalidate lookup. Never waits on the network.
    ///
    /// A fresh entry is returned as-is. A stale entry is returned while a
    /// refresh is started in the background. On a miss the fallback is stored
    /// as a placeholder and returned, and the real fetch starts in the
    /// background. At most one background refresh per key runs at a time, and
    /// none starts while the provider is backing off.
    ///
    /// Must be called from within a Tokio runtime for the refresh to start.
    pub fn get_or_refresh<F, Fut, FB>(&self, key: &str, ttl: Duration, fetch: F, fallback: FB) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
        FB: FnOnce() -> Option<T>,
    {
        let now = Instant::now();
        let cached = {
            let slots = lock(&self.slots);
            match slots.entries.get(key) {
                Some(entry) if entry.is_fresh(ttl, now) => return Some(entry.value.clone()),
                Some(entry) => Some(entry.value.clone()),
                None => None,
            }
        };

        let value = match cached {
            Some(value) => Some(value),
            None => {
                let placeholder = fallback();
                if let Some(value) = &placeholder {
                    lock(&self.slots)
                        .entries
                        .entry(key.to_string())
                        .or_insert_with(|| CacheEntry {
                            value: value.clone(),
                            fetched_at: now,
                            requested_at: now,
                            placeholder: true,
                        });
                }
                placeholder
            }
        };

        self.refresh_in_background(key, fetch);
        value
    }

    fn refresh_in_background<F, Fut>(&self, key: &str, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        if self.fetcher.in_backoff() {
            return;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!(
                provider = self.fetcher.provider(),
                key,
                "No async runtime, skipping background refresh"
            );
            return;
        }
        if !lock(&self.slots).refreshing.insert(key.to_string()) {
            return;
        }

        let requested_at = Instant::now();
        let slots = Arc::clone(&self.slots);
        let provider = self.fetcher.provider();
        let owned_key = key.to_string();
        let marker = RefreshMarker {
            slots: Arc::clone(&self.slots),
            key: owned_key.clone(),
        };
        self.fetcher
            .spawn_detached(fetch(), move |result: &Result<T, FetchError>| {
                // Declared first so it drops after the slots guard below.
                let _marker = marker;
                let mut slots = lock(&slots);
                match result {
                    Ok(value) => {
                        slots.store(owned_key, value.clone(), requested_at);
                    }
                    Err(e) => {
                        tracing::warn!(
                            provider,
                            key = %owned_key,
                            error = %e,
                            "Background refresh failed"
                        );
                    }
                }
            });
    }

    /// Snapshot of the entry for `key`, fresh or not.
    pub fn peek(&self, key: &str) -> Option<CacheEntry<T>> {
        lock(&self.slots).entries.get(key).cloned()
    }

    /// Drop one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        lock(&self.slots).entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        lock(&self.slots).entries.clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time left in the provider's backoff window, if any.
    pub fn backoff_remaining(&self) -> Option<Duration> {
        self.fetcher.backoff_remaining()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
