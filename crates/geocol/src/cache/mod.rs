//! Read-through caching of lookup and search results.
//!
//! [`CachedRead`] wraps any [`CacheStore`]. A failing store never fails the
//! read: the loader still runs and the outcome reports the degradation, so
//! callers can tell a hit from a miss from a store that is misbehaving.

use std::time::{Duration, Instant};

use moka::{Expiry, sync::Cache};
use tracing::{debug, instrument, warn};

pub use error::CacheError;

/// Maximum number of entries held by a [`MokaStore`] built with `Default`.
const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Key-value storage behind [`CachedRead`].
pub trait CacheStore<V>: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<V>, CacheError>;
    fn insert(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError>;
    fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    ttl: Duration,
}

/// Expires every entry after the TTL it was inserted with.
struct PerEntryTtl;

impl<V> Expiry<String, Entry<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process store on a bounded `moka` cache.
#[derive(Clone)]
pub struct MokaStore<V: Clone + Send + Sync + 'static> {
    cache: Cache<String, Entry<V>>,
}

impl<V: Clone + Send + Sync + 'static> MokaStore<V> {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl<V: Clone + Send + Sync + 'static> Default for MokaStore<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl<V: Clone + Send + Sync + 'static> std::fmt::Debug for MokaStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> CacheStore<V> for MokaStore<V> {
    fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        Ok(self.cache.get(key).map(|entry| entry.value))
    }

    fn insert(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        self.cache.insert(key.to_string(), Entry { value, ttl });
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key);
        Ok(())
    }
}

/// How a cached read was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from the store
    Hit,
    /// Loaded and stored
    Miss,
    /// Loaded; the store failed on read or write
    Degraded(CacheError),
}

/// A value together with how it was obtained.
#[derive(Debug, Clone)]
pub struct Cached<V> {
    pub value: V,
    pub outcome: CacheOutcome,
}

/// Read-through decorator over a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct CachedRead<V, S = MokaStore<V>>
where
    V: Clone + Send + Sync + 'static,
{
    store: S,
    _value: std::marker::PhantomData<fn() -> V>,
}

impl<V, S> CachedRead<V, S>
where
    V: Clone + Send + Sync + 'static,
    S: CacheStore<V>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _value: std::marker::PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the stored value for `key`, or run `load` and store its result.
    ///
    /// Loader errors are returned unchanged and nothing is stored for them.
    #[instrument(name = "Cached Read", skip(self, load), level = "debug")]
    pub fn get_or_load<E, F>(&self, key: &str, ttl: Duration, load: F) -> Result<Cached<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let read_error = match self.store.get(key) {
            Ok(Some(value)) => {
                debug!("Cache hit");
                return Ok(Cached {
                    value,
                    outcome: CacheOutcome::Hit,
                });
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Cache read failed, loading directly");
                Some(e)
            }
        };

        let value = load()?;

        let write_error = match self.store.insert(key, value.clone(), ttl) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Cache write failed");
                Some(e)
            }
        };

        let outcome = match read_error.or(write_error) {
            Some(e) => CacheOutcome::Degraded(e),
            None => {
                debug!("Cache miss, value stored");
                CacheOutcome::Miss
            }
        };
        Ok(Cached { value, outcome })
    }

    pub fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.store.invalidate(key)
    }
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum CacheError {
        #[error("Cache store unavailable: {0}")]
        Unavailable(String),
    }
}
