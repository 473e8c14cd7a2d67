// Keyed TTL cache shielding the upstream API from repeated fetches.
//
// One `Cache` is shared by every query in the process. Entries are immutable
// once written and are replaced wholesale on refresh. Timestamps come from
// `tokio::time::Instant` so tests can drive expiry with a paused clock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::model::{
    Bootstrap, EntryId, Gameweek, GameweekPhase, LeagueId, LeagueStandings, LivePoints, Squad,
    TransferEvent,
};

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Bootstrap,
    LeagueStandings,
    Picks,
    Transfers,
    LivePoints,
}

/// `(resource kind, resource id, gameweek)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ResourceKind,
    pub id: u64,
    pub gameweek: Option<Gameweek>,
}

impl CacheKey {
    pub fn bootstrap() -> Self {
        Self {
            kind: ResourceKind::Bootstrap,
            id: 0,
            gameweek: None,
        }
    }

    pub fn league(league_id: LeagueId) -> Self {
        Self {
            kind: ResourceKind::LeagueStandings,
            id: league_id,
            gameweek: None,
        }
    }

    pub fn picks(entry_id: EntryId, gameweek: Gameweek) -> Self {
        Self {
            kind: ResourceKind::Picks,
            id: entry_id,
            gameweek: Some(gameweek),
        }
    }

    pub fn transfers(entry_id: EntryId, gameweek: Gameweek) -> Self {
        Self {
            kind: ResourceKind::Transfers,
            id: entry_id,
            gameweek: Some(gameweek),
        }
    }

    pub fn live(gameweek: Gameweek) -> Self {
        Self {
            kind: ResourceKind::LivePoints,
            id: 0,
            gameweek: Some(gameweek),
        }
    }
}

// ---------------------------------------------------------------------------
// TTL policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    For(Duration),
    Forever,
}

/// Lifetime per key class. Per-gameweek resources depend on the gameweek's
/// phase: finished gameweeks no longer change upstream, live ones do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub bootstrap: Ttl,
    pub league: Ttl,
    pub live: Ttl,
    pub finished: Ttl,
}

impl TtlPolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            bootstrap: Ttl::For(Duration::from_secs(config.bootstrap_ttl_secs)),
            league: Ttl::For(Duration::from_secs(config.league_ttl_secs)),
            live: Ttl::For(Duration::from_secs(config.live_ttl_secs)),
            finished: config
                .finished_ttl_secs
                .map(|s| Ttl::For(Duration::from_secs(s)))
                .unwrap_or(Ttl::Forever),
        }
    }

    pub fn ttl(&self, kind: ResourceKind, phase: GameweekPhase) -> Ttl {
        match kind {
            ResourceKind::Bootstrap => self.bootstrap,
            ResourceKind::LeagueStandings => self.league,
            ResourceKind::Picks | ResourceKind::Transfers | ResourceKind::LivePoints => {
                match phase {
                    GameweekPhase::Finished => self.finished,
                    GameweekPhase::Live | GameweekPhase::Upcoming => self.live,
                }
            }
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Payload {
    Bootstrap(Arc<Bootstrap>),
    League(Arc<LeagueStandings>),
    Squad(Arc<Squad>),
    Transfers(Arc<Vec<TransferEvent>>),
    Live(Arc<LivePoints>),
}

/// A value type that can be stored in the [`Cache`].
pub trait Cacheable: Send + Sync + Sized + 'static {
    fn wrap(value: Arc<Self>) -> Payload;
    fn unwrap(payload: &Payload) -> Option<Arc<Self>>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn wrap(value: Arc<Self>) -> Payload {
                Payload::$variant(value)
            }

            fn unwrap(payload: &Payload) -> Option<Arc<Self>> {
                match payload {
                    Payload::$variant(v) => Some(Arc::clone(v)),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Bootstrap, Bootstrap);
cacheable!(LeagueStandings, League);
cacheable!(Squad, Squad);
cacheable!(Vec<TransferEvent>, Transfers);
cacheable!(LivePoints, Live);

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Entry {
    payload: Payload,
    fetched_at: Instant,
    ttl: Ttl,
}

impl Entry {
    fn is_fresh(&self, now: Instant) -> bool {
        match self.ttl {
            Ttl::Forever => true,
            Ttl::For(ttl) => now.saturating_duration_since(self.fetched_at) < ttl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct Cache {
    entries: Mutex<HashMap<CacheKey, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key` if present and unexpired, otherwise
    /// run `fetch`, store its result and return it.
    ///
    /// A failed fetch propagates and leaves the cache untouched. Concurrent
    /// misses on the same key may each fetch; the last write wins.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: CacheKey, ttl: Ttl, fetch: F) -> Result<Arc<T>>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.lookup::<T>(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(?key, "cache hit");
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let purged = self.purge_expired();
        debug!(?key, purged, "cache miss");

        let value = Arc::new(fetch().await?);
        self.insert(key, T::wrap(Arc::clone(&value)), ttl);
        Ok(value)
    }

    fn lookup<T: Cacheable>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let now = Instant::now();
        let entries = self.lock();
        entries
            .get(key)
            .filter(|e| e.is_fresh(now))
            .and_then(|e| T::unwrap(&e.payload))
    }

    fn insert(&self, key: CacheKey, payload: Payload, ttl: Ttl) {
        let entry = Entry {
            payload,
            fetched_at: Instant::now(),
            ttl,
        };
        self.lock().insert(key, entry);
    }

    /// Drop every entry. Used for an explicit refresh.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop entries whose TTL has elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.is_fresh(now));
        before - entries.len()
    }

    pub fn contains_fresh(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        self.lock().get(key).is_some_and(|e| e.is_fresh(now))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        // Entries are replaced whole, so a panic mid-insert cannot leave a
        // torn value behind.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
