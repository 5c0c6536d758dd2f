use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::{
    error::EngineError,
    model::{leaderboard::RankedView, structures::view_kind::ViewKind}
};

/// Source of the current time for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> ManualClock {
        ManualClock {
            now: Mutex::new(start)
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Memoizes the unfiltered ranked view, one entry per view.
pub trait ResultCache: Send + Sync {
    /// A fresh entry for `view`, if there is one
    fn lookup(&self, view: ViewKind) -> Option<Arc<RankedView>>;

    fn store(&self, view: ViewKind, value: Arc<RankedView>);
}

struct CacheEntry {
    computed_at: DateTime<Utc>,
    value: Arc<RankedView>
}

/// In-memory cache with time-based expiry.
///
/// Readers clone the `Arc` under a read lock and never observe a partially
/// written entry. Two refreshers racing on a stale entry both compute; the
/// last store wins.
pub struct TtlCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<ViewKind, CacheEntry>>
}

impl TtlCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> TtlCache {
        TtlCache {
            clock,
            ttl,
            entries: RwLock::new(HashMap::new())
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl ResultCache for TtlCache {
    fn lookup(&self, view: ViewKind) -> Option<Arc<RankedView>> {
        let now = self.clock.now();
        let entries = self.entries.read();
        let entry = entries.get(&view)?;

        if now - entry.computed_at < self.ttl {
            Some(Arc::clone(&entry.value))
        } else {
            None
        }
    }

    fn store(&self, view: ViewKind, value: Arc<RankedView>) {
        let entry = CacheEntry {
            computed_at: self.clock.now(),
            value
        };
        self.entries.write().insert(view, entry);
    }
}

/// Never holds anything. Every identity request recomputes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl ResultCache for NoopCache {
    fn lookup(&self, _view: ViewKind) -> Option<Arc<RankedView>> {
        None
    }

    fn store(&self, _view: ViewKind, _value: Arc<RankedView>) {}
}

/// Returns the cached view if fresh, otherwise computes and stores it. The
/// computation runs outside any lock; a failed computation stores nothing.
pub fn cached_or_compute(
    cache: &dyn ResultCache,
    view: ViewKind,
    compute: impl FnOnce() -> Result<RankedView, EngineError>
) -> Result<Arc<RankedView>, EngineError> {
    if let Some(hit) = cache.lookup(view) {
        debug!(%view, "Result cache hit");
        return Ok(hit);
    }

    debug!(%view, "Result cache miss, recomputing");
    let value = Arc::new(compute()?);
    cache.store(view, Arc::clone(&value));

    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use super::*;
    use crate::model::leaderboard::{ViewRows, ViewSummary};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()))
    }

    fn view() -> RankedView {
        RankedView {
            kind: ViewKind::TeamAdvanceRate,
            rows: ViewRows::TeamAdvanceRate(vec![]),
            summary: ViewSummary::None,
            advancing: None
        }
    }

    #[test]
    fn test_fresh_entry_is_returned_verbatim() {
        let clock = clock();
        let cache = TtlCache::new(clock.clone(), Duration::seconds(1800));
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(view())
        };

        let first = cached_or_compute(&cache, ViewKind::TeamAdvanceRate, compute).unwrap();
        clock.advance(Duration::seconds(1799));
        let second = cached_or_compute(&cache, ViewKind::TeamAdvanceRate, compute).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stale_entry_is_recomputed() {
        let clock = clock();
        let cache = TtlCache::new(clock.clone(), Duration::seconds(1800));
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(view())
        };

        let first = cached_or_compute(&cache, ViewKind::TeamAdvanceRate, compute).unwrap();
        clock.advance(Duration::seconds(1800));
        let second = cached_or_compute(&cache, ViewKind::TeamAdvanceRate, compute).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The refreshed entry is fresh again
        let third = cached_or_compute(&cache, ViewKind::TeamAdvanceRate, compute).unwrap();
        assert!(Arc::ptr_eq(&second, &third));
    }

    #[test]
    fn test_views_are_cached_independently() {
        let cache = TtlCache::new(clock(), Duration::seconds(60));
        cache.store(ViewKind::TeamOverall, Arc::new(view()));

        assert!(cache.lookup(ViewKind::TeamOverall).is_some());
        assert!(cache.lookup(ViewKind::PlayerTotal).is_none());
    }

    #[test]
    fn test_failed_compute_never_stores() {
        let cache = TtlCache::new(clock(), Duration::seconds(60));

        let result = cached_or_compute(&cache, ViewKind::PlayerTotal, || {
            Err(EngineError::StoreUnavailable("connection reset".to_string()))
        });

        assert!(result.is_err());
        assert!(cache.lookup(ViewKind::PlayerTotal).is_none());
    }

    #[test]
    fn test_noop_cache_always_recomputes() {
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(view())
        };

        cached_or_compute(&NoopCache, ViewKind::TeamOverall, compute).unwrap();
        cached_or_compute(&NoopCache, ViewKind::TeamOverall, compute).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
