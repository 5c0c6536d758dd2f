use std::sync::{Arc, Once};

use chrono::{Duration, TimeZone, Utc};
use draft_leaderboard::{
    config::{EngineConfig, ExclusionList},
    database::fact_store::{FactTables, MemoryFactStore},
    model::{
        cache::{ManualClock, TtlCache},
        leaderboard::LeaderboardEngine
    },
    utils::test_utils::generate_season
};

static INIT: Once = Once::new();

/// Initialize test environment with RUST_LOG=WARN
pub fn init_test_env() {
    INIT.call_once(|| {
        std::env::set_var("RUST_LOG", "warn");
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

#[allow(dead_code)]
/// Seeded season with 120 players, 8 periods and `n_entries` entries.
pub fn seeded_tables(n_entries: usize) -> FactTables {
    let (players, teams, periods, records, entries) = generate_season(120, 8, n_entries);
    FactTables::new(players, teams, periods, records, entries, vec![])
}

#[allow(dead_code)]
pub struct TestEngine {
    pub engine: Arc<LeaderboardEngine>,
    pub store: Arc<MemoryFactStore>,
    pub clock: Arc<ManualClock>
}

#[allow(dead_code)]
/// Engine over `tables` with a `TtlCache` driven by a manual clock.
pub fn engine_with_clock(tables: FactTables, ttl: Duration) -> TestEngine {
    let store = Arc::new(MemoryFactStore::new(tables));
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap()));
    let config = EngineConfig {
        exclusions: ExclusionList::new("2024-test", [3]),
        cache_ttl: ttl,
        ..Default::default()
    };
    let cache = Arc::new(TtlCache::new(clock.clone(), config.cache_ttl));

    TestEngine {
        engine: Arc::new(LeaderboardEngine::new(store.clone(), cache, config)),
        store,
        clock
    }
}
