use approx::assert_abs_diff_eq;
use serial_test::serial;

use super::test_helpers::TestDatabase;
use crate::common::init_test_env;
use draft_leaderboard::{
    database::{
        db::DbClient,
        fact_store::{FactStore, MemoryFactStore}
    },
    model::structures::{draft_clock::DraftClock, roster_slot::RosterSlot}
};

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_load_fact_tables() {
    init_test_env();
    let db = TestDatabase::new().await.unwrap();
    db.seed_test_data().await.unwrap();

    let client = DbClient::connect(&db.connection_string).await.unwrap();
    let tables = client.load_fact_tables().await.unwrap();

    // Unknown slot skipped
    assert_eq!(tables.players().len(), 3);
    assert!(tables.player(4).is_none());

    let ace = tables.player(1).unwrap();
    assert_eq!(ace.slot, RosterSlot::Pitcher);
    assert_eq!(ace.adp, Some(12.5));
    assert_eq!(tables.player(2).unwrap().adp, None);
    assert_eq!(tables.player(3).unwrap().adp, None);

    assert_eq!(tables.period_number(20), Some(2));
    assert_eq!(tables.periods()[0].period_id, 10);

    assert_eq!(tables.score_records().len(), 4);
    let negative = tables
        .score_records()
        .iter()
        .find(|r| r.player_id == 1 && r.period_id == 20)
        .unwrap();
    assert_abs_diff_eq!(negative.raw_total, -3.25);
    assert_eq!(negative.opponent, None);

    // Unknown draft clock skipped
    assert_eq!(tables.entries().len(), 2);
    assert!(tables.entry("e-bad").is_none());

    let first = tables.entry("e-1").unwrap();
    assert_eq!(first.draft_clock, DraftClock::Fast);
    assert_eq!(first.picks.len(), 2);
    assert_eq!(first.structure.pitchers, 1);
    assert_eq!(first.structure.infielders, 1);
    assert_eq!(first.league_place, Some(1));
    assert!(first.advancing);
    assert_abs_diff_eq!(first.cumulative_points, 1204.5);

    // Ordered by period id, NULL used points read as zero
    let period_ids: Vec<i32> = first.period_scores.iter().map(|s| s.period_id).collect();
    assert_eq!(period_ids, vec![10, 20]);
    assert_abs_diff_eq!(first.period_scores[0].total_points, 140.5);
    assert_eq!(first.usable_points.len(), 2);
    assert_abs_diff_eq!(first.used_points(1), 18.25);
    assert_abs_diff_eq!(first.used_points(2), 0.0);

    let second = tables.entry("e-2").unwrap();
    assert_eq!(second.draft_clock, DraftClock::Slow);
    assert!(second.wild_card);
    assert_eq!(second.draft_filled_time, None);
    assert!(second.period_scores.is_empty());
    assert!(second.usable_points.is_empty());

    let history = tables.advance_rate_history(1);
    assert_eq!(history.len(), 2);
    assert!(history[0].date < history[1].date);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_loaded_tables_serve_queries() {
    use draft_leaderboard::model::{
        baseline::Baseline,
        cache::NoopCache,
        leaderboard::{LeaderboardEngine, LeaderboardQuery},
        structures::view_kind::ViewKind
    };
    use std::sync::Arc;

    init_test_env();
    let db = TestDatabase::new().await.unwrap();
    db.seed_test_data().await.unwrap();

    let client = DbClient::connect(&db.connection_string).await.unwrap();
    let store = Arc::new(MemoryFactStore::new(client.load_fact_tables().await.unwrap()));
    assert_eq!(store.snapshot().unwrap().entries().len(), 2);

    let engine = LeaderboardEngine::new(store, Arc::new(NoopCache), Default::default());
    let page = engine.query(&LeaderboardQuery::new(ViewKind::TeamOverall)).unwrap();

    assert_eq!(page.total_count, 2);
    assert_eq!(page.advancing_count, Some(1));
    assert_eq!(page.advance_rate_pct, Some(50.0));

    let detail = engine.team_detail("e-1").unwrap();
    assert_abs_diff_eq!(detail.periods[&1].total(), 140.5);
    assert_abs_diff_eq!(detail.periods[&2].total(), 131.25);
    assert_eq!(detail.roster_median, Baseline::Value(9.125));
}
