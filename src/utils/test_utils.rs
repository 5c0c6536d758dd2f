use crate::{
    database::db_structs::{
        AdvanceRateSnapshot, DraftEntry, EntryPeriodScore, Period, Pick, Player, RosterStructure, ScoreRecord, Team,
        UsablePoints
    },
    model::structures::{draft_clock::DraftClock, roster_slot::RosterSlot}
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strum::IntoEnumIterator;

pub fn generate_player(id: i32, slot: RosterSlot, team_id: Option<i32>, adp: Option<f64>) -> Player {
    Player {
        id,
        first_name: "Player".to_string(),
        last_name: id.to_string(),
        slot,
        team_id,
        adp
    }
}

pub fn generate_team(id: i32, name: &str, abbr: &str) -> Team {
    Team {
        id,
        name: name.to_string(),
        abbr: abbr.to_string()
    }
}

/// An entry whose picks follow `player_ids` order, numbered from 1.
pub fn generate_entry(id: &str, username: &str, player_ids: &[i32], advancing: bool, points: f64) -> DraftEntry {
    let draft_start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let picks = player_ids
        .iter()
        .enumerate()
        .map(|(i, player_id)| Pick {
            draft_entry_id: id.to_string(),
            player_id: *player_id,
            overall_pick_number: i as i32 + 1,
            pick_created_time: draft_start + Duration::seconds(30 * i as i64)
        })
        .collect();

    DraftEntry {
        id: id.to_string(),
        username: username.to_string(),
        draft_id: format!("draft-{}", id),
        pick_order: 1,
        draft_clock: DraftClock::Fast,
        draft_filled_time: Some(draft_start.naive_utc()),
        picks,
        structure: RosterStructure::default(),
        league_place: None,
        advancing,
        wild_card: false,
        cumulative_points: points,
        period_scores: Vec::new(),
        usable_points: Vec::new()
    }
}

pub fn generate_period_score(draft_entry_id: &str, period_id: i32, total_points: f64) -> EntryPeriodScore {
    EntryPeriodScore {
        draft_entry_id: draft_entry_id.to_string(),
        period_id,
        total_points
    }
}

pub fn generate_usable_points(draft_entry_id: &str, player_id: i32, total_points: f64, used_points: f64) -> UsablePoints {
    UsablePoints {
        draft_entry_id: draft_entry_id.to_string(),
        player_id,
        total_points,
        used_points
    }
}

pub fn generate_snapshot(player_id: i32, date: NaiveDate, advance_rate: f64) -> AdvanceRateSnapshot {
    AdvanceRateSnapshot {
        player_id,
        date,
        advance_rate
    }
}

/// `count` periods with ids starting at `first_id` and numbers starting at 1.
pub fn generate_periods(first_id: i32, count: i32) -> Vec<Period> {
    (0..count)
        .map(|i| Period {
            period_id: first_id + i,
            period_number: i + 1
        })
        .collect()
}

pub fn generate_score(player_id: i32, period_id: i32, raw_total: f64) -> ScoreRecord {
    ScoreRecord {
        player_id,
        date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        period_id,
        raw_total,
        opponent: None
    }
}

pub fn generate_score_on(player_id: i32, period_id: i32, date: NaiveDate, raw_total: f64, opponent: &str) -> ScoreRecord {
    ScoreRecord {
        player_id,
        date,
        period_id,
        raw_total,
        opponent: Some(opponent.to_string())
    }
}

/// A seeded random season: `n_players` players spread over every slot and
/// four teams, `n_periods` periods (ids from 1), one record per player per
/// period, and `n_entries` entries of six picks each.
pub fn generate_season(
    n_players: i32,
    n_periods: i32,
    n_entries: usize
) -> (Vec<Player>, Vec<Team>, Vec<Period>, Vec<ScoreRecord>, Vec<DraftEntry>) {
    // Initialize seeded RNG for reproducible results
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let slots: Vec<RosterSlot> = RosterSlot::iter().collect();

    let teams: Vec<Team> = (1..=4)
        .map(|id| generate_team(id, &format!("Team {}", id), &format!("T{}", id)))
        .collect();

    let players: Vec<Player> = (1..=n_players)
        .map(|id| {
            let slot = slots[rng.random_range(0..slots.len())];
            let adp = if rng.random_bool(0.1) {
                None
            } else {
                Some(rng.random_range(1.0..=300.0))
            };
            generate_player(id, slot, Some(rng.random_range(1..=4)), adp)
        })
        .collect();

    let periods = generate_periods(1, n_periods);

    let mut records = Vec::new();
    for player in &players {
        for period in &periods {
            // Round to quarter points so sums are exact
            let total = (rng.random_range(-20.0..60.0_f64) * 4.0).round() / 4.0;
            records.push(generate_score(player.id, period.period_id, total));
        }
    }

    let entries = (0..n_entries)
        .map(|i| {
            let picks: Vec<i32> = (0..6).map(|_| rng.random_range(1..=n_players)).collect();
            let points = (rng.random_range(500.0..1500.0_f64) * 4.0).round() / 4.0;
            let mut entry = generate_entry(
                &format!("entry-{}", i),
                &format!("user{}", i % 7),
                &picks,
                rng.random_bool(0.3),
                points
            );
            entry.pick_order = rng.random_range(1..=12);
            entry.draft_clock = if rng.random_bool(0.5) {
                DraftClock::Fast
            } else {
                DraftClock::Slow
            };
            entry
        })
        .collect();

    (players, teams, periods, records, entries)
}
