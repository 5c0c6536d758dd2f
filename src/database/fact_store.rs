use std::{collections::HashMap, sync::Arc};

use itertools::Itertools;
use parking_lot::RwLock;
use tracing::{info, warn};

use super::db_structs::{AdvanceRateSnapshot, DraftEntry, Period, Player, RosterStructure, ScoreRecord, Team};
use crate::error::EngineError;

/// A read-only snapshot of the season's fact tables.
///
/// Indexes are built once on construction; the snapshot is shared between
/// concurrent requests behind an `Arc` and never mutated afterwards.
#[derive(Debug, Default)]
pub struct FactTables {
    players: Vec<Player>,
    teams: Vec<Team>,
    periods: Vec<Period>,
    score_records: Vec<ScoreRecord>,
    entries: Vec<DraftEntry>,
    advance_rate_history: HashMap<i32, Vec<AdvanceRateSnapshot>>,

    player_index: HashMap<i32, usize>,
    team_index: HashMap<i32, usize>,
    entry_index: HashMap<String, usize>,
    period_numbers: HashMap<i32, i32>
}

impl FactTables {
    pub fn new(
        players: Vec<Player>,
        teams: Vec<Team>,
        mut periods: Vec<Period>,
        score_records: Vec<ScoreRecord>,
        mut entries: Vec<DraftEntry>,
        advance_rate_history: Vec<AdvanceRateSnapshot>
    ) -> FactTables {
        periods.sort_by_key(|p| p.period_number);

        let player_index: HashMap<i32, usize> = players.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        let team_index = teams.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        let period_numbers = periods.iter().map(|p| (p.period_id, p.period_number)).collect();

        for entry in entries.iter_mut() {
            entry.picks.sort_by_key(|p| p.overall_pick_number);
            entry.period_scores.sort_by_key(|s| s.period_id);

            let mut structure = RosterStructure::default();
            for pick in &entry.picks {
                match player_index.get(&pick.player_id) {
                    Some(idx) => structure.count(players[*idx].slot),
                    None => warn!(
                        draft_entry_id = %entry.id,
                        player_id = pick.player_id,
                        "Pick references an unknown player"
                    )
                }
            }
            entry.structure = structure;
        }

        let entry_index = entries.iter().enumerate().map(|(i, e)| (e.id.clone(), i)).collect();

        let advance_rate_history = advance_rate_history
            .into_iter()
            .sorted_by(|a, b| a.player_id.cmp(&b.player_id).then(a.date.cmp(&b.date)))
            .chunk_by(|s| s.player_id)
            .into_iter()
            .map(|(player_id, snapshots)| (player_id, snapshots.collect_vec()))
            .collect();

        info!(
            players = players.len(),
            entries = entries.len(),
            score_records = score_records.len(),
            periods = periods.len(),
            "Fact tables indexed"
        );

        FactTables {
            players,
            teams,
            periods,
            score_records,
            entries,
            advance_rate_history,
            player_index,
            team_index,
            entry_index,
            period_numbers
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Periods ordered by period number
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn score_records(&self) -> &[ScoreRecord] {
        &self.score_records
    }

    pub fn entries(&self) -> &[DraftEntry] {
        &self.entries
    }

    pub fn player(&self, player_id: i32) -> Option<&Player> {
        self.player_index.get(&player_id).map(|i| &self.players[*i])
    }

    pub fn team(&self, team_id: i32) -> Option<&Team> {
        self.team_index.get(&team_id).map(|i| &self.teams[*i])
    }

    pub fn entry(&self, draft_entry_id: &str) -> Option<&DraftEntry> {
        self.entry_index.get(draft_entry_id).map(|i| &self.entries[*i])
    }

    pub fn period_number(&self, period_id: i32) -> Option<i32> {
        self.period_numbers.get(&period_id).copied()
    }

    /// Snapshots for the player ordered by date. Empty when none were recorded.
    pub fn advance_rate_history(&self, player_id: i32) -> &[AdvanceRateSnapshot] {
        self.advance_rate_history
            .get(&player_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Read-only source of fact tables. Each request takes exactly one snapshot so
/// the whole pipeline observes a consistent view of the data.
pub trait FactStore: Send + Sync {
    fn snapshot(&self) -> Result<Arc<FactTables>, EngineError>;
}

/// In-memory store. The season is loaded once (see `DbClient::load_fact_tables`);
/// `replace` swaps in a fresh load without disturbing requests holding the old snapshot.
#[derive(Default)]
pub struct MemoryFactStore {
    tables: RwLock<Arc<FactTables>>
}

impl MemoryFactStore {
    pub fn new(tables: FactTables) -> MemoryFactStore {
        MemoryFactStore {
            tables: RwLock::new(Arc::new(tables))
        }
    }

    pub fn replace(&self, tables: FactTables) {
        *self.tables.write() = Arc::new(tables);
    }
}

impl FactStore for MemoryFactStore {
    fn snapshot(&self) -> Result<Arc<FactTables>, EngineError> {
        Ok(Arc::clone(&self.tables.read()))
    }
}
