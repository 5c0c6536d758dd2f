use crate::model::structures::{draft_clock::DraftClock, roster_slot::RosterSlot};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub slot: RosterSlot,
    pub team_id: Option<i32>,
    /// Final average draft position. `None` when the source reports it as unknown.
    pub adp: Option<f64>
}

impl Player {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub abbr: String
}

/// One row per player per game date. Several rows may share a period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    pub player_id: i32,
    pub date: NaiveDate,
    pub period_id: i32,
    pub raw_total: f64,
    pub opponent: Option<String>
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub period_id: i32,
    pub period_number: i32
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pick {
    pub draft_entry_id: String,
    pub player_id: i32,
    pub overall_pick_number: i32,
    pub pick_created_time: DateTime<Utc>
}

/// Count of roster slots filled by an entry's picks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterStructure {
    pub pitchers: u8,
    pub infielders: u8,
    pub outfielders: u8
}

impl RosterStructure {
    /// Counts saturate at `u8::MAX`.
    pub fn count(&mut self, slot: RosterSlot) {
        let counter = match slot {
            RosterSlot::Pitcher => &mut self.pitchers,
            RosterSlot::Infielder => &mut self.infielders,
            RosterSlot::Outfielder => &mut self.outfielders
        };
        *counter = counter.saturating_add(1);
    }
}

/// An entry's official score for one scoring period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryPeriodScore {
    pub draft_entry_id: String,
    pub period_id: i32,
    pub total_points: f64
}

/// What a rostered player scored for an entry, and how much of it counted
/// toward the entry's best-ball lineup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsablePoints {
    pub draft_entry_id: String,
    pub player_id: i32,
    pub total_points: f64,
    pub used_points: f64
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftEntry {
    pub id: String,
    pub username: String,
    pub draft_id: String,
    /// Starting position in the draft (1-based)
    pub pick_order: i32,
    pub draft_clock: DraftClock,
    pub draft_filled_time: Option<NaiveDateTime>,
    /// Sorted by overall pick number
    pub picks: Vec<Pick>,
    /// Populated when the tables are indexed
    pub structure: RosterStructure,
    pub league_place: Option<i32>,
    pub advancing: bool,
    pub wild_card: bool,
    pub cumulative_points: f64,
    /// Ordered by period id
    pub period_scores: Vec<EntryPeriodScore>,
    pub usable_points: Vec<UsablePoints>
}

impl DraftEntry {
    pub fn has_player(&self, player_id: i32) -> bool {
        self.picks.iter().any(|p| p.player_id == player_id)
    }

    /// Points the player contributed to the lineup. Zero when none were recorded.
    pub fn used_points(&self, player_id: i32) -> f64 {
        self.usable_points
            .iter()
            .find(|u| u.player_id == player_id)
            .map(|u| u.used_points)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvanceRateSnapshot {
    pub player_id: i32,
    pub date: NaiveDate,
    pub advance_rate: f64
}
