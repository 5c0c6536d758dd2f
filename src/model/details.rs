//! Single-subject queries: one player, one entry, one user, and name search.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::{
    database::{
        db_structs::{AdvanceRateSnapshot, DraftEntry, Player},
        fact_store::FactTables
    },
    error::EngineError,
    model::{
        baseline::{median, Baseline},
        constants::{SEARCH_LIMIT, SEARCH_MIN_TERM_LEN, TEAM_SCORE_LAST_PERIOD, TOP_DRAFTERS_LIMIT},
        exposure::{ratio, AdvanceRateSeries, DrafterCount, ExposureCalculator, ExposureMetric, ExposureScope},
        leaderboard::{team_abbr, team_row, LeaderboardEngine, TeamRow},
        ranking::{desc, rank_index},
        score_aggregator::{DailyScore, ScoreAggregator},
        structures::{period_cell::PeriodCell, roster_slot::RosterSlot}
    }
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub player_id: i32,
    pub name: String,
    pub slot: RosterSlot,
    pub team: Option<String>,
    pub adp: Option<f64>
}

impl PlayerSummary {
    fn new(tables: &FactTables, player: &Player) -> PlayerSummary {
        PlayerSummary {
            player_id: player.id,
            name: player.display_name(),
            slot: player.slot,
            team: team_abbr(tables, player),
            adp: player.adp
        }
    }
}

/// One time the player was drafted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdpPick {
    pub draft_entry_id: String,
    pub username: String,
    pub overall_pick_number: i32,
    pub pick_created_time: DateTime<Utc>,
    pub advancing: bool
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    #[serde(flatten)]
    pub player: PlayerSummary,
    pub total_score: f64,
    pub periods: BTreeMap<i32, PeriodCell>,
    pub exposure: ExposureMetric,
    pub advance_rate_history: Vec<AdvanceRateSnapshot>,
    pub advance_rate_delta: Option<f64>,
    pub top_drafters: Vec<DrafterCount>,
    pub daily_history: Vec<DailyScore>,
    /// Every pick of the player, oldest first
    pub adp_history: Vec<AdpPick>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterPlayer {
    #[serde(flatten)]
    pub player: PlayerSummary,
    pub overall_pick_number: i32,
    pub total_score: f64,
    /// Share of the player's points that counted for this entry
    pub used_points: f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    pub entry: TeamRow,
    /// Pitchers, then infielders, then outfielders; pick order within a slot
    pub roster: Vec<RosterPlayer>,
    /// Median of the roster's used points
    pub roster_median: Baseline,
    /// Entry score per period number, up to the last regular-season period
    pub periods: BTreeMap<i32, PeriodCell>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserExposureRow {
    #[serde(flatten)]
    pub player: PlayerSummary,
    pub exposure: ExposureMetric
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub total_drafts: u32,
    pub advanced_count: u32,
    pub advance_rate: f64,
    /// Highest scoring first
    pub entries: Vec<TeamRow>,
    /// Exposure measured against this user's entries only
    pub exposures: Vec<UserExposureRow>
}

/// Picks of `player_id` across all entries, ordered by pick time, then pick
/// number, then entry id.
fn adp_history(entries: &[DraftEntry], player_id: i32) -> Vec<AdpPick> {
    entries
        .iter()
        .flat_map(|entry| {
            entry
                .picks
                .iter()
                .filter(move |p| p.player_id == player_id)
                .map(move |pick| AdpPick {
                    draft_entry_id: entry.id.clone(),
                    username: entry.username.clone(),
                    overall_pick_number: pick.overall_pick_number,
                    pick_created_time: pick.pick_created_time,
                    advancing: entry.advancing
                })
        })
        .sorted_by(|a, b| {
            a.pick_created_time
                .cmp(&b.pick_created_time)
                .then(a.overall_pick_number.cmp(&b.overall_pick_number))
                .then_with(|| a.draft_entry_id.cmp(&b.draft_entry_id))
        })
        .collect()
}

/// Dense over the season's periods numbered up to `TEAM_SCORE_LAST_PERIOD`.
/// Official entry scores, so exclusions do not apply.
fn team_periods(tables: &FactTables, entry: &DraftEntry) -> BTreeMap<i32, PeriodCell> {
    let mut periods: BTreeMap<i32, PeriodCell> = tables
        .periods()
        .iter()
        .filter(|p| p.period_number <= TEAM_SCORE_LAST_PERIOD)
        .map(|p| (p.period_number, PeriodCell::NoData))
        .collect();

    for score in &entry.period_scores {
        let Some(number) = tables.period_number(score.period_id) else {
            continue;
        };
        if let Some(cell) = periods.get_mut(&number) {
            cell.add(score.total_points);
        }
    }

    periods
}

/// Normalized search term, or `None` when it is too short to search with.
fn search_term(term: &str) -> Option<String> {
    let term = term.trim();
    if term.chars().count() < SEARCH_MIN_TERM_LEN {
        return None;
    }

    Some(term.to_lowercase())
}

impl LeaderboardEngine {
    pub fn player_profile(&self, player_id: i32) -> Result<PlayerProfile, EngineError> {
        let tables = self.snapshot()?;
        let player = tables.player(player_id).ok_or(EngineError::UnknownPlayer(player_id))?;

        let aggregator = ScoreAggregator::new(&tables, &self.config().exclusions);
        let score = aggregator.player_score(player_id);
        let calculator = ExposureCalculator::for_scope(tables.entries(), &ExposureScope::Global);
        let history = tables.advance_rate_history(player_id);

        Ok(PlayerProfile {
            player: PlayerSummary::new(&tables, player),
            total_score: score.total_score,
            periods: aggregator.pivot(&score),
            exposure: calculator.exposure(player_id),
            advance_rate_history: history.to_vec(),
            advance_rate_delta: AdvanceRateSeries::new(history).delta(),
            top_drafters: calculator.top_drafters(player_id, TOP_DRAFTERS_LIMIT),
            daily_history: aggregator.daily_history(player_id),
            adp_history: adp_history(tables.entries(), player_id)
        })
    }

    pub fn team_detail(&self, draft_entry_id: &str) -> Result<TeamDetail, EngineError> {
        let tables = self.snapshot()?;
        let entry = tables
            .entry(draft_entry_id)
            .ok_or_else(|| EngineError::UnknownEntry(draft_entry_id.to_string()))?;

        let aggregator = ScoreAggregator::new(&tables, &self.config().exclusions);
        let roster = entry
            .picks
            .iter()
            .filter_map(|pick| tables.player(pick.player_id).map(|player| (pick, player)))
            .sorted_by_key(|(pick, player)| (player.slot.roster_order(), pick.overall_pick_number))
            .map(|(pick, player)| RosterPlayer {
                player: PlayerSummary::new(&tables, player),
                overall_pick_number: pick.overall_pick_number,
                total_score: aggregator.total_score(player.id),
                used_points: entry.used_points(player.id)
            })
            .collect_vec();

        let overall_rank = rank_index(tables.entries(), |e| e.id.clone(), |e| e.cumulative_points)
            .get(&entry.id)
            .copied()
            .unwrap_or_default();

        Ok(TeamDetail {
            entry: team_row(entry, overall_rank),
            roster_median: median(roster.iter().map(|p| p.used_points)),
            periods: team_periods(&tables, entry),
            roster
        })
    }

    pub fn user_summary(&self, username: &str) -> Result<UserSummary, EngineError> {
        let tables = self.snapshot()?;
        let scope = ExposureScope::User(username.to_string());
        let calculator = ExposureCalculator::for_scope(tables.entries(), &scope);

        if calculator.population_size() == 0 {
            return Err(EngineError::UnknownUser(username.to_string()));
        }

        let overall_ranks = rank_index(tables.entries(), |e| e.id.clone(), |e| e.cumulative_points);
        let user_entries = tables.entries().iter().filter(|e| scope.contains(e)).collect_vec();
        let advanced_count = user_entries.iter().filter(|e| e.advancing).count();

        let entries = user_entries
            .iter()
            .map(|e| team_row(e, overall_ranks.get(&e.id).copied().unwrap_or_default()))
            .sorted_by(|a, b| {
                desc(a.cumulative_points, b.cumulative_points).then_with(|| a.draft_entry_id.cmp(&b.draft_entry_id))
            })
            .collect_vec();

        let exposures = calculator
            .exposure_table()
            .into_values()
            .filter_map(|exposure| {
                tables.player(exposure.player_id).map(|player| UserExposureRow {
                    player: PlayerSummary::new(&tables, player),
                    exposure
                })
            })
            .sorted_by(|a, b| {
                b.exposure
                    .drafted_count
                    .cmp(&a.exposure.drafted_count)
                    .then(a.player.player_id.cmp(&b.player.player_id))
            })
            .collect_vec();

        debug!(%scope, entries = entries.len(), players = exposures.len(), "Built user summary");

        Ok(UserSummary {
            username: username.to_string(),
            total_drafts: entries.len() as u32,
            advanced_count: advanced_count as u32,
            advance_rate: ratio(advanced_count, entries.len()),
            entries,
            exposures
        })
    }

    /// Players whose name contains `term`, case-insensitively, ordered by name.
    pub fn search_players(&self, term: &str) -> Result<Vec<PlayerSummary>, EngineError> {
        let Some(term) = search_term(term) else {
            return Ok(Vec::new());
        };
        let tables = self.snapshot()?;

        Ok(tables
            .players()
            .iter()
            .filter(|p| p.display_name().to_lowercase().contains(&term))
            .map(|p| PlayerSummary::new(&tables, p))
            .sorted_by(|a, b| a.name.cmp(&b.name).then(a.player_id.cmp(&b.player_id)))
            .take(SEARCH_LIMIT)
            .collect())
    }

    /// Distinct usernames containing `term`, case-insensitively, in order.
    pub fn search_users(&self, term: &str) -> Result<Vec<String>, EngineError> {
        let Some(term) = search_term(term) else {
            return Ok(Vec::new());
        };
        let tables = self.snapshot()?;

        let usernames: BTreeSet<&str> = tables
            .entries()
            .iter()
            .map(|e| e.username.as_str())
            .filter(|u| u.to_lowercase().contains(&term))
            .collect();

        Ok(usernames.into_iter().take(SEARCH_LIMIT).map(str::to_string).collect())
    }
}
