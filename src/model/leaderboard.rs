//! The leaderboard pipeline: validate the filter, take one snapshot, compute
//! the ranked view (or fetch it from the cache for the unfiltered case) and
//! cut the requested page.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc
};

use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::EngineConfig,
    database::{
        db_structs::{DraftEntry, Player},
        fact_store::{FactStore, FactTables}
    },
    error::EngineError,
    model::{
        baseline::{median, median_where, percentile, period_rank_baselines, Baseline, PeriodBaselines},
        cache::{cached_or_compute, ResultCache, SystemClock, TtlCache},
        exposure::{ratio, ExposureCalculator, ExposureMetric},
        filter::{EntryFilter, EntryPredicates, PlayerFilter, PlayerPredicates, RawEntryFilter, RawPlayerFilter},
        ranking::{desc, paginate, rank_by, rank_index, Ranked},
        score_aggregator::{PlayerScore, ScoreAggregator},
        structures::{
            draft_clock::DraftClock, period_cell::PeriodCell, roster_slot::RosterSlot, view_kind::ViewKind
        }
    }
};

/// One leaderboard request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub view: ViewKind,
    #[serde(default)]
    pub entry_filter: RawEntryFilter,
    /// Ignored by the team views
    #[serde(default)]
    pub player_filter: RawPlayerFilter,
    #[serde(default)]
    pub offset: usize,
    /// Advance-rate view only. Defaults to `EngineConfig::min_drafts`.
    pub min_drafts: Option<u32>
}

impl LeaderboardQuery {
    pub fn new(view: ViewKind) -> LeaderboardQuery {
        LeaderboardQuery {
            view,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerTotalRow {
    pub player_id: i32,
    pub name: String,
    pub slot: RosterSlot,
    pub team: Option<String>,
    pub adp: Option<f64>,
    pub total_score: f64,
    pub drafted_count: u32,
    pub exposure_pct: f64,
    pub advance_rate: f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerWeeklyRow {
    pub player_id: i32,
    pub name: String,
    pub slot: RosterSlot,
    pub team: Option<String>,
    pub adp: Option<f64>,
    pub total_score: f64,
    pub drafted_count: u32,
    pub exposure_pct: f64,
    /// Dense over the view's period columns
    pub periods: BTreeMap<i32, PeriodCell>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRow {
    pub draft_entry_id: String,
    pub username: String,
    pub draft_id: String,
    pub pick_order: i32,
    pub draft_clock: DraftClock,
    pub draft_filled_time: Option<NaiveDateTime>,
    pub league_place: Option<i32>,
    pub advancing: bool,
    pub wild_card: bool,
    pub cumulative_points: f64,
    /// Rank among every entry of the season, regardless of the filter
    pub overall_rank: u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAdvanceRow {
    pub username: String,
    pub total_drafts: u32,
    pub advanced_count: u32,
    pub advance_rate: f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViewRows {
    PlayerTotal(Vec<Ranked<PlayerTotalRow>>),
    PlayerWeekly(Vec<Ranked<PlayerWeeklyRow>>),
    TeamOverall(Vec<Ranked<TeamRow>>),
    TeamAdvanceRate(Vec<Ranked<UserAdvanceRow>>)
}

impl ViewRows {
    pub fn len(&self) -> usize {
        match self {
            ViewRows::PlayerTotal(rows) => rows.len(),
            ViewRows::PlayerWeekly(rows) => rows.len(),
            ViewRows::TeamOverall(rows) => rows.len(),
            ViewRows::TeamAdvanceRate(rows) => rows.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn window(&self, offset: usize, page_size: usize) -> ViewRows {
        match self {
            ViewRows::PlayerTotal(rows) => ViewRows::PlayerTotal(paginate(rows, offset, page_size).rows),
            ViewRows::PlayerWeekly(rows) => ViewRows::PlayerWeekly(paginate(rows, offset, page_size).rows),
            ViewRows::TeamOverall(rows) => ViewRows::TeamOverall(paginate(rows, offset, page_size).rows),
            ViewRows::TeamAdvanceRate(rows) => ViewRows::TeamAdvanceRate(paginate(rows, offset, page_size).rows)
        }
    }
}

/// View-level values computed over the whole population, not the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViewSummary {
    Median {
        median: Baseline,
        /// Median over the players owned at or above `EngineConfig::owned_baseline_min_pct`
        owned_median: Baseline
    },
    Weekly {
        period_columns: Vec<i32>,
        baselines: PeriodBaselines
    },
    Teams {
        wild_card_cutoff: Option<f64>,
        /// Cumulative points at the given percentile of the filtered entries
        points_percentile: f64,
        points_at_percentile: Baseline
    },
    None
}

/// Advancing entries out of the entries a team view was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvanceTally {
    pub advancing_count: usize,
    pub entry_count: usize
}

impl AdvanceTally {
    pub fn of<'a>(entries: impl IntoIterator<Item = &'a DraftEntry>) -> AdvanceTally {
        entries.into_iter().fold(AdvanceTally::default(), |tally, entry| AdvanceTally {
            advancing_count: tally.advancing_count + usize::from(entry.advancing),
            entry_count: tally.entry_count + 1
        })
    }

    pub fn rate_pct(&self) -> f64 {
        ratio(self.advancing_count, self.entry_count) * 100.0
    }
}

/// A fully ranked view, before pagination. This is what the cache holds.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedView {
    pub kind: ViewKind,
    pub rows: ViewRows,
    pub summary: ViewSummary,
    /// Team views only
    pub advancing: Option<AdvanceTally>
}

impl RankedView {
    pub fn page(&self, offset: usize, page_size: usize, exclusion_version: &str) -> LeaderboardPage {
        let total_count = self.rows.len();
        let rows = self.rows.window(offset, page_size);

        LeaderboardPage {
            view: self.kind,
            exclusion_version: exclusion_version.to_string(),
            offset,
            page_size,
            total_count,
            has_next: offset.saturating_add(rows.len()) < total_count,
            advancing_count: self.advancing.map(|t| t.advancing_count),
            advance_rate_pct: self.advancing.map(|t| t.rate_pct()),
            summary: self.summary.clone(),
            rows
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardPage {
    pub view: ViewKind,
    /// Version of the exclusion list the scores were computed with
    pub exclusion_version: String,
    pub offset: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub has_next: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advancing_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_rate_pct: Option<f64>,
    pub summary: ViewSummary,
    pub rows: ViewRows
}

/// Entry point for every query. Cheap to share between threads.
pub struct LeaderboardEngine {
    store: Arc<dyn FactStore>,
    cache: Arc<dyn ResultCache>,
    config: EngineConfig
}

impl LeaderboardEngine {
    pub fn new(store: Arc<dyn FactStore>, cache: Arc<dyn ResultCache>, config: EngineConfig) -> LeaderboardEngine {
        LeaderboardEngine { store, cache, config }
    }

    /// Engine with a wall-clock `TtlCache` using `config.cache_ttl`.
    pub fn with_ttl_cache(store: Arc<dyn FactStore>, config: EngineConfig) -> LeaderboardEngine {
        let cache = Arc::new(TtlCache::new(Arc::new(SystemClock), config.cache_ttl));
        LeaderboardEngine::new(store, cache, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn snapshot(&self) -> Result<Arc<FactTables>, EngineError> {
        self.store.snapshot()
    }

    pub fn query(&self, query: &LeaderboardQuery) -> Result<LeaderboardPage, EngineError> {
        // A rejected filter never reaches the store
        let entry_filter = EntryFilter::try_from(&query.entry_filter)?;
        let player_filter = match query.view {
            ViewKind::PlayerTotal | ViewKind::PlayerWeekly => PlayerFilter::try_from(&query.player_filter)?,
            ViewKind::TeamOverall | ViewKind::TeamAdvanceRate => PlayerFilter::default()
        };
        let min_drafts = query.min_drafts.unwrap_or(self.config.min_drafts);

        let identity = entry_filter.is_identity() && player_filter.is_identity() && min_drafts == self.config.min_drafts;

        let compute = || -> Result<RankedView, EngineError> {
            let tables = self.snapshot()?;
            Ok(self.compute(&tables, query.view, &entry_filter, &player_filter, min_drafts))
        };

        let view = if identity {
            cached_or_compute(self.cache.as_ref(), query.view, compute)?
        } else {
            Arc::new(compute()?)
        };

        Ok(view.page(query.offset, self.config.page_size, &self.config.exclusions.version))
    }

    fn compute(
        &self,
        tables: &FactTables,
        kind: ViewKind,
        entry_filter: &EntryFilter,
        player_filter: &PlayerFilter,
        min_drafts: u32
    ) -> RankedView {
        let entry_predicates = entry_filter.compose();

        let view = match kind {
            ViewKind::PlayerTotal => self.player_totals(tables, &entry_predicates, &player_filter.compose()),
            ViewKind::PlayerWeekly => self.player_weekly(tables, &entry_predicates, &player_filter.compose()),
            ViewKind::TeamOverall => team_overall(tables, &entry_predicates, self.config.team_points_percentile),
            ViewKind::TeamAdvanceRate => user_advance_rates(tables, &entry_predicates, min_drafts)
        };

        info!(
            view = %kind,
            rows = view.rows.len(),
            exclusion_version = %self.config.exclusions.version,
            "Computed ranked view"
        );

        view
    }

    fn player_totals(
        &self,
        tables: &FactTables,
        entry_predicates: &EntryPredicates,
        player_predicates: &PlayerPredicates
    ) -> RankedView {
        let population = PlayerPopulation::build(tables, &self.config, entry_predicates);

        let rows = population
            .qualifying(tables, player_predicates)
            .map(|(player, score, exposure)| PlayerTotalRow {
                player_id: player.id,
                name: player.display_name(),
                slot: player.slot,
                team: team_abbr(tables, player),
                adp: player.adp,
                total_score: score.total_score,
                drafted_count: exposure.drafted_count,
                exposure_pct: exposure.exposure_pct,
                advance_rate: exposure.advance_rate
            })
            .collect_vec();

        let median = median(rows.iter().map(|r| r.total_score));
        let owned_median = median_where(
            &rows,
            |r| r.total_score,
            |r| r.exposure_pct * 100.0 >= self.config.owned_baseline_min_pct
        );
        let rows = rank_by(
            rows,
            |r| r.total_score,
            |a, b| {
                desc(a.total_score, b.total_score)
                    .then(b.drafted_count.cmp(&a.drafted_count))
                    .then(a.player_id.cmp(&b.player_id))
            }
        );

        RankedView {
            kind: ViewKind::PlayerTotal,
            rows: ViewRows::PlayerTotal(rows),
            summary: ViewSummary::Median { median, owned_median },
            advancing: None
        }
    }

    fn player_weekly(
        &self,
        tables: &FactTables,
        entry_predicates: &EntryPredicates,
        player_predicates: &PlayerPredicates
    ) -> RankedView {
        let population = PlayerPopulation::build(tables, &self.config, entry_predicates);
        let aggregator = ScoreAggregator::new(tables, &self.config.exclusions);
        let period_columns = aggregator.period_columns();

        // Baselines are league-wide replacement levels, independent of the filter
        let baselines = period_rank_baselines(
            tables,
            &population.scores,
            &period_columns,
            self.config.pitcher_baseline_rank,
            self.config.hitter_baseline_rank
        );

        let rows = population
            .qualifying(tables, player_predicates)
            .filter(|(_, _, exposure)| exposure.drafted_count > 0)
            .map(|(player, score, exposure)| PlayerWeeklyRow {
                player_id: player.id,
                name: player.display_name(),
                slot: player.slot,
                team: team_abbr(tables, player),
                adp: player.adp,
                total_score: score.total_score,
                drafted_count: exposure.drafted_count,
                exposure_pct: exposure.exposure_pct,
                periods: aggregator.pivot(score)
            })
            .collect_vec();

        let rows = rank_by(
            rows,
            |r| r.total_score,
            |a, b| {
                adp_ascending(a.adp, b.adp)
                    .then_with(|| a.name.cmp(&b.name))
                    .then(a.player_id.cmp(&b.player_id))
            }
        );

        RankedView {
            kind: ViewKind::PlayerWeekly,
            rows: ViewRows::PlayerWeekly(rows),
            summary: ViewSummary::Weekly {
                period_columns,
                baselines
            },
            advancing: None
        }
    }
}

/// Scores and exposures shared by both player views.
struct PlayerPopulation {
    scores: HashMap<i32, PlayerScore>,
    exposures: HashMap<i32, ExposureMetric>
}

impl PlayerPopulation {
    fn build(tables: &FactTables, config: &EngineConfig, entry_predicates: &EntryPredicates) -> PlayerPopulation {
        let scores = ScoreAggregator::new(tables, &config.exclusions).aggregate();

        // With an entry filter, exposure is measured against the filtered entries
        let entries = entry_predicates.apply(tables);
        debug!(entries = entries.len(), "Exposure population selected");
        let exposures = ExposureCalculator::new(entries).exposure_table();

        PlayerPopulation { scores, exposures }
    }

    /// Players with at least one qualifying record that pass the player predicates.
    /// Inclusion depends on having records, not on the sign of the total, so a
    /// player whose non-excluded periods net to zero or below is still listed.
    fn qualifying<'a>(
        &'a self,
        tables: &'a FactTables,
        player_predicates: &'a PlayerPredicates
    ) -> impl Iterator<Item = (&'a Player, &'a PlayerScore, ExposureMetric)> + 'a {
        tables
            .players()
            .iter()
            .filter_map(|player| {
                let score = self.scores.get(&player.id).filter(|s| s.qualifying_records > 0)?;
                Some((player, score))
            })
            .filter(|(player, _)| player_predicates.matches(player, &self.exposures))
            .map(|(player, score)| {
                let exposure = self
                    .exposures
                    .get(&player.id)
                    .copied()
                    .unwrap_or_else(|| ExposureMetric::undrafted(player.id));
                (player, score, exposure)
            })
    }
}

pub(crate) fn team_abbr(tables: &FactTables, player: &Player) -> Option<String> {
    player.team_id.and_then(|id| tables.team(id)).map(|t| t.abbr.clone())
}

/// Known ADP ascending, unknown ADP last.
fn adp_ascending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal
    }
}

fn team_overall(tables: &FactTables, entry_predicates: &EntryPredicates, points_percentile: f64) -> RankedView {
    let all = tables.entries();
    let overall_ranks = rank_index(all, |e| e.id.clone(), |e| e.cumulative_points);
    let wild_card_cutoff = all
        .iter()
        .filter(|e| e.wild_card)
        .map(|e| e.cumulative_points)
        .min_by(|a, b| a.total_cmp(b));

    let filtered = entry_predicates.apply(tables);
    let advancing = AdvanceTally::of(filtered.iter().copied());
    let points_at_percentile = percentile(filtered.iter().map(|e| e.cumulative_points), points_percentile);

    let rows = filtered
        .into_iter()
        .map(|entry| team_row(entry, overall_ranks.get(&entry.id).copied().unwrap_or_default()))
        .collect_vec();

    let rows = rank_by(
        rows,
        |r| r.cumulative_points,
        |a, b| desc(a.cumulative_points, b.cumulative_points).then_with(|| a.draft_entry_id.cmp(&b.draft_entry_id))
    );

    RankedView {
        kind: ViewKind::TeamOverall,
        rows: ViewRows::TeamOverall(rows),
        summary: ViewSummary::Teams {
            wild_card_cutoff,
            points_percentile,
            points_at_percentile
        },
        advancing: Some(advancing)
    }
}

pub(crate) fn team_row(entry: &DraftEntry, overall_rank: u32) -> TeamRow {
    TeamRow {
        draft_entry_id: entry.id.clone(),
        username: entry.username.clone(),
        draft_id: entry.draft_id.clone(),
        pick_order: entry.pick_order,
        draft_clock: entry.draft_clock,
        draft_filled_time: entry.draft_filled_time,
        league_place: entry.league_place,
        advancing: entry.advancing,
        wild_card: entry.wild_card,
        cumulative_points: entry.cumulative_points,
        overall_rank
    }
}

/// The tally counts only the entries of users that met `min_drafts`.
fn user_advance_rates(tables: &FactTables, entry_predicates: &EntryPredicates, min_drafts: u32) -> RankedView {
    let rows = entry_predicates
        .apply(tables)
        .into_iter()
        .into_group_map_by(|e| e.username.clone())
        .into_iter()
        .filter(|(_, entries)| entries.len() as u32 >= min_drafts)
        .map(|(username, entries)| {
            let tally = AdvanceTally::of(entries.iter().copied());
            UserAdvanceRow {
                username,
                total_drafts: tally.entry_count as u32,
                advanced_count: tally.advancing_count as u32,
                advance_rate: ratio(tally.advancing_count, tally.entry_count)
            }
        })
        .collect_vec();

    let advancing = AdvanceTally {
        advancing_count: rows.iter().map(|r| r.advanced_count as usize).sum(),
        entry_count: rows.iter().map(|r| r.total_drafts as usize).sum()
    };

    let rows = rank_by(
        rows,
        |r| r.advance_rate,
        |a, b| {
            desc(a.advance_rate, b.advance_rate)
                .then(b.total_drafts.cmp(&a.total_drafts))
                .then(b.advanced_count.cmp(&a.advanced_count))
                .then_with(|| a.username.cmp(&b.username))
        }
    );

    RankedView {
        kind: ViewKind::TeamAdvanceRate,
        rows: ViewRows::TeamAdvanceRate(rows),
        summary: ViewSummary::None,
        advancing: Some(advancing)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        config::ExclusionList,
        database::fact_store::MemoryFactStore,
        error::FilterError,
        model::cache::NoopCache,
        utils::test_utils::{generate_entry, generate_periods, generate_player, generate_score, generate_team}
    };

    fn tables() -> FactTables {
        let players = vec![
            generate_player(1, RosterSlot::Pitcher, Some(1), Some(10.0)),
            generate_player(2, RosterSlot::Infielder, Some(1), Some(20.0)),
            generate_player(3, RosterSlot::Outfielder, Some(2), None),
            generate_player(4, RosterSlot::Outfielder, Some(2), Some(5.0)),
            generate_player(5, RosterSlot::Infielder, None, Some(50.0)),
        ];
        let teams = vec![generate_team(1, "Team One", "ONE"), generate_team(2, "Team Two", "TWO")];
        let records = vec![
            generate_score(1, 100, 30.0),
            generate_score(1, 101, 10.0),
            generate_score(2, 100, 25.0),
            generate_score(3, 101, 40.0),
            generate_score(4, 102, 12.0),
            // Only scored in the excluded period
            generate_score(5, 102, 99.0),
        ];

        let mut e1 = generate_entry("e1", "alice", &[1, 2, 3], true, 120.0);
        e1.wild_card = true;
        let e2 = generate_entry("e2", "bob", &[1, 4], false, 150.0);
        let mut e3 = generate_entry("e3", "alice", &[2, 3, 4], true, 120.0);
        e3.wild_card = true;
        e3.draft_clock = DraftClock::Slow;
        let e4 = generate_entry("e4", "carol", &[1, 3], false, 90.0);

        FactTables::new(players, teams, generate_periods(100, 3), records, vec![e1, e2, e3, e4], vec![])
    }

    fn engine(config: EngineConfig) -> LeaderboardEngine {
        LeaderboardEngine::new(Arc::new(MemoryFactStore::new(tables())), Arc::new(NoopCache), config)
    }

    fn config() -> EngineConfig {
        EngineConfig {
            exclusions: ExclusionList::new("test-v1", [102]),
            min_drafts: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_team_overall_ranks_and_counts() {
        let page = engine(config()).query(&LeaderboardQuery::new(ViewKind::TeamOverall)).unwrap();

        let ViewRows::TeamOverall(rows) = &page.rows else {
            panic!("expected team rows");
        };
        let order: Vec<(&str, u32)> = rows.iter().map(|r| (r.row.draft_entry_id.as_str(), r.rank)).collect();

        assert_eq!(order, vec![("e2", 1), ("e1", 2), ("e3", 2), ("e4", 3)]);
        assert_eq!(page.total_count, 4);
        assert_eq!(page.advancing_count, Some(2));
        assert_abs_diff_eq!(page.advance_rate_pct.unwrap(), 50.0);
        assert_eq!(page.summary, ViewSummary::Teams {
            wild_card_cutoff: Some(120.0),
            points_percentile: 95.0,
            points_at_percentile: Baseline::Value(150.0)
        });
        assert_eq!(page.exclusion_version, "test-v1");
    }

    #[test]
    fn test_filtered_team_rows_keep_overall_rank() {
        let mut query = LeaderboardQuery::new(ViewKind::TeamOverall);
        query.entry_filter.slows_only = true;

        let page = engine(config()).query(&query).unwrap();
        let ViewRows::TeamOverall(rows) = &page.rows else {
            panic!("expected team rows");
        };

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].row.overall_rank, 2);
        // The cutoff comes from the whole season, the percentile from the filtered entries
        assert_eq!(page.summary, ViewSummary::Teams {
            wild_card_cutoff: Some(120.0),
            points_percentile: 95.0,
            points_at_percentile: Baseline::Value(120.0)
        });
        assert_eq!(page.advancing_count, Some(1));
        assert_abs_diff_eq!(page.advance_rate_pct.unwrap(), 100.0);
    }

    #[test]
    fn test_zero_matches_is_not_an_error() {
        let mut query = LeaderboardQuery::new(ViewKind::TeamOverall);
        query.entry_filter.search = Some("nobody".to_string());

        let page = engine(config()).query(&query).unwrap();

        assert_eq!(page.total_count, 0);
        assert_eq!(page.advancing_count, Some(0));
        assert_eq!(page.advance_rate_pct, Some(0.0));
        assert!(page.rows.is_empty());
        let ViewSummary::Teams { points_at_percentile, .. } = page.summary else {
            panic!("expected team summary");
        };
        assert_eq!(points_at_percentile, Baseline::Empty);
    }

    #[test]
    fn test_player_totals_apply_exclusions() {
        let page = engine(config()).query(&LeaderboardQuery::new(ViewKind::PlayerTotal)).unwrap();
        let ViewRows::PlayerTotal(rows) = &page.rows else {
            panic!("expected player rows");
        };

        // Players 4 and 5 only scored in the excluded period
        let totals: Vec<(i32, f64, u32)> = rows.iter().map(|r| (r.row.player_id, r.row.total_score, r.rank)).collect();
        assert_eq!(totals, vec![(1, 40.0, 1), (3, 40.0, 1), (2, 25.0, 2)]);
        // Nobody is owned by 95% of the entries
        assert_eq!(page.summary, ViewSummary::Median {
            median: Baseline::Value(40.0),
            owned_median: Baseline::Empty
        });

        let first = &rows[0].row;
        assert_eq!(first.team.as_deref(), Some("ONE"));
        assert_eq!(first.drafted_count, 3);
        assert_abs_diff_eq!(first.exposure_pct, 0.75);
        assert_abs_diff_eq!(first.advance_rate, 1.0 / 3.0);
    }

    #[test]
    fn test_player_filter_and_entry_population() {
        let mut query = LeaderboardQuery::new(ViewKind::PlayerTotal);
        query.player_filter.position = Some("FLEX".to_string());
        query.entry_filter.search = Some("alice".to_string());

        let page = engine(config()).query(&query).unwrap();
        let ViewRows::PlayerTotal(rows) = &page.rows else {
            panic!("expected player rows");
        };

        let ids: Vec<i32> = rows.iter().map(|r| r.row.player_id).collect();
        assert_eq!(ids, vec![3, 2]);
        // Both of alice's entries have player 3
        assert_abs_diff_eq!(rows[0].row.exposure_pct, 1.0);
    }

    #[test]
    fn test_owned_median_uses_filtered_ownership() {
        let mut query = LeaderboardQuery::new(ViewKind::PlayerTotal);
        query.entry_filter.search = Some("alice".to_string());

        let page = engine(config()).query(&query).unwrap();

        // Players 2 and 3 are on both of alice's entries, player 1 on one
        assert_eq!(page.summary, ViewSummary::Median {
            median: Baseline::Value(40.0),
            owned_median: Baseline::Value(32.5)
        });
    }

    #[test]
    fn test_owned_median_threshold_is_configurable() {
        let config = EngineConfig {
            owned_baseline_min_pct: 70.0,
            ..config()
        };
        let page = engine(config).query(&LeaderboardQuery::new(ViewKind::PlayerTotal)).unwrap();

        // Players 1 and 3 are on three of four entries
        let ViewSummary::Median { owned_median, .. } = page.summary else {
            panic!("expected median summary");
        };
        assert_eq!(owned_median, Baseline::Value(40.0));
    }

    #[test]
    fn test_weekly_view_orders_by_adp_and_marks_missing_periods() {
        let page = engine(config()).query(&LeaderboardQuery::new(ViewKind::PlayerWeekly)).unwrap();
        let ViewRows::PlayerWeekly(rows) = &page.rows else {
            panic!("expected weekly rows");
        };

        let order: Vec<i32> = rows.iter().map(|r| r.row.player_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(rows[1].rank, 2);

        let periods = &rows[1].row.periods;
        assert_eq!(periods.keys().copied().collect_vec(), vec![1, 2]);
        assert_eq!(periods[&2], PeriodCell::NoData);

        let ViewSummary::Weekly { period_columns, .. } = &page.summary else {
            panic!("expected weekly summary");
        };
        assert_eq!(period_columns, &vec![1, 2]);
    }

    #[test]
    fn test_user_advance_rate_leaderboard() {
        let mut query = LeaderboardQuery::new(ViewKind::TeamAdvanceRate);
        let page = engine(config()).query(&query).unwrap();
        let ViewRows::TeamAdvanceRate(rows) = &page.rows else {
            panic!("expected user rows");
        };

        let order: Vec<(&str, u32)> = rows.iter().map(|r| (r.row.username.as_str(), r.rank)).collect();
        assert_eq!(order, vec![("alice", 1), ("bob", 2), ("carol", 2)]);
        assert_abs_diff_eq!(rows[0].row.advance_rate, 1.0);

        query.min_drafts = Some(2);
        let page = engine(config()).query(&query).unwrap();
        assert_eq!(page.total_count, 1);
    }

    #[test]
    fn test_user_advance_rate_counts_advancing_entries() {
        let mut query = LeaderboardQuery::new(ViewKind::TeamAdvanceRate);
        let page = engine(config()).query(&query).unwrap();

        // alice advanced both entries, bob and carol none of theirs
        assert_eq!(page.total_count, 3);
        assert_eq!(page.advancing_count, Some(2));
        assert_abs_diff_eq!(page.advance_rate_pct.unwrap(), 50.0);

        // Entries of users below the minimum are left out of the tally
        query.min_drafts = Some(2);
        let page = engine(config()).query(&query).unwrap();
        assert_eq!(page.advancing_count, Some(2));
        assert_abs_diff_eq!(page.advance_rate_pct.unwrap(), 100.0);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let mut query = LeaderboardQuery::new(ViewKind::PlayerTotal);
        query.player_filter.ownership_min = Some("abc".to_string());

        let err = engine(config()).query(&query).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidFilter(FilterError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_offset_past_end() {
        let mut query = LeaderboardQuery::new(ViewKind::TeamOverall);
        query.offset = 150;

        let page = engine(config()).query(&query).unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total_count, 4);
        assert!(!page.has_next);
    }
}
