use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    config::ExclusionList,
    database::{db_structs::ScoreRecord, fact_store::FactTables},
    model::structures::period_cell::PeriodCell
};

/// A player's aggregated score under one exclusion list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerScore {
    pub player_id: i32,
    pub total_score: f64,
    /// Number of non-excluded records that went into `total_score`
    pub qualifying_records: u32,
    /// Sparse: only periods with at least one qualifying record
    pub periods: BTreeMap<i32, PeriodCell>
}

impl PlayerScore {
    fn empty(player_id: i32) -> PlayerScore {
        PlayerScore {
            player_id,
            total_score: 0.0,
            qualifying_records: 0,
            periods: BTreeMap::new()
        }
    }

    pub fn period(&self, period_number: i32) -> PeriodCell {
        self.periods.get(&period_number).copied().unwrap_or_default()
    }
}

/// One calendar day of a player's game log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyScore {
    pub date: NaiveDate,
    pub points: f64,
    pub opponents: Vec<String>,
    /// False for filler days with no game
    pub played: bool
}

/// Sums raw per-game records into player totals and per-period pivots.
///
/// Every method is a pure function of the snapshot and the exclusion list:
/// aggregating the same input twice yields identical results.
pub struct ScoreAggregator<'a> {
    tables: &'a FactTables,
    exclusions: &'a ExclusionList
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(tables: &'a FactTables, exclusions: &'a ExclusionList) -> ScoreAggregator<'a> {
        ScoreAggregator { tables, exclusions }
    }

    /// Sum of the player's raw totals outside the excluded periods.
    /// Players without records score `0.0`.
    pub fn total_score(&self, player_id: i32) -> f64 {
        self.player_score(player_id).total_score
    }

    pub fn player_score(&self, player_id: i32) -> PlayerScore {
        let records = self
            .tables
            .score_records()
            .iter()
            .filter(|r| r.player_id == player_id);

        self.fold(player_id, records)
    }

    /// Aggregates every player that has at least one record (excluded or not).
    pub fn aggregate(&self) -> HashMap<i32, PlayerScore> {
        let mut by_player: HashMap<i32, Vec<&ScoreRecord>> = HashMap::new();
        for record in self.tables.score_records() {
            by_player.entry(record.player_id).or_default().push(record);
        }

        // Each player's fold stays sequential in store order, so the float sums are stable
        by_player
            .into_par_iter()
            .map(|(player_id, records)| (player_id, self.fold(player_id, records.into_iter())))
            .collect()
    }

    /// Period numbers shown as columns: every known, non-excluded period in order.
    pub fn period_columns(&self) -> Vec<i32> {
        self.tables
            .periods()
            .iter()
            .filter(|p| !self.exclusions.is_excluded(p.period_id))
            .map(|p| p.period_number)
            .collect()
    }

    /// Dense pivot over `period_columns`, filling periods without records with `NoData`.
    pub fn pivot(&self, score: &PlayerScore) -> BTreeMap<i32, PeriodCell> {
        self.period_columns()
            .into_iter()
            .map(|period_number| (period_number, score.period(period_number)))
            .collect()
    }

    /// Raw game log for the player, one row per calendar day from the first
    /// to the last game date of the season. Exclusions do not apply here.
    pub fn daily_history(&self, player_id: i32) -> Vec<DailyScore> {
        let mut by_date: BTreeMap<NaiveDate, DailyScore> = BTreeMap::new();
        for record in self.tables.score_records().iter().filter(|r| r.player_id == player_id) {
            let day = by_date.entry(record.date).or_insert_with(|| DailyScore {
                date: record.date,
                points: 0.0,
                opponents: Vec::new(),
                played: true
            });

            day.points += record.raw_total;
            if let Some(opponent) = &record.opponent {
                day.opponents.push(opponent.clone());
            }
        }

        if by_date.is_empty() {
            return Vec::new();
        }

        let season_start = self.tables.score_records().iter().map(|r| r.date).min();
        let season_end = self.tables.score_records().iter().map(|r| r.date).max();
        let (Some(start), Some(end)) = (season_start, season_end) else {
            return Vec::new();
        };

        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| {
                by_date.remove(&date).unwrap_or(DailyScore {
                    date,
                    points: 0.0,
                    opponents: Vec::new(),
                    played: false
                })
            })
            .collect()
    }

    fn fold<'r>(&self, player_id: i32, records: impl Iterator<Item = &'r ScoreRecord>) -> PlayerScore {
        let mut score = PlayerScore::empty(player_id);

        for record in records {
            if self.exclusions.is_excluded(record.period_id) {
                continue;
            }

            score.total_score += record.raw_total;
            score.qualifying_records += 1;

            // Records outside the period table still count toward the total
            if let Some(period_number) = self.tables.period_number(record.period_id) {
                score.periods.entry(period_number).or_default().add(record.raw_total);
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    use crate::{
        config::ExclusionList,
        database::fact_store::FactTables,
        model::{score_aggregator::ScoreAggregator, structures::period_cell::PeriodCell},
        utils::test_utils::{generate_periods, generate_score, generate_score_on}
    };

    fn tables_with(records: Vec<crate::database::db_structs::ScoreRecord>) -> FactTables {
        FactTables::new(vec![], vec![], generate_periods(100, 6), records, vec![], vec![])
    }

    #[test]
    fn test_missing_player_scores_zero() {
        let tables = tables_with(vec![generate_score(1, 100, 5.0)]);
        let exclusions = ExclusionList::empty();
        let aggregator = ScoreAggregator::new(&tables, &exclusions);

        assert_eq!(aggregator.total_score(2), 0.0);
        assert!(aggregator.player_score(2).periods.is_empty());
    }

    #[test]
    fn test_exclusion_is_a_pure_subtraction() {
        let records = vec![
            generate_score(1, 100, 4.0),
            generate_score(1, 101, 7.5),
            generate_score(1, 102, -2.0),
            generate_score(1, 103, 11.0),
            generate_score(1, 103, 3.0),
        ];
        let tables = tables_with(records.clone());

        let none = ExclusionList::empty();
        let excluded = ExclusionList::new("test", [101, 103]);

        let all = ScoreAggregator::new(&tables, &none).total_score(1);
        let partial = ScoreAggregator::new(&tables, &excluded).total_score(1);
        let removed: f64 = records
            .iter()
            .filter(|r| excluded.is_excluded(r.period_id))
            .map(|r| r.raw_total)
            .sum();

        assert_abs_diff_eq!(partial, all - removed, epsilon = 1e-9);
    }

    #[test]
    fn test_two_start_pitcher_keeps_both_appearances() {
        let tables = tables_with(vec![
            generate_score(7, 102, 18.0),
            generate_score(7, 102, 22.0),
            generate_score(7, 104, 9.0),
        ]);
        let exclusions = ExclusionList::empty();
        let aggregator = ScoreAggregator::new(&tables, &exclusions);

        let score = aggregator.player_score(7);
        // period_id 102 is period number 3
        assert_eq!(score.period(3).total(), 40.0);
        assert_eq!(score.period(3).appearances(), 2);
        assert!(score.period(3).is_multi_appearance());
        assert_eq!(score.total_score, 49.0);
    }

    #[test]
    fn test_pivot_marks_missing_periods_as_no_data() {
        let tables = tables_with(vec![generate_score(1, 100, 0.0), generate_score(1, 102, 6.0)]);
        let exclusions = ExclusionList::new("test", [105]);
        let aggregator = ScoreAggregator::new(&tables, &exclusions);

        let pivot = aggregator.pivot(&aggregator.player_score(1));

        assert_eq!(pivot.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(
            pivot[&1],
            PeriodCell::Scored {
                total: 0.0,
                appearances: 1
            }
        );
        assert_eq!(pivot[&2], PeriodCell::NoData);
        assert_eq!(pivot[&3].total(), 6.0);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let records = (0..500)
            .map(|i| generate_score(i % 17, 100 + (i % 6), (i as f64) * 0.37 - 40.0))
            .collect();
        let tables = tables_with(records);
        let exclusions = ExclusionList::new("test", [101]);
        let aggregator = ScoreAggregator::new(&tables, &exclusions);

        let first = aggregator.aggregate();
        let second = aggregator.aggregate();

        assert_eq!(first, second);
        for (player_id, score) in &first {
            assert_eq!(*score, aggregator.player_score(*player_id));
        }
    }

    #[test]
    fn test_record_without_known_period_counts_toward_total_only() {
        let tables = tables_with(vec![generate_score(1, 999, 3.0), generate_score(1, 100, 2.0)]);
        let exclusions = ExclusionList::empty();
        let aggregator = ScoreAggregator::new(&tables, &exclusions);

        let score = aggregator.player_score(1);
        assert_eq!(score.total_score, 5.0);
        assert_eq!(score.periods.len(), 1);
    }

    #[test]
    fn test_daily_history_fills_days_without_games() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let tables = tables_with(vec![
            generate_score_on(1, 100, d(27), 3.0, "NYY"),
            generate_score_on(1, 100, d(27), 4.0, "NYY"),
            generate_score_on(1, 100, d(29), 1.0, "BOS"),
            generate_score_on(2, 100, d(31), 8.0, "TOR"),
        ]);
        let exclusions = ExclusionList::empty();
        let aggregator = ScoreAggregator::new(&tables, &exclusions);

        let history = aggregator.daily_history(1);

        assert_eq!(history.len(), 5);
        assert_eq!(history[0].points, 7.0);
        assert_eq!(history[0].opponents, vec!["NYY".to_string(), "NYY".to_string()]);
        assert!(!history[1].played);
        assert_eq!(history[1].points, 0.0);
        assert_eq!(history[2].opponents, vec!["BOS".to_string()]);
        assert!(!history[4].played);

        assert!(aggregator.daily_history(3).is_empty());
    }
}
