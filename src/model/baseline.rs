use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap}
};

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    database::fact_store::FactTables,
    model::{score_aggregator::PlayerScore, structures::roster_slot::RosterSlot}
};

/// An order-statistic reference value. `Empty` when the population had no
/// (or too few) values; never NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Baseline {
    Empty,
    Value(f64)
}

impl Baseline {
    pub fn value(&self) -> Option<f64> {
        match self {
            Baseline::Empty => None,
            Baseline::Value(v) => Some(*v)
        }
    }

    /// Compare a score against the baseline. `None` when there is nothing to compare against.
    pub fn compare(&self, score: f64) -> Option<Ordering> {
        self.value().map(|b| score.total_cmp(&b))
    }
}

fn sorted_ascending(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Median with the statistical definition: the middle value for odd `n`, the
/// mean of the two middle values for even `n`.
pub fn median(values: impl IntoIterator<Item = f64>) -> Baseline {
    let sorted = sorted_ascending(values);
    let n = sorted.len();

    match n {
        0 => Baseline::Empty,
        _ if n % 2 == 1 => Baseline::Value(sorted[n / 2]),
        _ => Baseline::Value((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Median over the items that pass `keep`. Filtering happens before the statistic.
pub fn median_where<T>(items: &[T], value: impl Fn(&T) -> f64, keep: impl Fn(&T) -> bool) -> Baseline {
    median(items.iter().filter(|i| keep(*i)).map(value))
}

/// Nearest-rank percentile, `p` in [0, 100].
pub fn percentile(values: impl IntoIterator<Item = f64>, p: f64) -> Baseline {
    let sorted = sorted_ascending(values);
    if sorted.is_empty() {
        return Baseline::Empty;
    }

    let rank = ((p.clamp(0.0, 100.0) / 100.0) * sorted.len() as f64).ceil() as usize;
    Baseline::Value(sorted[rank.clamp(1, sorted.len()) - 1])
}

/// The value at 1-based `rank` when ordered from highest to lowest.
pub fn order_statistic(values: impl IntoIterator<Item = f64>, rank: usize) -> Baseline {
    let sorted = sorted_ascending(values);
    if rank == 0 || rank > sorted.len() {
        return Baseline::Empty;
    }

    Baseline::Value(sorted[sorted.len() - rank])
}

/// Per-period rank baselines for the pitcher and hitter populations.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PeriodBaselines {
    pub pitchers: BTreeMap<i32, Baseline>,
    pub hitters: BTreeMap<i32, Baseline>
}

impl PeriodBaselines {
    /// The baseline that applies to a player in the given slot
    pub fn for_slot(&self, slot: RosterSlot, period_number: i32) -> Baseline {
        let map = if slot.is_pitcher() { &self.pitchers } else { &self.hitters };
        map.get(&period_number).copied().unwrap_or(Baseline::Empty)
    }
}

/// For every period column, the score at `pitcher_rank` among pitchers and at
/// `hitter_rank` among hitters, counting only players with data in that period.
pub fn period_rank_baselines(
    tables: &FactTables,
    scores: &HashMap<i32, PlayerScore>,
    period_columns: &[i32],
    pitcher_rank: usize,
    hitter_rank: usize
) -> PeriodBaselines {
    let mut pitcher_scores: HashMap<i32, Vec<f64>> = HashMap::new();
    let mut hitter_scores: HashMap<i32, Vec<f64>> = HashMap::new();

    for score in scores.values() {
        let Some(player) = tables.player(score.player_id) else {
            continue;
        };

        let target = if player.slot.is_pitcher() {
            &mut pitcher_scores
        } else {
            &mut hitter_scores
        };

        for (period_number, cell) in &score.periods {
            if cell.has_data() {
                target.entry(*period_number).or_default().push(cell.total());
            }
        }
    }

    let per_period = |population: &HashMap<i32, Vec<f64>>, rank: usize| -> BTreeMap<i32, Baseline> {
        period_columns
            .par_iter()
            .map(|period_number| {
                let values = population.get(period_number).cloned().unwrap_or_default();
                (*period_number, order_statistic(values, rank))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    };

    PeriodBaselines {
        pitchers: per_period(&pitcher_scores, pitcher_rank),
        hitters: per_period(&hitter_scores, hitter_rank)
    }
}
