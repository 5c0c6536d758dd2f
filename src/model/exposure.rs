use std::{
    collections::{HashMap, HashSet},
    fmt::{Display, Formatter}
};

use itertools::Itertools;
use serde::Serialize;

use crate::database::db_structs::{AdvanceRateSnapshot, DraftEntry};

/// Ownership and advance rate for one player over one population of entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExposureMetric {
    pub player_id: i32,
    /// Distinct entries containing the player
    pub drafted_count: u32,
    /// Of those, entries that advanced
    pub advanced_count: u32,
    /// `drafted_count / population`, in [0, 1]
    pub exposure_pct: f64,
    /// `advanced_count / drafted_count`, in [0, 1]; 0 when never drafted
    pub advance_rate: f64
}

impl ExposureMetric {
    pub fn undrafted(player_id: i32) -> ExposureMetric {
        ExposureMetric {
            player_id,
            drafted_count: 0,
            advanced_count: 0,
            exposure_pct: 0.0,
            advance_rate: 0.0
        }
    }

    fn from_counts(player_id: i32, drafted_count: u32, advanced_count: u32, population: usize) -> ExposureMetric {
        ExposureMetric {
            player_id,
            drafted_count,
            advanced_count,
            exposure_pct: ratio(drafted_count as usize, population),
            advance_rate: ratio(advanced_count as usize, drafted_count as usize)
        }
    }
}

/// Zero when the denominator is zero.
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }

    numerator as f64 / denominator as f64
}

/// The population an exposure is measured against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExposureScope {
    /// Every entry of the season
    Global,
    /// Only one user's entries
    User(String)
}

impl ExposureScope {
    pub fn contains(&self, entry: &DraftEntry) -> bool {
        match self {
            ExposureScope::Global => true,
            ExposureScope::User(username) => entry.username == *username
        }
    }
}

impl Display for ExposureScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExposureScope::Global => write!(f, "global"),
            ExposureScope::User(username) => write!(f, "user:{}", username)
        }
    }
}

/// Computes exposure metrics over a population of entries. The population is
/// whatever the caller hands in: all entries, one user's entries, or a filtered set.
pub struct ExposureCalculator<'a> {
    population: Vec<&'a DraftEntry>
}

impl<'a> ExposureCalculator<'a> {
    pub fn new(population: Vec<&'a DraftEntry>) -> ExposureCalculator<'a> {
        ExposureCalculator { population }
    }

    pub fn for_scope(entries: &'a [DraftEntry], scope: &ExposureScope) -> ExposureCalculator<'a> {
        ExposureCalculator::new(entries.iter().filter(|e| scope.contains(e)).collect())
    }

    pub fn population_size(&self) -> usize {
        self.population.len()
    }

    pub fn exposure(&self, player_id: i32) -> ExposureMetric {
        let mut drafted = 0;
        let mut advanced = 0;
        for entry in self.population.iter().filter(|e| e.has_player(player_id)) {
            drafted += 1;
            if entry.advancing {
                advanced += 1;
            }
        }

        ExposureMetric::from_counts(player_id, drafted, advanced, self.population.len())
    }

    /// Metrics for every player drafted at least once, in a single pass.
    /// Players absent from the map have `ExposureMetric::undrafted` values.
    pub fn exposure_table(&self) -> HashMap<i32, ExposureMetric> {
        let mut counts: HashMap<i32, (u32, u32)> = HashMap::new();

        for entry in &self.population {
            // A player picked twice by one entry still counts once
            let players: HashSet<i32> = entry.picks.iter().map(|p| p.player_id).collect();
            for player_id in players {
                let (drafted, advanced) = counts.entry(player_id).or_default();
                *drafted += 1;
                if entry.advancing {
                    *advanced += 1;
                }
            }
        }

        let population = self.population.len();
        counts
            .into_iter()
            .map(|(player_id, (drafted, advanced))| {
                (
                    player_id,
                    ExposureMetric::from_counts(player_id, drafted, advanced, population)
                )
            })
            .collect()
    }

    /// Users who drafted the player most, by draft count then advance count.
    pub fn top_drafters(&self, player_id: i32, limit: usize) -> Vec<DrafterCount> {
        let mut counts: HashMap<&str, (u32, u32)> = HashMap::new();
        for entry in self.population.iter().filter(|e| e.has_player(player_id)) {
            let (drafted, advanced) = counts.entry(entry.username.as_str()).or_default();
            *drafted += 1;
            if entry.advancing {
                *advanced += 1;
            }
        }

        counts
            .into_iter()
            .map(|(username, (draft_count, advance_count))| DrafterCount {
                username: username.to_string(),
                draft_count,
                advance_count
            })
            .sorted_by(|a, b| {
                b.draft_count
                    .cmp(&a.draft_count)
                    .then(b.advance_count.cmp(&a.advance_count))
                    .then(a.username.cmp(&b.username))
            })
            .take(limit)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrafterCount {
    pub username: String,
    pub draft_count: u32,
    pub advance_count: u32
}

/// Date-ordered advance-rate snapshots for one player.
///
/// `latest` and `prior` address positions in the sequence; nothing is
/// recomputed from entries.
#[derive(Debug, Clone, Copy)]
pub struct AdvanceRateSeries<'a> {
    snapshots: &'a [AdvanceRateSnapshot]
}

impl<'a> AdvanceRateSeries<'a> {
    /// `snapshots` must be ordered by date (as `FactTables::advance_rate_history` returns them)
    pub fn new(snapshots: &'a [AdvanceRateSnapshot]) -> AdvanceRateSeries<'a> {
        AdvanceRateSeries { snapshots }
    }

    pub fn latest(&self) -> Option<&'a AdvanceRateSnapshot> {
        self.snapshots.last()
    }

    /// The snapshot immediately before the latest one
    pub fn prior(&self) -> Option<&'a AdvanceRateSnapshot> {
        self.snapshots.len().checked_sub(2).map(|i| &self.snapshots[i])
    }

    pub fn delta(&self) -> Option<f64> {
        Some(self.latest()?.advance_rate - self.prior()?.advance_rate)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
