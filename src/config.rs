use std::{collections::BTreeSet, fs, path::Path};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::ConfigError,
    model::constants::{
        DEFAULT_CACHE_TTL_SECONDS, DEFAULT_HITTER_BASELINE_RANK, DEFAULT_MIN_DRAFTS, DEFAULT_OWNED_BASELINE_MIN_PCT,
        DEFAULT_PITCHER_BASELINE_RANK, DEFAULT_TEAM_POINTS_PERCENTILE, PAGE_SIZE
    }
};

/// Administratively excluded scoring periods (all-star break, rained-out or
/// placeholder weeks). Global and versioned so a result can always be traced
/// back to the list it was computed with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExclusionList {
    pub version: String,
    pub period_ids: BTreeSet<i32>
}

impl ExclusionList {
    pub fn new(version: impl Into<String>, period_ids: impl IntoIterator<Item = i32>) -> ExclusionList {
        ExclusionList {
            version: version.into(),
            period_ids: period_ids.into_iter().collect()
        }
    }

    pub fn empty() -> ExclusionList {
        ExclusionList::new("none", [])
    }

    pub fn is_excluded(&self, period_id: i32) -> bool {
        self.period_ids.contains(&period_id)
    }

    pub fn from_json(json: &str) -> Result<ExclusionList, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<ExclusionList, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source
        })?;

        let list = ExclusionList::from_json(&json)?;
        info!(
            version = %list.version,
            periods = list.period_ids.len(),
            "Loaded excluded periods"
        );

        Ok(list)
    }
}

impl Default for ExclusionList {
    fn default() -> Self {
        ExclusionList::empty()
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub exclusions: ExclusionList,
    /// Age after which the cached default view is recomputed
    pub cache_ttl: Duration,
    pub page_size: usize,
    /// Weekly baseline rank inside the pitcher population
    pub pitcher_baseline_rank: usize,
    /// Weekly baseline rank inside the hitter population
    pub hitter_baseline_rank: usize,
    /// Minimum entries a user needs to appear on the advance-rate leaderboard
    pub min_drafts: u32,
    /// Ownership (percent) a player needs to count toward the owned median
    pub owned_baseline_min_pct: f64,
    /// Percentile of cumulative points reported with the team view
    pub team_points_percentile: f64
}

impl EngineConfig {
    /// Converts a TTL given in seconds, rejecting zero, negative and
    /// unrepresentable values.
    pub fn cache_ttl_from_seconds(seconds: i64) -> Result<Duration, ConfigError> {
        if seconds <= 0 {
            return Err(ConfigError::InvalidCacheTtl(seconds));
        }

        Duration::try_seconds(seconds).ok_or(ConfigError::InvalidCacheTtl(seconds))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            exclusions: ExclusionList::empty(),
            cache_ttl: Duration::seconds(DEFAULT_CACHE_TTL_SECONDS),
            page_size: PAGE_SIZE,
            pitcher_baseline_rank: DEFAULT_PITCHER_BASELINE_RANK,
            hitter_baseline_rank: DEFAULT_HITTER_BASELINE_RANK,
            min_drafts: DEFAULT_MIN_DRAFTS,
            owned_baseline_min_pct: DEFAULT_OWNED_BASELINE_MIN_PCT,
            team_points_percentile: DEFAULT_TEAM_POINTS_PERCENTILE
        }
    }
}
