use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Leaderboard views served by the engine. Each view owns one slot in the result cache.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, Display, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ViewKind {
    #[default]
    PlayerTotal,
    PlayerWeekly,
    TeamOverall,
    TeamAdvanceRate
}
