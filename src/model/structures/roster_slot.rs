use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, str::FromStr};
use strum_macros::{Display, EnumIter};

use crate::error::FilterError;

/// The roster slot a player is drafted into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
pub enum RosterSlot {
    #[serde(rename = "P")]
    #[strum(serialize = "P")]
    Pitcher,
    #[serde(rename = "IF")]
    #[strum(serialize = "IF")]
    Infielder,
    #[serde(rename = "OF")]
    #[strum(serialize = "OF")]
    Outfielder
}

impl RosterSlot {
    /// Sort key used when listing a roster: pitchers, then infielders, then outfielders.
    pub fn roster_order(&self) -> u8 {
        match self {
            RosterSlot::Pitcher => 1,
            RosterSlot::Infielder => 2,
            RosterSlot::Outfielder => 3
        }
    }

    pub fn is_pitcher(&self) -> bool {
        matches!(self, RosterSlot::Pitcher)
    }
}

impl TryFrom<&str> for RosterSlot {
    type Error = ();

    fn try_from(v: &str) -> Result<Self, Self::Error> {
        match v.trim().to_ascii_uppercase().as_str() {
            "P" => Ok(RosterSlot::Pitcher),
            "IF" => Ok(RosterSlot::Infielder),
            "OF" => Ok(RosterSlot::Outfielder),
            _ => Err(())
        }
    }
}

/// A position filter. `Flex` is the union of infielders and outfielders.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionFilter {
    Exact(RosterSlot),
    Flex
}

impl PositionFilter {
    pub fn matches(&self, slot: RosterSlot) -> bool {
        match self {
            PositionFilter::Exact(s) => *s == slot,
            PositionFilter::Flex => matches!(slot, RosterSlot::Infielder | RosterSlot::Outfielder)
        }
    }
}

impl FromStr for PositionFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("FLEX") {
            return Ok(PositionFilter::Flex);
        }

        RosterSlot::try_from(s)
            .map(PositionFilter::Exact)
            .map_err(|_| FilterError::UnknownPosition(s.to_string()))
    }
}
