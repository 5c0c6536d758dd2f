use serde::{Deserialize, Serialize};

/// One cell of a per-period pivot.
///
/// `NoData` is distinct from a scored zero: the player had no qualifying
/// record in that period.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodCell {
    #[default]
    NoData,
    Scored { total: f64, appearances: u32 }
}

impl PeriodCell {
    pub fn total(&self) -> f64 {
        match self {
            PeriodCell::NoData => 0.0,
            PeriodCell::Scored { total, .. } => *total
        }
    }

    pub fn appearances(&self) -> u32 {
        match self {
            PeriodCell::NoData => 0,
            PeriodCell::Scored { appearances, .. } => *appearances
        }
    }

    pub fn has_data(&self) -> bool {
        matches!(self, PeriodCell::Scored { .. })
    }

    /// Multi-appearance periods, e.g. two-start pitchers.
    pub fn is_multi_appearance(&self) -> bool {
        self.appearances() > 1
    }

    pub(crate) fn add(&mut self, raw_total: f64) {
        match self {
            PeriodCell::NoData => {
                *self = PeriodCell::Scored {
                    total: raw_total,
                    appearances: 1
                }
            }
            PeriodCell::Scored { total, appearances } => {
                *total += raw_total;
                *appearances += 1;
            }
        }
    }
}
