use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Draft-clock variant of the pool an entry was drafted in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DraftClock {
    Fast,
    Slow
}

impl TryFrom<&str> for DraftClock {
    type Error = ();

    fn try_from(v: &str) -> Result<Self, Self::Error> {
        match v.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(DraftClock::Fast),
            "slow" => Ok(DraftClock::Slow),
            _ => Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::structures::draft_clock::DraftClock;

    #[test]
    fn test_convert_fast() {
        assert_eq!(DraftClock::try_from("fast"), Ok(DraftClock::Fast));
        assert_eq!(DraftClock::try_from("FAST"), Ok(DraftClock::Fast));
    }

    #[test]
    fn test_convert_slow() {
        assert_eq!(DraftClock::try_from("slow"), Ok(DraftClock::Slow));
    }

    #[test]
    fn test_convert_invalid() {
        assert_eq!(DraftClock::try_from("instant"), Err(()));
    }
}
