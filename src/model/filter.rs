//! Filter specifications and the predicate composer.
//!
//! Raw filters arrive as optional strings from the presentation layer. They
//! are validated into typed filters (`EntryFilter`, `PlayerFilter`), which are
//! then composed into an ordered list of typed predicates. Cheap field
//! comparisons always run before predicates that need the pick lists.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    database::{
        db_structs::{DraftEntry, Player},
        fact_store::FactTables
    },
    error::FilterError,
    model::{
        exposure::ExposureMetric,
        structures::{draft_clock::DraftClock, roster_slot::PositionFilter}
    }
};

/// Evaluation cost class. Predicates are evaluated in ascending cost order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PredicateCost {
    /// Plain comparison against a column of the row itself
    Field,
    /// Needs the roster-structure summary
    Structure,
    /// Needs the pick list (and possibly player lookups) or pick-derived metrics
    Picks
}

pub trait Costed {
    fn cost(&self) -> PredicateCost;
}

fn order_by_cost<P: Costed>(mut predicates: Vec<P>) -> Vec<P> {
    // Stable: predicates of equal cost keep their declaration order
    predicates.sort_by_key(|p| p.cost());
    predicates
}

// Parsing helpers

/// Blank strings are treated as absent, matching how empty form fields arrive.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_f64(field: &'static str, value: &str) -> Result<f64, FilterError> {
    let parsed: f64 = value.parse().map_err(|_| FilterError::InvalidNumber {
        field,
        value: value.to_string()
    })?;

    if !parsed.is_finite() {
        return Err(FilterError::InvalidNumber {
            field,
            value: value.to_string()
        });
    }

    Ok(parsed)
}

fn parse_i32(field: &'static str, value: &str) -> Result<i32, FilterError> {
    value.parse().map_err(|_| FilterError::InvalidNumber {
        field,
        value: value.to_string()
    })
}

fn parse_positive_i32(field: &'static str, value: &str) -> Result<i32, FilterError> {
    let parsed = parse_i32(field, value)?;
    if parsed < 1 {
        return Err(FilterError::OutOfRange {
            field,
            value: value.to_string()
        });
    }

    Ok(parsed)
}

fn parse_count(field: &'static str, value: &str) -> Result<u8, FilterError> {
    let parsed = parse_i32(field, value)?;
    u8::try_from(parsed).map_err(|_| FilterError::OutOfRange {
        field,
        value: value.to_string()
    })
}

fn parse_optional<T>(
    field: &'static str,
    value: &Option<String>,
    parse: fn(&'static str, &str) -> Result<T, FilterError>
) -> Result<Option<T>, FilterError> {
    present(value).map(|v| parse(field, v)).transpose()
}

fn check_bounds(
    min_field: &'static str,
    max_field: &'static str,
    min: Option<f64>,
    max: Option<f64>
) -> Result<(), FilterError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(FilterError::InvertedBounds {
                min_field,
                max_field,
                min,
                max
            });
        }
    }

    Ok(())
}

/// A pair where the second member is only meaningful with a first one. A lone
/// second member is promoted to first; a repeated member collapses to one.
fn normalize_pair(first: Option<i32>, second: Option<i32>) -> Option<(i32, Option<i32>)> {
    match (first, second) {
        (Some(a), Some(b)) if a == b => Some((a, None)),
        (Some(a), b) => Some((a, b)),
        (None, Some(b)) => Some((b, None)),
        (None, None) => None
    }
}

// Draft entries

/// Unvalidated entry filter, field names as the presentation layer sends them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntryFilter {
    pub search: Option<String>,
    pub pitchers: Option<String>,
    pub infielders: Option<String>,
    pub outfielders: Option<String>,
    #[serde(default)]
    pub slots: Vec<String>,
    pub player1: Option<String>,
    pub player2: Option<String>,
    pub stack1: Option<String>,
    pub stack2: Option<String>,
    #[serde(default)]
    pub fasts_only: bool,
    #[serde(default)]
    pub slows_only: bool,
    pub league_place: Option<String>,
    #[serde(default)]
    pub wild_cards_only: bool
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RosterComposition {
    pub pitchers: Option<u8>,
    pub infielders: Option<u8>,
    pub outfielders: Option<u8>
}

impl RosterComposition {
    pub fn is_unconstrained(&self) -> bool {
        self.pitchers.is_none() && self.infielders.is_none() && self.outfielders.is_none()
    }
}

/// Validated entry filter. `EntryFilter::default()` is the identity filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct EntryFilter {
    /// Lower-cased username fragment
    pub username: Option<String>,
    pub composition: RosterComposition,
    pub draft_slots: BTreeSet<i32>,
    pub pick_pair: Option<(i32, Option<i32>)>,
    pub team_stack: Option<(i32, Option<i32>)>,
    pub draft_clock: Option<DraftClock>,
    pub league_place: Option<i32>,
    pub wild_cards_only: bool
}

impl TryFrom<&RawEntryFilter> for EntryFilter {
    type Error = FilterError;

    fn try_from(raw: &RawEntryFilter) -> Result<Self, Self::Error> {
        if raw.fasts_only && raw.slows_only {
            return Err(FilterError::Conflicting("fasts_only", "slows_only"));
        }

        let draft_slots = raw
            .slots
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| parse_positive_i32("slots", s))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let pick_pair = normalize_pair(
            parse_optional("player1", &raw.player1, parse_i32)?,
            parse_optional("player2", &raw.player2, parse_i32)?
        );
        let team_stack = normalize_pair(
            parse_optional("stack1", &raw.stack1, parse_i32)?,
            parse_optional("stack2", &raw.stack2, parse_i32)?
        );

        let draft_clock = match (raw.fasts_only, raw.slows_only) {
            (true, _) => Some(DraftClock::Fast),
            (_, true) => Some(DraftClock::Slow),
            _ => None
        };

        Ok(EntryFilter {
            username: present(&raw.search).map(|s| s.to_lowercase()),
            composition: RosterComposition {
                pitchers: parse_optional("pitchers", &raw.pitchers, parse_count)?,
                infielders: parse_optional("infielders", &raw.infielders, parse_count)?,
                outfielders: parse_optional("outfielders", &raw.outfielders, parse_count)?
            },
            draft_slots,
            pick_pair,
            team_stack,
            draft_clock,
            league_place: parse_optional("league_place", &raw.league_place, parse_positive_i32)?,
            wild_cards_only: raw.wild_cards_only
        })
    }
}

impl EntryFilter {
    pub fn is_identity(&self) -> bool {
        *self == EntryFilter::default()
    }

    /// Folds the active dimensions into an ordered predicate list.
    pub fn compose(&self) -> EntryPredicates {
        let mut predicates = Vec::new();

        if let Some(fragment) = &self.username {
            predicates.push(EntryPredicate::UsernameContains(fragment.clone()));
        }
        if !self.composition.is_unconstrained() {
            predicates.push(EntryPredicate::Composition(self.composition));
        }
        if !self.draft_slots.is_empty() {
            predicates.push(EntryPredicate::DraftSlotIn(self.draft_slots.clone()));
        }
        if let Some((first, second)) = self.pick_pair {
            predicates.push(EntryPredicate::PickPair { first, second });
        }
        if let Some((first, second)) = self.team_stack {
            predicates.push(EntryPredicate::TeamStack { first, second });
        }
        if let Some(clock) = self.draft_clock {
            predicates.push(EntryPredicate::DraftClock(clock));
        }
        if let Some(place) = self.league_place {
            predicates.push(EntryPredicate::LeaguePlace(place));
        }
        if self.wild_cards_only {
            predicates.push(EntryPredicate::WildCard);
        }

        let predicates = order_by_cost(predicates);
        debug!(predicates = ?predicates, "Composed entry filter");

        EntryPredicates { predicates }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum EntryPredicate {
    UsernameContains(String),
    Composition(RosterComposition),
    DraftSlotIn(BTreeSet<i32>),
    PickPair { first: i32, second: Option<i32> },
    TeamStack { first: i32, second: Option<i32> },
    DraftClock(DraftClock),
    LeaguePlace(i32),
    WildCard
}

impl Costed for EntryPredicate {
    fn cost(&self) -> PredicateCost {
        match self {
            EntryPredicate::UsernameContains(_)
            | EntryPredicate::DraftSlotIn(_)
            | EntryPredicate::DraftClock(_)
            | EntryPredicate::LeaguePlace(_)
            | EntryPredicate::WildCard => PredicateCost::Field,
            EntryPredicate::Composition(_) => PredicateCost::Structure,
            EntryPredicate::PickPair { .. } | EntryPredicate::TeamStack { .. } => PredicateCost::Picks
        }
    }
}

impl EntryPredicate {
    pub fn matches(&self, entry: &DraftEntry, tables: &FactTables) -> bool {
        match self {
            EntryPredicate::UsernameContains(fragment) => entry.username.to_lowercase().contains(fragment.as_str()),
            EntryPredicate::Composition(c) => {
                c.pitchers.map_or(true, |n| entry.structure.pitchers == n)
                    && c.infielders.map_or(true, |n| entry.structure.infielders == n)
                    && c.outfielders.map_or(true, |n| entry.structure.outfielders == n)
            }
            EntryPredicate::DraftSlotIn(slots) => slots.contains(&entry.pick_order),
            EntryPredicate::PickPair { first, second } => {
                entry.has_player(*first) && second.map_or(true, |p| entry.has_player(p))
            }
            EntryPredicate::TeamStack { first, second } => {
                has_team_player(entry, tables, *first) && second.map_or(true, |t| has_team_player(entry, tables, t))
            }
            EntryPredicate::DraftClock(clock) => entry.draft_clock == *clock,
            EntryPredicate::LeaguePlace(place) => entry.league_place == Some(*place),
            EntryPredicate::WildCard => entry.wild_card
        }
    }
}

fn has_team_player(entry: &DraftEntry, tables: &FactTables, team_id: i32) -> bool {
    entry
        .picks
        .iter()
        .filter_map(|p| tables.player(p.player_id))
        .any(|player| player.team_id == Some(team_id))
}

/// Entry predicates in evaluation order, combined with short-circuit AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct EntryPredicates {
    predicates: Vec<EntryPredicate>
}

impl EntryPredicates {
    pub fn predicates(&self) -> &[EntryPredicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, entry: &DraftEntry, tables: &FactTables) -> bool {
        self.predicates.iter().all(|p| p.matches(entry, tables))
    }

    pub fn apply<'a>(&self, tables: &'a FactTables) -> Vec<&'a DraftEntry> {
        tables.entries().iter().filter(|e| self.matches(e, tables)).collect()
    }
}

// Players

/// Unvalidated player filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlayerFilter {
    pub team: Option<String>,
    pub position: Option<String>,
    pub adp_min: Option<String>,
    pub adp_max: Option<String>,
    #[serde(default)]
    pub no_adp: bool,
    pub ownership_min: Option<String>,
    pub ownership_max: Option<String>
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub enum AdpFilter {
    #[default]
    Any,
    /// Only players whose ADP is unknown
    UnknownOnly,
    Bounds { min: Option<f64>, max: Option<f64> }
}

/// Validated player filter. `PlayerFilter::default()` is the identity filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerFilter {
    pub team_id: Option<i32>,
    pub position: Option<PositionFilter>,
    pub adp: AdpFilter,
    /// Percent, 0-100
    pub ownership_min: Option<f64>,
    /// Percent, 0-100
    pub ownership_max: Option<f64>
}

fn parse_adp(field: &'static str, value: &str) -> Result<f64, FilterError> {
    let parsed = parse_f64(field, value)?;
    if parsed < 0.0 {
        return Err(FilterError::OutOfRange {
            field,
            value: value.to_string()
        });
    }

    Ok(parsed)
}

fn parse_percent(field: &'static str, value: &str) -> Result<f64, FilterError> {
    let parsed = parse_f64(field, value)?;
    if !(0.0..=100.0).contains(&parsed) {
        return Err(FilterError::OutOfRange {
            field,
            value: value.to_string()
        });
    }

    Ok(parsed)
}

impl TryFrom<&RawPlayerFilter> for PlayerFilter {
    type Error = FilterError;

    fn try_from(raw: &RawPlayerFilter) -> Result<Self, Self::Error> {
        let adp_min = parse_optional("adp_min", &raw.adp_min, parse_adp)?;
        let adp_max = parse_optional("adp_max", &raw.adp_max, parse_adp)?;

        let adp = if raw.no_adp {
            if adp_min.is_some() {
                return Err(FilterError::Conflicting("no_adp", "adp_min"));
            }
            if adp_max.is_some() {
                return Err(FilterError::Conflicting("no_adp", "adp_max"));
            }
            AdpFilter::UnknownOnly
        } else if adp_min.is_some() || adp_max.is_some() {
            check_bounds("adp_min", "adp_max", adp_min, adp_max)?;
            AdpFilter::Bounds {
                min: adp_min,
                max: adp_max
            }
        } else {
            AdpFilter::Any
        };

        let ownership_min = parse_optional("ownership_min", &raw.ownership_min, parse_percent)?;
        let ownership_max = parse_optional("ownership_max", &raw.ownership_max, parse_percent)?;
        check_bounds("ownership_min", "ownership_max", ownership_min, ownership_max)?;

        let position = present(&raw.position).map(str::parse::<PositionFilter>).transpose()?;

        Ok(PlayerFilter {
            team_id: parse_optional("team", &raw.team, parse_i32)?,
            position,
            adp,
            ownership_min,
            ownership_max
        })
    }
}

impl PlayerFilter {
    pub fn is_identity(&self) -> bool {
        *self == PlayerFilter::default()
    }

    pub fn compose(&self) -> PlayerPredicates {
        let mut predicates = Vec::new();

        if let Some(team_id) = self.team_id {
            predicates.push(PlayerPredicate::Team(team_id));
        }
        if let Some(position) = self.position {
            predicates.push(PlayerPredicate::Position(position));
        }
        match self.adp {
            AdpFilter::Any => {}
            AdpFilter::UnknownOnly => predicates.push(PlayerPredicate::AdpUnknown),
            AdpFilter::Bounds { min, max } => {
                if let Some(min) = min {
                    predicates.push(PlayerPredicate::AdpAtLeast(min));
                }
                if let Some(max) = max {
                    predicates.push(PlayerPredicate::AdpAtMost(max));
                }
            }
        }
        if let Some(min) = self.ownership_min {
            predicates.push(PlayerPredicate::OwnershipAtLeast(min));
        }
        if let Some(max) = self.ownership_max {
            predicates.push(PlayerPredicate::OwnershipAtMost(max));
        }

        let predicates = order_by_cost(predicates);
        debug!(predicates = ?predicates, "Composed player filter");

        PlayerPredicates { predicates }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlayerPredicate {
    Team(i32),
    Position(PositionFilter),
    AdpUnknown,
    /// Known ADP at or above the bound; unknown ADP also passes
    AdpAtLeast(f64),
    /// Known ADP at or below the bound
    AdpAtMost(f64),
    OwnershipAtLeast(f64),
    OwnershipAtMost(f64)
}

impl Costed for PlayerPredicate {
    fn cost(&self) -> PredicateCost {
        match self {
            PlayerPredicate::OwnershipAtLeast(_) | PlayerPredicate::OwnershipAtMost(_) => PredicateCost::Picks,
            _ => PredicateCost::Field
        }
    }
}

impl PlayerPredicate {
    pub fn matches(&self, player: &Player, exposures: &HashMap<i32, ExposureMetric>) -> bool {
        let ownership_pct = || exposures.get(&player.id).map_or(0.0, |e| e.exposure_pct * 100.0);

        match self {
            PlayerPredicate::Team(team_id) => player.team_id == Some(*team_id),
            PlayerPredicate::Position(position) => position.matches(player.slot),
            PlayerPredicate::AdpUnknown => player.adp.is_none(),
            PlayerPredicate::AdpAtLeast(min) => player.adp.map_or(true, |adp| adp >= *min),
            PlayerPredicate::AdpAtMost(max) => player.adp.is_some_and(|adp| adp <= *max),
            PlayerPredicate::OwnershipAtLeast(min) => ownership_pct() >= *min,
            PlayerPredicate::OwnershipAtMost(max) => ownership_pct() <= *max
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerPredicates {
    predicates: Vec<PlayerPredicate>
}

impl PlayerPredicates {
    pub fn predicates(&self) -> &[PlayerPredicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, player: &Player, exposures: &HashMap<i32, ExposureMetric>) -> bool {
        self.predicates.iter().all(|p| p.matches(player, exposures))
    }
}
