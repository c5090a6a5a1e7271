use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tally_schemas::EventCategory;

/// Points every team starts with. Assumed as the total when a team has no
/// stored score.
pub const BASE_POINTS: i64 = 150;

/// The set of known event names. Duplicate catalog rows collapse into one
/// name so no event is ever counted twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCatalog {
    names: BTreeSet<String>,
}

impl EventCatalog {
    /// No catalog available: every logged delta lands in the residual.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_events(events: &[EventCategory]) -> Self {
        Self {
            names: events.iter().map(|e| e.name.clone()).collect(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Names in stable (sorted) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Derived, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub team_id: i64,
    pub team_name: String,
    pub base_points: i64,
    /// One entry per catalog event, zero included.
    pub per_event: BTreeMap<String, i64>,
    /// Conduct / adjustment bucket: whatever the other columns do not explain.
    pub residual: i64,
    /// Authoritative total.
    pub total: i64,
}

impl Breakdown {
    pub fn event_sum(&self) -> i64 {
        self.per_event
            .values()
            .fold(0i64, |acc, v| acc.wrapping_add(*v))
    }

    /// `base_points + Σ per_event + residual == total`.
    pub fn is_balanced(&self) -> bool {
        self.base_points
            .wrapping_add(self.event_sum())
            .wrapping_add(self.residual)
            == self.total
    }
}

/// A team's place on the board. `rank` is 1-based and unique: equal totals
/// are ordered by name, then id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: u32,
    pub breakdown: Breakdown,
}

/// Admin point-tally table: one column per catalog event, one row per team.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub base_points: i64,
    pub events: Vec<String>,
    pub rows: Vec<Standing>,
}
