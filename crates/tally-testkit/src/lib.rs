//! Test doubles and fixtures shared by the tally scenario tests.

use anyhow::{Context, Result};
use std::fs;
use tally_reveal::StandingsSnapshot;
use tally_schemas::{EventCategory, ScoreLogEntry, Team};

mod memory_store;

pub use memory_store::{MemoryChangeFeed, MemoryStore};

pub fn load_snapshot_json(path: &str) -> Result<StandingsSnapshot> {
    let s = fs::read_to_string(path).with_context(|| format!("read snapshot: {path}"))?;
    let snap: StandingsSnapshot = serde_json::from_str(&s).context("parse snapshot json")?;
    Ok(snap)
}

/// Three teams, one event, a handful of log rows.
///
/// Totals: Red 170, Blue 150 (NULL score), Green 140. Red's residual is 5
/// (a Late Penalty of -5 on top of a manual +10).
pub fn reference_snapshot() -> StandingsSnapshot {
    StandingsSnapshot {
        teams: vec![
            Team::new(1, "Red", Some(170)),
            Team::new(2, "Blue", None),
            Team::new(3, "Green", Some(140)),
        ],
        events: vec![EventCategory::new(10, "Quiz Bee")],
        logs: vec![
            ScoreLogEntry::new("Red", "Quiz Bee", 15),
            ScoreLogEntry::new("Red", "Late Penalty", -5),
            ScoreLogEntry::new("Green", "Quiz Bee", -10),
        ],
    }
}

/// Teams only, scores as given, ids from 1.
pub fn teams(scores: &[(&str, Option<i64>)]) -> Vec<Team> {
    scores
        .iter()
        .zip(1..)
        .map(|((name, score), id)| Team::new(id, *name, *score))
        .collect()
}
