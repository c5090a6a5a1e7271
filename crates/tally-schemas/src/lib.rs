//! Row and wire types shared by every tally crate.
//!
//! These mirror the tables of the backing store one-to-one. Nullable columns
//! stay `Option` here; defaulting (base points, zero delta) is the job of
//! `tally-reconcile`, never of the row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A competing team. `score` is the authoritative total as stored by the
/// system of record; `None` when the column is NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub score: Option<i64>,
}

impl Team {
    pub fn new(id: i64, name: impl Into<String>, score: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            score,
        }
    }
}

/// A named scoring category (a competition). Log entries whose `reason`
/// equals the name are attributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCategory {
    pub id: i64,
    pub name: String,
}

impl EventCategory {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One append-only score movement. `team_name` is a denormalized reference,
/// not a foreign key. `reason` is either an event name or a free-form manual
/// adjustment label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLogEntry {
    pub team_name: String,
    pub reason: String,
    pub delta: Option<i64>,
}

impl ScoreLogEntry {
    pub fn new(team_name: impl Into<String>, reason: impl Into<String>, delta: i64) -> Self {
        Self {
            team_name: team_name.into(),
            reason: reason.into(),
            delta: Some(delta),
        }
    }
}

/// Single-row settings record. When `public_redirect` is set, the public
/// display variant of the board navigates there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub public_redirect: Option<String>,
}

/// Registered student as exposed to callers. Credentials never leave the
/// store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub student_id: String,
    pub full_name: String,
    pub team_name: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

/// Everything needed to insert a student. `password_hash` is the salted
/// digest produced by `tally-db`, never a plaintext password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub student_id: String,
    pub full_name: String,
    pub team_name: Option<String>,
    pub password_salt: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_score_survives_json() {
        let t: Team = serde_json::from_str(r#"{"id":1,"name":"Red","score":null}"#).unwrap();
        assert_eq!(t.score, None);
    }

    #[test]
    fn display_settings_default_has_no_redirect() {
        assert_eq!(DisplaySettings::default().public_redirect, None);
    }
}
