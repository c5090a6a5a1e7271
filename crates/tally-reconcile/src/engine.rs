use std::cmp::Ordering;
use std::collections::BTreeMap;

use tally_schemas::{ScoreLogEntry, Team};

use crate::{Breakdown, EventCatalog, Standing, Tally};

// Wrapping arithmetic throughout: the breakdown identity must hold exactly at
// any magnitude, and nothing in here is allowed to panic.

/// The team's authoritative total, or `base_points` when none is stored.
pub fn total(team: &Team, base_points: i64) -> i64 {
    team.score.unwrap_or(base_points)
}

/// Sum of `delta` over entries whose team and reason both match exactly
/// (case-sensitive). NULL deltas count as zero; no match yields zero.
pub fn score_for_reason(logs: &[ScoreLogEntry], team_name: &str, reason: &str) -> i64 {
    logs.iter()
        .filter(|e| e.team_name == team_name && e.reason == reason)
        .fold(0i64, |acc, e| acc.wrapping_add(e.delta.unwrap_or(0)))
}

/// `total − base_points − Σ_{e ∈ catalog} score_for_reason(team, e)`.
///
/// With an empty catalog the residual absorbs the whole difference between
/// total and base.
pub fn residual_score(
    team: &Team,
    logs: &[ScoreLogEntry],
    catalog: &EventCatalog,
    base_points: i64,
) -> i64 {
    let events = catalog
        .names()
        .fold(0i64, |acc, name| {
            acc.wrapping_add(score_for_reason(logs, &team.name, name))
        });
    total(team, base_points)
        .wrapping_sub(base_points)
        .wrapping_sub(events)
}

pub fn breakdown(
    team: &Team,
    logs: &[ScoreLogEntry],
    catalog: &EventCatalog,
    base_points: i64,
) -> Breakdown {
    let per_event: BTreeMap<String, i64> = catalog
        .names()
        .map(|name| (name.to_string(), score_for_reason(logs, &team.name, name)))
        .collect();

    Breakdown {
        team_id: team.id,
        team_name: team.name.clone(),
        base_points,
        per_event,
        residual: residual_score(team, logs, catalog, base_points),
        total: total(team, base_points),
    }
}

/// Descending total; ties by name ascending, then id.
fn board_order(a: &Team, b: &Team, base_points: i64) -> Ordering {
    total(b, base_points)
        .cmp(&total(a, base_points))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Rank every team and attach its breakdown.
pub fn rank_teams(
    teams: &[Team],
    logs: &[ScoreLogEntry],
    catalog: &EventCatalog,
    base_points: i64,
) -> Vec<Standing> {
    let mut ordered: Vec<&Team> = teams.iter().collect();
    ordered.sort_by(|a, b| board_order(a, b, base_points));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, team)| Standing {
            rank: u32::try_from(i + 1).unwrap_or(u32::MAX),
            breakdown: breakdown(team, logs, catalog, base_points),
        })
        .collect()
}

/// The team currently in first place, by the same order as [`rank_teams`].
pub fn winner(teams: &[Team], base_points: i64) -> Option<&Team> {
    teams.iter().min_by(|a, b| board_order(a, b, base_points))
}

/// Full admin tally: catalog columns plus ranked rows.
pub fn tally(
    teams: &[Team],
    logs: &[ScoreLogEntry],
    catalog: &EventCatalog,
    base_points: i64,
) -> Tally {
    Tally {
        base_points,
        events: catalog.names().map(str::to_string).collect(),
        rows: rank_teams(teams, logs, catalog, base_points),
    }
}
