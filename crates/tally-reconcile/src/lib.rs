//! tally-reconcile
//!
//! Score reconciliation engine.
//!
//! Given a team's authoritative total and an unordered bag of score-log
//! entries, derive a breakdown (base points, per-event deltas, residual)
//! whose parts always sum to the authoritative total:
//!
//! ```text
//! base_points + Σ per_event + residual == total
//! ```
//!
//! The residual is defined as the remainder, so the identity holds by
//! construction even when the log is incomplete, predates logging, or carries
//! manual corrections outside the event taxonomy. The residual therefore
//! mixes manual overrides, clamping and historical points into one number.
//!
//! Deterministic, pure logic. No IO.

mod engine;
mod types;

pub use engine::{
    breakdown, rank_teams, residual_score, score_for_reason, tally, total, winner,
};
pub use types::*;
