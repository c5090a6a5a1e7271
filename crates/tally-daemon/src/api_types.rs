//! Request and response types for all tally-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use serde::{Deserialize, Serialize};
use tally_reveal::{RevealEvent, RevealPhase, VisibilityMasks};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    /// Stable machine-readable code, e.g. "NOT_IDLE" | "UNAUTHORIZED".
    pub code: String,
}

// ---------------------------------------------------------------------------
// /v1/reveal*  /v1/masks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealStatusResponse {
    #[serde(flatten)]
    pub phase: RevealPhase,
    pub masks: VisibilityMasks,
    pub confetti: bool,
    pub disposed: bool,
}

/// Result of an operator command: the state it left behind and the events
/// it produced (also pushed over SSE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealCommandResponse {
    #[serde(flatten)]
    pub phase: RevealPhase,
    pub masks: VisibilityMasks,
    pub events: Vec<RevealEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetTogglesRequest {
    #[serde(default)]
    pub confirm: bool,
}

// ---------------------------------------------------------------------------
// /v1/students/*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub student_id: String,
    pub full_name: String,
    #[serde(default)]
    pub team_name: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub student_id: String,
    pub password: String,
}
