//! Axum router and all HTTP handlers for tally-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tally_db::{students, RegisterOutcome};
use tally_reveal::{MaskPatch, RevealError, RevealEvent, Scoreboard};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::{
    api_types::{
        ApiErrorResponse, HealthResponse, LoginRequest, RegisterRequest, ResetTogglesRequest,
        RevealCommandResponse, RevealStatusResponse,
    },
    state::{AppState, BusMsg},
};

pub const ADMIN_PASSCODE_HEADER: &str = "x-admin-passcode";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/scoreboard", get(scoreboard))
        .route("/v1/tally", get(tally))
        .route("/v1/reveal", get(reveal_status))
        .route("/v1/reveal/countdown", post(reveal_countdown))
        .route("/v1/reveal/dismiss", post(reveal_dismiss))
        .route("/v1/reveal/reset-toggles", post(reveal_reset_toggles))
        .route("/v1/masks", post(set_masks))
        .route("/v1/display", get(display))
        .route("/v1/students/register", post(student_register))
        .route("/v1/students/login", post(student_login))
        .route("/v1/stream", get(stream))
        .with_state(state)
}

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> Response {
    (
        status,
        Json(ApiErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

fn reveal_error(e: &RevealError) -> Response {
    let (status, code) = match e {
        RevealError::NotIdle { .. } => (StatusCode::CONFLICT, "NOT_IDLE"),
        RevealError::NotWinner { .. } => (StatusCode::CONFLICT, "NOT_WINNER"),
        RevealError::ConfirmationRequired => (StatusCode::BAD_REQUEST, "CONFIRMATION_REQUIRED"),
        RevealError::Disposed => (StatusCode::SERVICE_UNAVAILABLE, "DISPOSED"),
    };
    api_error(status, code, e.to_string())
}

/// `Err` carries the 401 to return.
fn require_admin(st: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = st.admin_passcode.as_deref() else {
        return Ok(());
    };
    let given = headers
        .get(ADMIN_PASSCODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if students::constant_time_eq(given, expected) {
        Ok(())
    } else {
        warn!("operator request refused: bad or missing admin passcode");
        Err(api_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            format!("missing or wrong {ADMIN_PASSCODE_HEADER} header"),
        ))
    }
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/scoreboard  /v1/tally
// ---------------------------------------------------------------------------

/// The public board, masks applied.
pub(crate) async fn scoreboard(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let view = st.board.read().await.view();
    (StatusCode::OK, Json(view))
}

/// Unmasked per-event breakdown for the admin table.
pub(crate) async fn tally(State(st): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Err(resp) = require_admin(&st, &headers) {
        return resp;
    }
    let t = st.board.read().await.tally();
    (StatusCode::OK, Json(t)).into_response()
}

// ---------------------------------------------------------------------------
// Reveal ceremony
// ---------------------------------------------------------------------------

pub(crate) async fn reveal_status(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let board = st.board.read().await;
    let reveal = board.reveal();
    (
        StatusCode::OK,
        Json(RevealStatusResponse {
            phase: reveal.phase().clone(),
            masks: reveal.masks(),
            confetti: reveal.confetti_active(),
            disposed: reveal.is_disposed(),
        }),
    )
}

/// Run one operator command against the board, then publish its events.
async fn run_command<F>(st: &AppState, action: &'static str, op: F) -> Response
where
    F: FnOnce(&mut Scoreboard, u64) -> Result<Vec<RevealEvent>, RevealError>,
{
    let result = {
        let mut board = st.board.write().await;
        let now = st.now_ms();
        op(&mut *board, now).map(|events| {
            let reveal = board.reveal();
            let resp = RevealCommandResponse {
                phase: reveal.phase().clone(),
                masks: reveal.masks(),
                events: events.clone(),
            };
            (events, resp, board.view())
        })
    };

    match result {
        Ok((events, resp, view)) => {
            info!(action, phase = resp.phase.name(), "reveal command");
            st.publish_reveal(events, view);
            let _ = st.bus.send(BusMsg::LogLine {
                level: "INFO".to_string(),
                msg: format!("operator: {action}"),
            });
            (StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => {
            info!(action, error = %e, "reveal command refused");
            reveal_error(&e)
        }
    }
}

pub(crate) async fn reveal_countdown(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = require_admin(&st, &headers) {
        return resp;
    }
    run_command(&st, "countdown", |b, now| b.start_countdown(now)).await
}

pub(crate) async fn reveal_dismiss(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = require_admin(&st, &headers) {
        return resp;
    }
    run_command(&st, "dismiss", |b, _| b.dismiss_winner()).await
}

pub(crate) async fn reveal_reset_toggles(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ResetTogglesRequest>,
) -> Response {
    if let Err(resp) = require_admin(&st, &headers) {
        return resp;
    }
    run_command(&st, "reset_toggles", move |b, _| b.reset_toggles(req.confirm)).await
}

pub(crate) async fn set_masks(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(patch): Json<MaskPatch>,
) -> Response {
    if let Err(resp) = require_admin(&st, &headers) {
        return resp;
    }
    run_command(&st, "set_masks", move |b, _| b.set_masks(&patch)).await
}

// ---------------------------------------------------------------------------
// GET /v1/display
// ---------------------------------------------------------------------------

pub(crate) async fn display(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let d = st.display.read().await.clone();
    (StatusCode::OK, Json(d))
}

// ---------------------------------------------------------------------------
// POST /v1/students/register  /v1/students/login
// ---------------------------------------------------------------------------

pub(crate) async fn student_register(
    State(st): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    if req.student_id.trim().is_empty()
        || req.full_name.trim().is_empty()
        || req.password.is_empty()
    {
        return api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_INPUT",
            "student_id, full_name and password are required",
        );
    }

    let new = students::new_student(
        &req.student_id,
        &req.full_name,
        req.team_name.as_deref(),
        &req.password,
    );

    match st.store.register_student(&new).await {
        Ok(RegisterOutcome::Registered(student)) => {
            info!(student_id = %student.student_id, "student registered");
            (StatusCode::CREATED, Json(student)).into_response()
        }
        Ok(RegisterOutcome::Duplicate) => api_error(
            StatusCode::CONFLICT,
            "DUPLICATE_STUDENT_ID",
            "student_id already registered",
        ),
        Err(e) => {
            warn!(error = %e, "student registration failed");
            api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "registration is unavailable right now",
            )
        }
    }
}

pub(crate) async fn student_login(
    State(st): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let creds = match st.store.fetch_student_credentials(req.student_id.trim()).await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "student login lookup failed");
            return api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "login is unavailable right now",
            );
        }
    };

    match creds {
        Some(c) if students::verify_password(&c.password_salt, &req.password, &c.password_hash) => {
            info!(student_id = %c.student.student_id, "student login");
            (StatusCode::OK, Json(c.student)).into_response()
        }
        // Unknown id and wrong password are indistinguishable.
        _ => api_error(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "invalid student id or password",
        ),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::Standings(_) => "standings",
                    BusMsg::Reveal(_) => "reveal",
                    BusMsg::Display(_) => "display",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
