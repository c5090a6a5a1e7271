//! Shared runtime state for tally-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The board lives behind
//! one `RwLock`; nothing holds that lock across a store round-trip.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_config::BoardSettings;
use tally_db::ScoreStore;
use tally_reveal::{BoardView, RevealEvent, RevealTiming, Scoreboard, StandingsSnapshot};
use tally_schemas::DisplaySettings;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Standings(BoardView),
    Reveal(RevealEvent),
    Display(DisplaySettings),
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub board: Arc<RwLock<Scoreboard>>,
    pub display: Arc<RwLock<DisplaySettings>>,
    pub store: Arc<dyn ScoreStore>,
    /// When set, operator routes require a matching `x-admin-passcode`.
    pub admin_passcode: Option<String>,
    started: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        settings: &BoardSettings,
        admin_passcode: Option<String>,
    ) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        Self {
            bus,
            build: BuildInfo {
                service: "tally-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            board: Arc::new(RwLock::new(Scoreboard::new(
                settings.base_points,
                timing_from_settings(settings),
            ))),
            display: Arc::new(RwLock::new(DisplaySettings::default())),
            store,
            admin_passcode,
            started: Instant::now(),
        }
    }

    /// Milliseconds on the daemon's monotonic clock. The reveal timers run
    /// on this clock and nothing else.
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Re-pull the full snapshot and replace the board's data with it.
    /// Broadcasts the new view, plus display settings when they changed.
    pub async fn refresh(&self) {
        let (snapshot, display) = load_snapshot(self.store.as_ref()).await;

        let view = {
            let mut board = self.board.write().await;
            board.apply_snapshot(snapshot);
            board.view()
        };
        let _ = self.bus.send(BusMsg::Standings(view));

        let changed = {
            let mut current = self.display.write().await;
            if *current != display {
                *current = display.clone();
                true
            } else {
                false
            }
        };
        if changed {
            let redirect = &display.public_redirect;
            info!(redirect = ?redirect, "display settings changed");
            let _ = self.bus.send(BusMsg::Display(display));
        }
    }

    /// Stop the ceremony for good. Called once on shutdown.
    pub async fn teardown(&self) {
        self.board.write().await.teardown();
        info!("board torn down");
    }

    /// Broadcast ceremony events followed by the board as it now looks.
    pub fn publish_reveal(&self, events: Vec<RevealEvent>, view: BoardView) {
        for ev in events {
            let _ = self.bus.send(BusMsg::Reveal(ev));
        }
        let _ = self.bus.send(BusMsg::Standings(view));
    }
}

pub fn timing_from_settings(s: &BoardSettings) -> RevealTiming {
    RevealTiming {
        countdown_from: s.countdown_from.max(1),
        countdown_interval_ms: s.countdown_interval_ms,
        countup_steps: s.countup_steps,
        countup_interval_ms: s.countup_interval_ms,
        confetti_ms: s.confetti_ms,
    }
}

/// Fetch every dataset. Any failure degrades that dataset to its empty
/// default; the board never sees an error.
pub async fn load_snapshot(store: &dyn ScoreStore) -> (StandingsSnapshot, DisplaySettings) {
    let teams = store.fetch_teams().await.unwrap_or_else(|e| {
        warn!(error = %e, "fetch teams failed; showing no teams");
        Vec::new()
    });
    let events = store.fetch_events().await.unwrap_or_else(|e| {
        warn!(error = %e, "fetch events failed; using empty catalog");
        Vec::new()
    });
    let logs = store.fetch_score_log().await.unwrap_or_else(|e| {
        warn!(error = %e, "fetch score log failed; using empty log");
        Vec::new()
    });
    let display = store.fetch_display_settings().await.unwrap_or_else(|e| {
        warn!(error = %e, "fetch display settings failed; using defaults");
        DisplaySettings::default()
    });

    (StandingsSnapshot { teams, events, logs }, display)
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Emit a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    })
}

/// Refresh on a fixed cadence. The first tick fires immediately, which
/// doubles as the initial load.
pub fn spawn_poll_loop(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            state.refresh().await;
        }
    })
}

/// Refresh whenever the store reports a change. The payload is ignored.
pub fn spawn_change_listener(state: Arc<AppState>, retry: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let mut feed = match state.store.subscribe().await {
                Ok(feed) => feed,
                Err(e) => {
                    warn!(error = %e, "change subscription failed; polling only until retry");
                    tokio::time::sleep(retry).await;
                    continue;
                }
            };
            info!("change listener subscribed");
            while let Some(notice) = feed.next_change().await {
                debug!(table = %notice.table, "change notice");
                state.refresh().await;
            }
            warn!("change feed closed; resubscribing");
            tokio::time::sleep(retry).await;
        }
    })
}

/// Feed the monotonic clock into the reveal timers every `interval`.
pub fn spawn_reveal_driver(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let (events, view) = {
                let mut board = state.board.write().await;
                let events = board.advance(state.now_ms());
                if events.is_empty() {
                    continue;
                }
                (events, board.view())
            };
            state.publish_reveal(events, view);
        }
    })
}
