use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The independent timers a board can run. Declaration order is the firing
/// order when two timers fall due on the same millisecond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Countdown,
    CountUp,
    Confetti,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Timer {
    due_ms: u64,
    /// `Some` for fixed-interval timers, `None` for one-shots.
    every_ms: Option<u64>,
}

/// Cancellable virtual timers keyed by kind. Starting a kind that is already
/// running replaces it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSet {
    timers: BTreeMap<TimerKind, Timer>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// First fire at `now_ms + every_ms`, then every `every_ms`.
    pub fn start_repeating(&mut self, kind: TimerKind, now_ms: u64, every_ms: u64) {
        let every_ms = every_ms.max(1);
        self.timers.insert(
            kind,
            Timer {
                due_ms: now_ms.saturating_add(every_ms),
                every_ms: Some(every_ms),
            },
        );
    }

    pub fn start_once(&mut self, kind: TimerKind, now_ms: u64, after_ms: u64) {
        self.timers.insert(
            kind,
            Timer {
                due_ms: now_ms.saturating_add(after_ms),
                every_ms: None,
            },
        );
    }

    /// Returns whether a timer was running.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.timers.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.timers.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pop the earliest firing due at or before `now_ms`, returning its kind
    /// and the instant it was due. Repeating timers are re-armed one period
    /// after that instant, so a late caller still sees every period.
    pub fn next_due(&mut self, now_ms: u64) -> Option<(TimerKind, u64)> {
        let (kind, due_ms) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by_key(|(k, t)| (t.due_ms, **k))
            .map(|(k, t)| (*k, t.due_ms))?;

        let rearmed = match self.timers.get_mut(&kind) {
            Some(timer) => match timer.every_ms {
                Some(every) => {
                    timer.due_ms = timer.due_ms.saturating_add(every);
                    true
                }
                None => false,
            },
            None => false,
        };
        if !rearmed {
            self.timers.remove(&kind);
        }

        Some((kind, due_ms))
    }
}
