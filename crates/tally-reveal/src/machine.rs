use serde::{Deserialize, Serialize};

use crate::{MaskPatch, TimerKind, TimerSet, VisibilityMasks};

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Ceremony timing. All durations are milliseconds of the caller's clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealTiming {
    /// First countdown value; ticks run `countdown_from, ..., 0`.
    pub countdown_from: u32,
    pub countdown_interval_ms: u64,
    /// Count-up step is `ceil(target / countup_steps)`.
    pub countup_steps: u32,
    pub countup_interval_ms: u64,
    pub confetti_ms: u64,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            countdown_from: 10,
            countdown_interval_ms: 1_000,
            countup_steps: 80,
            countup_interval_ms: 20,
            confetti_ms: 6_000,
        }
    }
}

impl RevealTiming {
    /// Count-up increment for `target`. Never zero for a positive target.
    pub fn countup_step(&self, target: i64) -> i64 {
        let steps = i64::from(self.countup_steps.max(1));
        let step = target / steps + i64::from(target % steps != 0);
        step.max(1)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The team shown on the winner screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerCard {
    pub team_id: i64,
    pub team_name: String,
    /// Authoritative total at the moment of reveal.
    pub target: i64,
    /// Current value of the animated count-up.
    pub displayed: i64,
}

/// Leader as computed by the caller when the countdown reaches zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub team_id: i64,
    pub team_name: String,
    pub total: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RevealPhase {
    Idle,
    Countdown { remaining: u32 },
    /// `winner` is `None` only when the board had no teams at reveal time.
    Winner { winner: Option<WinnerCard> },
}

impl RevealPhase {
    pub fn name(&self) -> &'static str {
        match self {
            RevealPhase::Idle => "idle",
            RevealPhase::Countdown { .. } => "countdown",
            RevealPhase::Winner { .. } => "winner",
        }
    }
}

// ---------------------------------------------------------------------------
// Events / errors
// ---------------------------------------------------------------------------

/// Observable state changes, in the order they happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevealEvent {
    CountdownTick { remaining: u32 },
    WinnerRevealed { winner: Option<WinnerCard> },
    CountUp { displayed: i64, target: i64 },
    ConfettiStarted,
    ConfettiEnded,
    Dismissed { masks: VisibilityMasks },
    MasksChanged { masks: VisibilityMasks },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealError {
    /// Countdown can only start from idle.
    NotIdle { phase: &'static str },
    /// Dismissal only applies to the winner screen.
    NotWinner { phase: &'static str },
    /// Reset-toggles is destructive and must be confirmed.
    ConfirmationRequired,
    /// The board was torn down.
    Disposed,
}

impl std::fmt::Display for RevealError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevealError::NotIdle { phase } => {
                write!(f, "countdown requires idle board (phase={phase})")
            }
            RevealError::NotWinner { phase } => {
                write!(f, "nothing to dismiss: no winner on screen (phase={phase})")
            }
            RevealError::ConfirmationRequired => {
                write!(f, "reset-toggles requires explicit confirmation")
            }
            RevealError::Disposed => write!(f, "board has been torn down"),
        }
    }
}

impl std::error::Error for RevealError {}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealMachine {
    phase: RevealPhase,
    masks: VisibilityMasks,
    timers: TimerSet,
    timing: RevealTiming,
    confetti_active: bool,
    disposed: bool,
}

impl Default for RevealMachine {
    fn default() -> Self {
        Self::new(RevealTiming::default())
    }
}

impl RevealMachine {
    pub fn new(timing: RevealTiming) -> Self {
        Self {
            phase: RevealPhase::Idle,
            masks: VisibilityMasks::default(),
            timers: TimerSet::new(),
            timing: RevealTiming {
                countdown_from: timing.countdown_from.max(1),
                ..timing
            },
            confetti_active: false,
            disposed: false,
        }
    }

    pub fn phase(&self) -> &RevealPhase {
        &self.phase
    }

    pub fn masks(&self) -> VisibilityMasks {
        self.masks
    }

    pub fn timing(&self) -> RevealTiming {
        self.timing
    }

    pub fn confetti_active(&self) -> bool {
        self.confetti_active
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn timer_active(&self, kind: TimerKind) -> bool {
        self.timers.is_active(kind)
    }

    fn guard(&self) -> Result<(), RevealError> {
        if self.disposed {
            Err(RevealError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Operator action: idle -> countdown. Emits the first value at once.
    pub fn start_countdown(&mut self, now_ms: u64) -> Result<Vec<RevealEvent>, RevealError> {
        self.guard()?;
        if self.phase != RevealPhase::Idle {
            return Err(RevealError::NotIdle {
                phase: self.phase.name(),
            });
        }

        let remaining = self.timing.countdown_from;
        self.phase = RevealPhase::Countdown { remaining };
        self.timers.start_repeating(
            TimerKind::Countdown,
            now_ms,
            self.timing.countdown_interval_ms,
        );
        Ok(vec![RevealEvent::CountdownTick { remaining }])
    }

    /// Fire every timer due up to `now_ms`, in order. `leader` is consulted
    /// only when the countdown hits zero, so the winner reflects standings at
    /// that moment. A torn-down machine ignores the call.
    pub fn advance<F>(&mut self, now_ms: u64, mut leader: F) -> Vec<RevealEvent>
    where
        F: FnMut() -> Option<Leader>,
    {
        let mut out = Vec::new();
        if self.disposed {
            return out;
        }

        while let Some((kind, at)) = self.timers.next_due(now_ms) {
            match kind {
                TimerKind::Countdown => self.on_countdown_tick(at, &mut leader, &mut out),
                TimerKind::CountUp => self.on_countup_tick(&mut out),
                TimerKind::Confetti => {
                    self.confetti_active = false;
                    out.push(RevealEvent::ConfettiEnded);
                }
            }
        }
        out
    }

    fn on_countdown_tick<F>(&mut self, at: u64, leader: &mut F, out: &mut Vec<RevealEvent>)
    where
        F: FnMut() -> Option<Leader>,
    {
        let RevealPhase::Countdown { remaining } = self.phase else {
            self.timers.cancel(TimerKind::Countdown);
            return;
        };

        let remaining = remaining.saturating_sub(1);
        self.phase = RevealPhase::Countdown { remaining };
        out.push(RevealEvent::CountdownTick { remaining });

        if remaining == 0 {
            self.timers.cancel(TimerKind::Countdown);
            self.enter_winner(at, leader(), out);
        }
    }

    fn enter_winner(&mut self, at: u64, leader: Option<Leader>, out: &mut Vec<RevealEvent>) {
        let winner = leader.map(|l| WinnerCard {
            team_id: l.team_id,
            team_name: l.team_name,
            target: l.total,
            // Non-positive targets have nothing to count; show them as-is.
            displayed: if l.total > 0 { 0 } else { l.total },
        });

        if let Some(card) = &winner {
            if card.displayed != card.target {
                self.timers.start_repeating(
                    TimerKind::CountUp,
                    at,
                    self.timing.countup_interval_ms,
                );
            }
            self.confetti_active = true;
            self.timers
                .start_once(TimerKind::Confetti, at, self.timing.confetti_ms);
        }

        self.phase = RevealPhase::Winner {
            winner: winner.clone(),
        };
        out.push(RevealEvent::WinnerRevealed { winner: winner.clone() });
        if winner.is_some() {
            out.push(RevealEvent::ConfettiStarted);
        }
    }

    fn on_countup_tick(&mut self, out: &mut Vec<RevealEvent>) {
        let step_for = self.timing;
        let RevealPhase::Winner { winner: Some(card) } = &mut self.phase else {
            self.timers.cancel(TimerKind::CountUp);
            return;
        };

        let step = step_for.countup_step(card.target);
        card.displayed = card.displayed.saturating_add(step).min(card.target);
        out.push(RevealEvent::CountUp {
            displayed: card.displayed,
            target: card.target,
        });

        if card.displayed >= card.target {
            self.timers.cancel(TimerKind::CountUp);
        }
    }

    /// Operator action: winner -> idle. Reveals every mask regardless of
    /// what was hidden before.
    pub fn dismiss_winner(&mut self) -> Result<Vec<RevealEvent>, RevealError> {
        self.guard()?;
        if !matches!(self.phase, RevealPhase::Winner { .. }) {
            return Err(RevealError::NotWinner {
                phase: self.phase.name(),
            });
        }

        self.timers.cancel(TimerKind::CountUp);
        self.phase = RevealPhase::Idle;
        self.masks.reveal_all();
        Ok(vec![RevealEvent::Dismissed { masks: self.masks }])
    }

    /// Destructive partial reset: names, scores, bars and top-2 go back to
    /// hidden; `hide_all` keeps its value.
    pub fn reset_toggles(&mut self, confirmed: bool) -> Result<Vec<RevealEvent>, RevealError> {
        self.guard()?;
        if !confirmed {
            return Err(RevealError::ConfirmationRequired);
        }

        self.masks.conceal_for_suspense();
        Ok(vec![RevealEvent::MasksChanged { masks: self.masks }])
    }

    pub fn set_masks(&mut self, patch: &MaskPatch) -> Result<Vec<RevealEvent>, RevealError> {
        self.guard()?;
        self.masks.apply(patch);
        Ok(vec![RevealEvent::MasksChanged { masks: self.masks }])
    }

    /// Cancel every timer. Nothing fires afterwards.
    pub fn teardown(&mut self) {
        self.timers.cancel_all();
        self.confetti_active = false;
        self.disposed = true;
    }
}
