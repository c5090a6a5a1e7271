//! tally-reveal
//!
//! Live scoreboard state and the winner reveal ceremony.
//!
//! Phases cycle `Idle -> Countdown -> Winner -> Idle`:
//! - Countdown is entered only by operator action and ticks once per
//!   interval from `countdown_from` down to zero.
//! - Reaching zero reveals the current leader, recomputed at that instant.
//! - Winner returns to Idle only on explicit dismissal, which reveals every
//!   mask.
//!
//! Pure deterministic logic. No IO, no wall clock: the caller feeds a
//! monotonic millisecond clock into [`Scoreboard::advance`] and every timer
//! due up to that instant fires in order, one at a time.

mod board;
mod machine;
mod masks;
mod timers;

pub use board::{BoardRow, BoardView, Scoreboard, StandingsSnapshot};
pub use machine::{
    Leader, RevealError, RevealEvent, RevealMachine, RevealPhase, RevealTiming, WinnerCard,
};
pub use masks::{MaskPatch, VisibilityMasks};
pub use timers::{TimerKind, TimerSet};
