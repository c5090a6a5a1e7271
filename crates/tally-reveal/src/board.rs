use serde::{Deserialize, Serialize};
use tally_reconcile::{EventCatalog, Standing, Tally, BASE_POINTS};
use tally_schemas::{EventCategory, ScoreLogEntry, Team};

use crate::{
    Leader, MaskPatch, RevealError, RevealEvent, RevealMachine, RevealPhase, RevealTiming,
    VisibilityMasks,
};

/// Everything pulled from the store in one refresh. Always replaced whole,
/// never merged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsSnapshot {
    pub teams: Vec<Team>,
    pub events: Vec<EventCategory>,
    pub logs: Vec<ScoreLogEntry>,
}

/// One rendered row. `None` means masked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRow {
    pub rank: u32,
    pub name: Option<String>,
    pub score: Option<i64>,
    /// Progress bar fill relative to the leader, 0..=100.
    pub bar_pct: Option<u8>,
}

/// What a display renders right now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub phase: RevealPhase,
    pub masks: VisibilityMasks,
    pub confetti: bool,
    /// `hide_all` is set: `rows` is empty.
    pub blanked: bool,
    pub rows: Vec<BoardRow>,
}

/// State of one board instance: latest snapshot, derived catalog, masks and
/// reveal ceremony. Plain data; several boards can coexist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    base_points: i64,
    snapshot: StandingsSnapshot,
    catalog: EventCatalog,
    reveal: RevealMachine,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new(BASE_POINTS, RevealTiming::default())
    }
}

impl Scoreboard {
    pub fn new(base_points: i64, timing: RevealTiming) -> Self {
        Self {
            base_points,
            snapshot: StandingsSnapshot::default(),
            catalog: EventCatalog::empty(),
            reveal: RevealMachine::new(timing),
        }
    }

    pub fn base_points(&self) -> i64 {
        self.base_points
    }

    pub fn snapshot(&self) -> &StandingsSnapshot {
        &self.snapshot
    }

    pub fn reveal(&self) -> &RevealMachine {
        &self.reveal
    }

    /// Replace the data wholesale. Masks and the ceremony are untouched.
    pub fn apply_snapshot(&mut self, snapshot: StandingsSnapshot) {
        self.catalog = EventCatalog::from_events(&snapshot.events);
        self.snapshot = snapshot;
    }

    pub fn standings(&self) -> Vec<Standing> {
        tally_reconcile::rank_teams(
            &self.snapshot.teams,
            &self.snapshot.logs,
            &self.catalog,
            self.base_points,
        )
    }

    /// Unmasked admin table.
    pub fn tally(&self) -> Tally {
        tally_reconcile::tally(
            &self.snapshot.teams,
            &self.snapshot.logs,
            &self.catalog,
            self.base_points,
        )
    }

    pub fn leader(&self) -> Option<Leader> {
        leader_of(&self.snapshot.teams, self.base_points)
    }

    /// The board as a display should draw it, masks applied.
    pub fn view(&self) -> BoardView {
        let masks = self.reveal.masks();
        let rows = if masks.hide_all {
            Vec::new()
        } else {
            let standings = self.standings();
            let top = standings
                .first()
                .map(|s| s.breakdown.total)
                .unwrap_or(0);
            standings
                .iter()
                .map(|s| {
                    let suspense = masks.hide_top2 && s.rank <= 2;
                    BoardRow {
                        rank: s.rank,
                        name: (!masks.hide_names && !suspense)
                            .then(|| s.breakdown.team_name.clone()),
                        score: (!masks.hide_scores && !suspense).then_some(s.breakdown.total),
                        bar_pct: (!masks.hide_bars && !suspense)
                            .then(|| bar_pct(s.breakdown.total, top)),
                    }
                })
                .collect()
        };

        BoardView {
            phase: self.reveal.phase().clone(),
            masks,
            confetti: self.reveal.confetti_active(),
            blanked: masks.hide_all,
            rows,
        }
    }

    pub fn start_countdown(&mut self, now_ms: u64) -> Result<Vec<RevealEvent>, RevealError> {
        self.reveal.start_countdown(now_ms)
    }

    /// Fire due timers. The leader is recomputed from the snapshot held at
    /// the instant the countdown expires.
    pub fn advance(&mut self, now_ms: u64) -> Vec<RevealEvent> {
        let Self {
            snapshot,
            reveal,
            base_points,
            ..
        } = self;
        let base = *base_points;
        reveal.advance(now_ms, || leader_of(&snapshot.teams, base))
    }

    pub fn dismiss_winner(&mut self) -> Result<Vec<RevealEvent>, RevealError> {
        self.reveal.dismiss_winner()
    }

    pub fn reset_toggles(&mut self, confirmed: bool) -> Result<Vec<RevealEvent>, RevealError> {
        self.reveal.reset_toggles(confirmed)
    }

    pub fn set_masks(&mut self, patch: &MaskPatch) -> Result<Vec<RevealEvent>, RevealError> {
        self.reveal.set_masks(patch)
    }

    pub fn teardown(&mut self) {
        self.reveal.teardown();
    }
}

fn leader_of(teams: &[Team], base_points: i64) -> Option<Leader> {
    tally_reconcile::winner(teams, base_points).map(|t| Leader {
        team_id: t.id,
        team_name: t.name.clone(),
        total: tally_reconcile::total(t, base_points),
    })
}

fn bar_pct(total: i64, top: i64) -> u8 {
    if top <= 0 || total <= 0 {
        return 0;
    }
    let pct = (i128::from(total) * 100) / i128::from(top);
    u8::try_from(pct.clamp(0, 100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Scoreboard {
        let mut b = Scoreboard::default();
        b.apply_snapshot(StandingsSnapshot {
            teams: vec![
                Team::new(1, "Red", Some(200)),
                Team::new(2, "Blue", Some(100)),
                Team::new(3, "Green", Some(50)),
            ],
            events: vec![],
            logs: vec![],
        });
        b
    }

    #[test]
    fn bars_are_relative_to_leader() {
        let v = board().view();
        let bars: Vec<Option<u8>> = v.rows.iter().map(|r| r.bar_pct).collect();
        assert_eq!(bars, vec![Some(100), Some(50), Some(25)]);
    }

    #[test]
    fn top2_mask_hides_only_first_two_places() {
        let mut b = board();
        b.set_masks(&MaskPatch {
            hide_top2: Some(true),
            ..MaskPatch::default()
        })
        .unwrap();
        let v = b.view();
        assert_eq!(v.rows[0].name, None);
        assert_eq!(v.rows[1].score, None);
        assert_eq!(v.rows[2].name.as_deref(), Some("Green"));
        assert_eq!(v.rows[2].score, Some(50));
    }

    #[test]
    fn hide_all_blanks_rows_but_keeps_data() {
        let mut b = board();
        b.set_masks(&MaskPatch {
            hide_all: Some(true),
            ..MaskPatch::default()
        })
        .unwrap();
        let v = b.view();
        assert!(v.blanked);
        assert!(v.rows.is_empty());
        assert_eq!(b.standings().len(), 3);
    }

    #[test]
    fn negative_scores_draw_empty_bars() {
        assert_eq!(bar_pct(-10, 100), 0);
        assert_eq!(bar_pct(10, -5), 0);
        assert_eq!(bar_pct(150, 150), 100);
    }
}
