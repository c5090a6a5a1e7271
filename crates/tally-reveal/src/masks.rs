use serde::{Deserialize, Serialize};

/// Rendering-only masks. `true` means hidden. Masks never touch the data
/// underneath; standings keep refreshing whatever is hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityMasks {
    pub hide_names: bool,
    pub hide_scores: bool,
    pub hide_bars: bool,
    /// Hide name, score and bar of the first two places.
    pub hide_top2: bool,
    /// Blank the whole board.
    pub hide_all: bool,
}

impl VisibilityMasks {
    /// Everything hidden except the board itself, ready for a suspense run.
    pub fn suspense() -> Self {
        let mut m = Self::default();
        m.conceal_for_suspense();
        m
    }

    /// Winner dismissal: show everything. One-way; the previous state is
    /// not remembered.
    pub fn reveal_all(&mut self) {
        *self = Self::default();
    }

    /// Hide names, scores, bars and top-2. `hide_all` is left alone.
    pub fn conceal_for_suspense(&mut self) {
        self.hide_names = true;
        self.hide_scores = true;
        self.hide_bars = true;
        self.hide_top2 = true;
    }

    pub fn apply(&mut self, patch: &MaskPatch) {
        if let Some(v) = patch.hide_names {
            self.hide_names = v;
        }
        if let Some(v) = patch.hide_scores {
            self.hide_scores = v;
        }
        if let Some(v) = patch.hide_bars {
            self.hide_bars = v;
        }
        if let Some(v) = patch.hide_top2 {
            self.hide_top2 = v;
        }
        if let Some(v) = patch.hide_all {
            self.hide_all = v;
        }
    }

    /// True when none of the four per-field masks is set.
    pub fn fields_revealed(&self) -> bool {
        !(self.hide_names || self.hide_scores || self.hide_bars || self.hide_top2)
    }
}

/// Partial update for individual toggles; absent fields are unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskPatch {
    #[serde(default)]
    pub hide_names: Option<bool>,
    #[serde(default)]
    pub hide_scores: Option<bool>,
    #[serde(default)]
    pub hide_bars: Option<bool>,
    #[serde(default)]
    pub hide_top2: Option<bool>,
    #[serde(default)]
    pub hide_all: Option<bool>,
}
