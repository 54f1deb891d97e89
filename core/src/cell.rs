use serde::{Deserialize, Serialize};

/// Player-visible state of one playable cell.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    Flagged,
    /// Safe cell opened, showing its adjacent-fire count.
    Open(u8),
    /// Fire cell neutralized by an ability; disabled but harmless.
    Frozen,
    /// Fire cell shown in its fatal state.
    Blazing,
}

impl CellState {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }

    /// Resolved cells no longer accept reveal attempts.
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Open(_) | Self::Frozen | Self::Blazing)
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}

/// One cell of the round grid: visible state plus the transient gem overlay.
///
/// Invariant: a gem only ever sits on an unrevealed cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub state: CellState,
    pub gem: bool,
}
