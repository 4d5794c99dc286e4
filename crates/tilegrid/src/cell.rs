//! Grid cells and special tile sentinels.

use serde::{Deserialize, Serialize};

use crate::passive::PassiveMask;

/// Sentinel value for a bomb tile.
pub const BOMB: i32 = -1;
/// Sentinel value for a hazard ("snail") that wanders one cell per turn.
pub const HAZARD: i32 = -2;
/// Sentinel value for an indestructible wall.
pub const WALL: i32 = -3;

/// Value of two equal tiles merged into one, pinned at `i32::MAX`.
#[must_use]
pub const fn merged_value(value: i32) -> i32 {
    value.saturating_mul(2)
}

/// Classification of a cell by its value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Value 0.
    Empty,
    /// Positive value.
    Numbered,
    /// [`BOMB`].
    Bomb,
    /// [`HAZARD`].
    Hazard,
    /// [`WALL`], and any other negative value.
    Wall,
}

/// One grid cell: a value plus the passive effects of the tile on it.
///
/// Invariant: a cell with a non-positive value never carries a passive mask.
/// The constructors and [`Cell::with_passive`] enforce this.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// 0 for empty, positive for a numbered tile, negative for a special tile.
    pub value: i32,
    /// Passive effects of the tile.
    pub passive: PassiveMask,
}

impl Cell {
    /// An empty cell.
    pub const EMPTY: Self = Self {
        value: 0,
        passive: PassiveMask::empty(),
    };

    /// A numbered tile without passives.
    #[must_use]
    pub const fn numbered(value: i32) -> Self {
        Self {
            value,
            passive: PassiveMask::empty(),
        }
    }

    /// A bomb tile.
    #[must_use]
    pub const fn bomb() -> Self {
        Self::numbered(BOMB)
    }

    /// A hazard tile.
    #[must_use]
    pub const fn hazard() -> Self {
        Self::numbered(HAZARD)
    }

    /// A wall tile.
    #[must_use]
    pub const fn wall() -> Self {
        Self::numbered(WALL)
    }

    /// Returns this cell with `passive` attached, dropped again if the cell is
    /// not a numbered tile.
    #[must_use]
    pub fn with_passive(self, passive: PassiveMask) -> Self {
        Self {
            value: self.value,
            passive: if self.value > 0 {
                passive
            } else {
                PassiveMask::empty()
            },
        }
    }

    /// Classifies the cell.
    #[must_use]
    pub const fn kind(&self) -> CellKind {
        match self.value {
            0 => CellKind::Empty,
            v if v > 0 => CellKind::Numbered,
            BOMB => CellKind::Bomb,
            HAZARD => CellKind::Hazard,
            _ => CellKind::Wall,
        }
    }

    /// True for value 0.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.value == 0
    }

    /// True for a positive value.
    #[must_use]
    pub const fn is_numbered(&self) -> bool {
        self.value > 0
    }

    /// True for a bomb.
    #[must_use]
    pub const fn is_bomb(&self) -> bool {
        self.value == BOMB
    }

    /// True for a hazard.
    #[must_use]
    pub const fn is_hazard(&self) -> bool {
        self.value == HAZARD
    }

    /// True for a wall.
    #[must_use]
    pub const fn is_wall(&self) -> bool {
        matches!(self.kind(), CellKind::Wall)
    }

    /// True when the tile carries at least one passive.
    #[must_use]
    pub const fn has_passive(&self) -> bool {
        !self.passive.is_empty()
    }

    /// Empties the cell and returns what was there.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}
