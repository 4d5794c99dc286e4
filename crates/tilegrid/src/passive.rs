//! Passive tile effects.
//!
//! A passive is a persistent effect carried by a numbered tile. Tiles may hold
//! several at once, so effects are stored as a bitmask. The mask travels with
//! the tile when it slides and is inherited by merges; it is cleared whenever
//! the tile is destroyed or the cell is emptied.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Bitmask of passive effects on a tile.
    ///
    /// # Example
    ///
    /// ```
    /// use tilegrid::PassiveMask;
    ///
    /// let mask = PassiveMask::SLOW | PassiveMask::CONTRARIAN;
    /// assert!(mask.contains(PassiveMask::SLOW));
    /// assert_eq!(PassiveMask::from_bits_truncate(0xFF), PassiveMask::all());
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PassiveMask: u8 {
        /// Moves one cell per turn along its path instead of sliding instantly.
        const SLOW = 0b0000_0001;
        /// Moves in the direction opposite to the player's input.
        const CONTRARIAN = 0b0000_0010;
    }
}

impl Default for PassiveMask {
    fn default() -> Self {
        Self::empty()
    }
}

impl PassiveMask {
    /// Display name of a single effect, or `"None"` for an empty or combined mask.
    #[must_use]
    pub fn name(self) -> &'static str {
        if self == Self::SLOW {
            "A Little Slow"
        } else if self == Self::CONTRARIAN {
            "Contrarian"
        } else {
            "None"
        }
    }

    /// Player-facing description of a single effect.
    #[must_use]
    pub fn description(self) -> &'static str {
        if self == Self::SLOW {
            "Tile moves one cell per turn along its path instead of instantly."
        } else if self == Self::CONTRARIAN {
            "Tile moves in the opposite direction of your input."
        } else {
            ""
        }
    }
}
