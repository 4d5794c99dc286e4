//! Turn output: the events a host needs to animate a turn.
//!
//! Every phase of [`Engine::process_move`](crate::engine::Engine::process_move)
//! writes into one [`TurnResult`]. Events are grouped by the phase that
//! produced them so a host can play them back in order:
//!
//! 1. `moves` / `merges`: ordinary sliding (plus cascade fills)
//! 2. `slow_mover_updates`: one-cell steps of multi-turn movers
//! 3. `behavior_moves` / `behavior_merges`: slow and contrarian tile motion
//! 4. `random_mover_updates`: hazard relocations
//!
//! Destroyed cells, spawns, grants and the expansion flag are turn-level
//! side effects.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tilegrid::Pos;

// =============================================================================
// Events
// =============================================================================

/// A tile changed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvent {
    /// Where the tile started.
    pub from: Pos,
    /// Where the tile ended.
    pub to: Pos,
    /// Tile value before any merge at `to`.
    pub value: i32,
}

impl MoveEvent {
    /// Creates a move event.
    #[must_use]
    pub const fn new(from: Pos, to: Pos, value: i32) -> Self {
        Self { from, to, value }
    }
}

/// Two tiles combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEvent {
    /// Where the merged tile sits.
    pub pos: Pos,
    /// Value of the merged tile.
    pub value: i32,
}

impl MergeEvent {
    /// Creates a merge event.
    #[must_use]
    pub const fn new(pos: Pos, value: i32) -> Self {
        Self { pos, value }
    }
}

/// One turn of progress for a multi-turn slow mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlowMoverUpdate {
    /// Position before the step.
    pub from: Pos,
    /// Position after the step (equal to `from` when the mover stopped).
    pub to: Pos,
    /// Tile value after the step.
    pub value: i32,
    /// The mover is done and has been retired.
    pub finished: bool,
    /// The step ended in a merge with an equal tile.
    pub merged: bool,
}

/// A hazard relocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomMoverUpdate {
    /// Previous hazard position.
    pub from: Pos,
    /// New hazard position.
    pub to: Pos,
}

/// A candidate passive grant produced by the roller.
///
/// Grants are proposals: the engine never applies them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveGrant {
    /// Tile chosen to receive a passive.
    pub pos: Pos,
    /// Value of that tile when chosen.
    pub tile_value: i32,
}

// =============================================================================
// Turn Result
// =============================================================================

/// Everything that happened during one call to `process_move`.
///
/// When `board_changed` is false the move was rejected and every other field
/// is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// The move was valid and the board changed.
    pub board_changed: bool,
    /// Ordinary slides and cascade fills.
    pub moves: Vec<MoveEvent>,
    /// Ordinary merges.
    pub merges: Vec<MergeEvent>,
    /// Slides performed by tile behaviors.
    pub behavior_moves: Vec<MoveEvent>,
    /// Merges performed by tile behaviors.
    pub behavior_merges: Vec<MergeEvent>,
    /// Cells emptied by bombs this turn, both bomb and target.
    pub bomb_destroyed: BTreeSet<Pos>,
    /// Hazards destroyed by detonation this turn.
    pub hazard_kills: Vec<Pos>,
    /// Slow mover steps.
    pub slow_mover_updates: Vec<SlowMoverUpdate>,
    /// Hazard relocations.
    pub random_mover_updates: Vec<RandomMoverUpdate>,
    /// Points earned this turn.
    pub score_delta: i64,
    /// Position of the tile spawned after the turn, if any.
    pub spawned_tile: Option<Pos>,
    /// Position of a hazard spawned by the respawn timer, if any.
    pub spawned_hazard: Option<Pos>,
    /// Passive grant candidates for the host to apply.
    pub passive_grants: Vec<PassiveGrant>,
    /// A merge reached the expansion threshold.
    pub expansion_required: bool,
}

impl TurnResult {
    /// Every merge of the turn regardless of the phase that produced it:
    /// ordinary, behavior and slow-mover merges, in that order.
    #[must_use]
    pub fn all_merges(&self) -> Vec<MergeEvent> {
        let mover_merges = self
            .slow_mover_updates
            .iter()
            .filter(|update| update.merged)
            .map(|update| MergeEvent::new(update.to, update.value));

        self.merges
            .iter()
            .chain(&self.behavior_merges)
            .copied()
            .chain(mover_merges)
            .collect()
    }

    /// Sum of every merged value.
    #[must_use]
    pub fn merge_total(&self) -> i64 {
        self.all_merges()
            .iter()
            .map(|merge| i64::from(merge.value))
            .sum()
    }
}
