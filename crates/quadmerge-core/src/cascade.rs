//! Cascade fill: ordinary tiles sliding into a cell a special tile vacated.
//!
//! When a slow tile steps forward or a hazard wanders off, the ordinary tiles
//! lined up behind it (opposite the move direction) each advance one cell,
//! nearest first, until the chain hits something that does not cascade.

use std::collections::BTreeSet;

use tilegrid::{Cell, Direction, Grid, Pos};
use tracing::trace;

use crate::behavior::BehaviorRegistry;
use crate::events::MoveEvent;

/// What stops a cascade.
#[derive(Debug, Clone, Copy)]
pub struct CascadeRules<'a> {
    /// Player move direction; the cascade pulls tiles along it.
    pub direction: Direction,
    /// Behaviors whose tiles may block the chain.
    pub registry: &'a BehaviorRegistry,
    /// Cells held by active slow movers.
    pub reserved: &'a BTreeSet<Pos>,
    /// Single-turn user freezes.
    pub user_frozen: &'a BTreeSet<Pos>,
}

impl CascadeRules<'_> {
    /// True if the tile at `pos` may be pulled forward.
    fn can_pull(&self, grid: &Grid, pos: Pos) -> bool {
        let cell = grid[pos];
        cell.is_numbered()
            && !self.registry.blocks_cascade(cell.passive)
            && !self.reserved.contains(&pos)
            && !self.user_frozen.contains(&pos)
    }
}

/// Pulls ordinary tiles forward into `vacated`, one cell each, recording a
/// move per step. Returns the number of tiles moved.
pub fn cascade_fill(
    grid: &mut Grid,
    vacated: Pos,
    rules: &CascadeRules<'_>,
    moves: &mut Vec<MoveEvent>,
) -> usize {
    let behind = rules.direction.opposite();
    let mut fill = vacated;
    let mut pulled = 0;

    while let Some(source) = grid.neighbor(fill, behind) {
        if !rules.can_pull(grid, source) {
            break;
        }
        let cell = grid[source];
        grid[source] = Cell::EMPTY;
        grid[fill] = cell;
        moves.push(MoveEvent::new(source, fill, cell.value));
        trace!(from = %source, to = %fill, value = cell.value, "cascade step");

        fill = source;
        pulled += 1;
    }
    pulled
}
