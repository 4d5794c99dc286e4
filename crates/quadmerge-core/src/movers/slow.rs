//! Slow movers: tiles that cross the board one cell per turn.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tilegrid::{merged_value, Cell, Direction, Grid, PassiveMask, Pos};
use tracing::trace;

use crate::events::SlowMoverUpdate;

/// A tile in the middle of a multi-turn slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlowMover {
    /// Cell the tile occupies now.
    pub current: Pos,
    /// Cell the tile is heading for.
    pub destination: Pos,
    /// Step direction.
    pub direction: Direction,
    /// Tile value.
    pub value: i32,
    /// Tile passives, restored on every step.
    pub passive: PassiveMask,
    /// Still travelling.
    pub active: bool,
}

impl SlowMover {
    /// A new active mover for `cell`, which now sits at `current`.
    #[must_use]
    pub fn new(current: Pos, destination: Pos, direction: Direction, cell: Cell) -> Self {
        Self {
            current,
            destination,
            direction,
            value: cell.value,
            passive: cell.passive,
            active: true,
        }
    }

    fn retire(&mut self) -> SlowMoverUpdate {
        self.active = false;
        SlowMoverUpdate {
            from: self.current,
            to: self.current,
            value: self.value,
            finished: true,
            merged: false,
        }
    }

    /// Advances one turn, keeping the grid in step.
    fn advance(&mut self, grid: &mut Grid) -> SlowMoverUpdate {
        if self.current == self.destination {
            return self.retire();
        }
        let Some(next) = grid.neighbor(self.current, self.direction) else {
            return self.retire();
        };

        let ahead = grid[next];
        if ahead.is_numbered() && ahead.value == self.value {
            let from = self.current;
            self.value = merged_value(self.value);
            grid[from] = Cell::EMPTY;
            grid[next] = Cell::numbered(self.value).with_passive(self.passive);
            self.current = next;
            self.active = false;
            trace!(%from, to = %next, value = self.value, "slow mover merged");
            return SlowMoverUpdate {
                from,
                to: next,
                value: self.value,
                finished: true,
                merged: true,
            };
        }
        if !ahead.is_empty() {
            return self.retire();
        }

        let from = self.current;
        grid[from] = Cell::EMPTY;
        grid[next] = Cell::numbered(self.value).with_passive(self.passive);
        self.current = next;
        let finished = next == self.destination;
        if finished {
            self.active = false;
        }
        trace!(%from, to = %next, finished, "slow mover stepped");

        SlowMoverUpdate {
            from,
            to: next,
            value: self.value,
            finished,
            merged: false,
        }
    }
}

/// The live list of slow movers, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlowMovers {
    movers: Vec<SlowMover>,
}

impl SlowMovers {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mover.
    pub fn push(&mut self, mover: SlowMover) {
        self.movers.push(mover);
    }

    /// All movers, in creation order.
    #[must_use]
    pub fn as_slice(&self) -> &[SlowMover] {
        &self.movers
    }

    /// The mover at `index`, for phases that merge into a mover's tile.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut SlowMover> {
        self.movers.get_mut(index)
    }

    /// Number of movers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.movers.len()
    }

    /// True when nothing is travelling.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movers.is_empty()
    }

    /// Cells occupied by active movers.
    #[must_use]
    pub fn active_positions(&self) -> BTreeSet<Pos> {
        self.movers
            .iter()
            .filter(|mover| mover.active)
            .map(|mover| mover.current)
            .collect()
    }

    /// Drops every mover anchored at `pos`. Returns how many were dropped.
    pub fn remove_at(&mut self, pos: Pos) -> usize {
        let before = self.movers.len();
        self.movers.retain(|mover| mover.current != pos);
        before - self.movers.len()
    }

    /// Rewrites the passives carried by every mover on `pos`.
    pub fn set_passive_at(&mut self, pos: Pos, passive: PassiveMask) {
        for mover in self.movers.iter_mut().filter(|mover| mover.current == pos) {
            mover.passive = passive;
        }
    }

    /// Retires every active mover on `pos` except the one at `merger`. Their
    /// tile was merged away, so they no longer follow anything.
    pub fn consume_at(&mut self, pos: Pos, merger: usize) {
        for (index, mover) in self.movers.iter_mut().enumerate() {
            if index != merger && mover.active && mover.current == pos {
                mover.active = false;
                trace!(%pos, value = mover.value, "slow mover consumed by merge");
            }
        }
    }

    /// Drops movers that are no longer travelling.
    pub fn prune(&mut self) {
        self.movers.retain(|mover| mover.active);
    }

    /// Advances every active mover not sitting on a `frozen` cell, then prunes
    /// the ones that finished or were merged into.
    pub fn advance(&mut self, grid: &mut Grid, frozen: &BTreeSet<Pos>) -> Vec<SlowMoverUpdate> {
        let mut updates = Vec::new();
        for index in 0..self.movers.len() {
            let mover = &mut self.movers[index];
            if !mover.active || frozen.contains(&mover.current) {
                continue;
            }
            let update = mover.advance(grid);
            if update.merged {
                self.consume_at(update.to, index);
            }
            updates.push(update);
        }
        self.prune();
        updates
    }

    /// Moves every coordinate by `(dr, dc)` after the board grew up or left.
    pub fn shift(&mut self, dr: isize, dc: isize) {
        for mover in &mut self.movers {
            if let (Some(current), Some(destination)) =
                (mover.current.offset(dr, dc), mover.destination.offset(dr, dc))
            {
                mover.current = current;
                mover.destination = destination;
            }
        }
    }
}
