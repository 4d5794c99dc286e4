//! Random movers: hazards that wander one cell per valid turn.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tilegrid::{Cell, CellKind, Direction, Grid, Pos};
use tracing::trace;

use crate::events::RandomMoverUpdate;

/// A hazard found on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomMover {
    /// Hazard position.
    pub pos: Pos,
}

/// Hazard list plus the random source that steers it.
///
/// The list is a view of the grid: [`RandomMovers::rescan`] rebuilds it from
/// the hazard cells before every advance.
#[derive(Debug, Clone)]
pub struct RandomMovers {
    movers: Vec<RandomMover>,
    rng: ChaCha8Rng,
}

impl RandomMovers {
    /// An empty list steered by `rng`.
    #[must_use]
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            movers: Vec::new(),
            rng,
        }
    }

    /// Hazards as of the last rescan or advance.
    #[must_use]
    pub fn as_slice(&self) -> &[RandomMover] {
        &self.movers
    }

    /// Rebuilds the list from the grid, row-major.
    pub fn rescan(&mut self, grid: &Grid) {
        self.movers = grid
            .find(CellKind::Hazard)
            .into_iter()
            .map(|pos| RandomMover { pos })
            .collect();
    }

    /// Moves every hazard not on a `frozen` cell to a random empty or bomb
    /// neighbour. A hazard stepping onto a bomb destroys both; their cells are
    /// added to `destroyed`.
    pub fn advance(
        &mut self,
        grid: &mut Grid,
        frozen: &BTreeSet<Pos>,
        destroyed: &mut BTreeSet<Pos>,
    ) -> Vec<RandomMoverUpdate> {
        self.rescan(grid);
        let mut updates = Vec::new();

        for mover in &mut self.movers {
            if frozen.contains(&mover.pos) {
                continue;
            }
            let candidates: Vec<Pos> = Direction::ALL
                .into_iter()
                .filter_map(|dir| grid.neighbor(mover.pos, dir))
                .filter(|pos| grid[*pos].is_empty() || grid[*pos].is_bomb())
                .collect();
            let Some(&to) = candidates.choose(&mut self.rng) else {
                continue;
            };

            let from = mover.pos;
            grid[from] = Cell::EMPTY;
            if grid[to].is_bomb() {
                grid[to] = Cell::EMPTY;
                destroyed.insert(from);
                destroyed.insert(to);
                trace!(%from, bomb = %to, "hazard walked into a bomb");
            } else {
                grid[to] = Cell::hazard();
                trace!(%from, %to, "hazard moved");
            }
            mover.pos = to;
            updates.push(RandomMoverUpdate { from, to });
        }

        self.movers.retain(|mover| grid[mover.pos].is_hazard());
        updates
    }

}

/// Countdown until a destroyed hazard is replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespawnTimer {
    remaining: u32,
}

impl RespawnTimer {
    /// Starts (or restarts) the countdown.
    pub fn arm(&mut self, turns: u32) {
        self.remaining = turns;
    }

    /// Turns left, 0 when idle.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Counts one turn down. Returns true on the turn the countdown expires.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }
}
