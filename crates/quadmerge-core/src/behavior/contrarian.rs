//! Contrarian tiles: they move against the player's input.

use std::collections::BTreeSet;

use tilegrid::{merged_value, Cell, Direction, Grid, PassiveMask, Pos};

use super::{owned_tiles, scan_ahead, MoveContext, TileBehavior};
use crate::events::{MergeEvent, MoveEvent, TurnResult};
use crate::movers::SlowMover;

/// Owns every tile with the contrarian bit, slow or not.
///
/// A pure contrarian tile slides (or merges) its full distance in the
/// direction opposite the move. A slow contrarian tile steps one cell and
/// hands the rest to a [`SlowMover`] walking the same way, unless its merge
/// partner is adjacent.
///
/// Whether a tile is blocked is decided on the pre-move board: a tile whose
/// opposite-side neighbour was an edge, or a non-contrarian tile, stays put
/// even if ordinary movement has since cleared the way.
#[derive(Debug, Clone, Default)]
pub struct ContrarianBehavior {
    /// Owned tiles at snapshot time, nearest to the opposite wall first.
    positions: Vec<Pos>,
    /// Owned tiles that were blocked before ordinary movement.
    pre_blocked: BTreeSet<Pos>,
}

impl ContrarianBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TileBehavior for ContrarianBehavior {
    fn name(&self) -> &'static str {
        "contrarian"
    }

    fn matches(&self, passive: PassiveMask) -> bool {
        passive.contains(PassiveMask::CONTRARIAN)
    }

    fn freeze_during_move(&self) -> bool {
        true
    }

    fn pre_snapshot(&mut self, grid: &Grid, direction: Direction) {
        let toward = direction.opposite();
        self.positions = owned_tiles(self, grid, toward);
        self.pre_blocked = self
            .positions
            .iter()
            .copied()
            .filter(|pos| match grid.neighbor(*pos, toward) {
                None => true,
                Some(next) => {
                    let cell = grid[next];
                    !cell.is_empty() && !cell.passive.contains(PassiveMask::CONTRARIAN)
                }
            })
            .collect();
    }

    fn advance(&self, ctx: &mut MoveContext<'_>, result: &mut TurnResult) -> bool {
        let toward = ctx.direction.opposite();
        let mut anchored = ctx.slow_movers.active_positions();
        let mut changed = false;

        for &origin in &self.positions {
            let cell = ctx.grid[origin];
            if !cell.is_numbered() || !self.matches(cell.passive) {
                continue;
            }
            if ctx.reserved.contains(&origin) || self.pre_blocked.contains(&origin) {
                continue;
            }

            let landing = scan_ahead(ctx.grid, origin, toward, |pos, _| !anchored.contains(&pos));
            let (Some(landing), Some(next)) = (landing, ctx.grid.neighbor(origin, toward)) else {
                continue;
            };
            let slow = cell.passive.contains(PassiveMask::SLOW);
            let distance = origin.distance(landing.pos);

            let tile = ctx.grid[origin].take();
            if landing.merge && (!slow || distance == 1) {
                let merged = Cell::numbered(merged_value(tile.value)).with_passive(tile.passive);
                ctx.grid[landing.pos] = merged;
                result
                    .behavior_moves
                    .push(MoveEvent::new(origin, landing.pos, tile.value));
                result
                    .behavior_merges
                    .push(MergeEvent::new(landing.pos, merged.value));
            } else if slow && distance > 1 {
                ctx.grid[next] = tile;
                result
                    .behavior_moves
                    .push(MoveEvent::new(origin, next, tile.value));
                ctx.slow_movers
                    .push(SlowMover::new(next, landing.pos, toward, tile));
                anchored.insert(next);
            } else {
                ctx.grid[landing.pos] = tile;
                result
                    .behavior_moves
                    .push(MoveEvent::new(origin, landing.pos, tile.value));
            }
            changed = true;
        }
        changed
    }

    fn requires_mover_cleanup(&self, passive: PassiveMask) -> bool {
        passive.contains(PassiveMask::SLOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::run_behavior;
    use crate::movers::SlowMovers;

    fn p(row: usize, col: usize) -> Pos {
        Pos::new(row, col)
    }

    fn contrarian(value: i32) -> Cell {
        Cell::numbered(value).with_passive(PassiveMask::CONTRARIAN)
    }

    fn row(cells: &[Cell]) -> Grid {
        let mut grid = Grid::with_seed(1, cells.len(), 0);
        for (col, cell) in cells.iter().enumerate() {
            grid[p(0, col)] = *cell;
        }
        grid
    }

    fn advance(grid: &mut Grid, movers: &mut SlowMovers) -> (bool, TurnResult) {
        run_behavior(
            &mut ContrarianBehavior::new(),
            grid,
            movers,
            &BTreeSet::new(),
            Direction::Left,
        )
    }

    #[test]
    fn owns_any_contrarian_mask() {
        let behavior = ContrarianBehavior::new();
        assert!(behavior.matches(PassiveMask::CONTRARIAN));
        assert!(behavior.matches(PassiveMask::CONTRARIAN | PassiveMask::SLOW));
        assert!(!behavior.matches(PassiveMask::SLOW));
        assert!(behavior.requires_mover_cleanup(PassiveMask::all()));
        assert!(!behavior.requires_mover_cleanup(PassiveMask::CONTRARIAN));
    }

    #[test]
    fn slides_against_input() {
        let mut grid = row(&[contrarian(4), Cell::EMPTY, Cell::EMPTY, Cell::EMPTY]);
        let mut movers = SlowMovers::new();

        let (changed, result) = advance(&mut grid, &mut movers);

        assert!(changed);
        assert_eq!(grid.values(), vec![0, 0, 0, 4]);
        assert_eq!(grid[p(0, 3)].passive, PassiveMask::CONTRARIAN);
        assert_eq!(result.behavior_moves, vec![MoveEvent::new(p(0, 0), p(0, 3), 4)]);
        assert!(movers.is_empty());
    }

    #[test]
    fn merges_full_distance() {
        let mut grid = row(&[contrarian(4), Cell::EMPTY, Cell::numbered(4)]);
        let mut movers = SlowMovers::new();

        let (_, result) = advance(&mut grid, &mut movers);

        assert_eq!(grid.values(), vec![0, 0, 8]);
        assert_eq!(grid[p(0, 2)].passive, PassiveMask::CONTRARIAN);
        assert_eq!(result.behavior_merges, vec![MergeEvent::new(p(0, 2), 8)]);
    }

    #[test]
    fn blocked_before_move_stays_blocked() {
        let mut grid = row(&[contrarian(4), Cell::numbered(2), Cell::EMPTY]);
        let mut behavior = ContrarianBehavior::new();
        behavior.pre_snapshot(&grid, Direction::Left);

        // Clear the way after the snapshot.
        grid[p(0, 1)] = Cell::EMPTY;

        let registry = crate::behavior::BehaviorRegistry::with_defaults();
        let mut movers = SlowMovers::new();
        let empty = BTreeSet::new();
        let mut ctx = MoveContext {
            grid: &mut grid,
            slow_movers: &mut movers,
            user_frozen: &empty,
            reserved: &empty,
            direction: Direction::Left,
            registry: &registry,
        };
        assert!(!behavior.advance(&mut ctx, &mut TurnResult::default()));
    }

    #[test]
    fn edge_tile_is_blocked() {
        let mut grid = row(&[Cell::EMPTY, contrarian(4)]);
        let mut movers = SlowMovers::new();
        let (changed, _) = advance(&mut grid, &mut movers);
        assert!(!changed);
        assert_eq!(grid.values(), vec![0, 4]);
    }

    #[test]
    fn contrarian_neighbours_do_not_block() {
        let mut grid = row(&[contrarian(2), contrarian(4), Cell::EMPTY]);
        let mut movers = SlowMovers::new();

        advance(&mut grid, &mut movers);

        // The wall-side tile moves first and makes room.
        assert_eq!(grid.values(), vec![0, 2, 4]);
    }

    #[test]
    fn slow_contrarian_steps_once() {
        let both = PassiveMask::CONTRARIAN | PassiveMask::SLOW;
        let mut grid = row(&[
            Cell::numbered(2).with_passive(both),
            Cell::EMPTY,
            Cell::EMPTY,
        ]);
        let mut movers = SlowMovers::new();

        advance(&mut grid, &mut movers);

        assert_eq!(grid.values(), vec![0, 2, 0]);
        assert_eq!(grid[p(0, 1)].passive, both);
        let mover = movers.as_slice()[0];
        assert_eq!(mover.destination, p(0, 2));
        assert_eq!(mover.direction, Direction::Right);
    }

    #[test]
    fn new_movers_are_not_merge_targets() {
        let both = PassiveMask::CONTRARIAN | PassiveMask::SLOW;
        let mut grid = row(&[
            Cell::EMPTY,
            contrarian(2),
            Cell::numbered(2).with_passive(both),
            Cell::EMPTY,
            Cell::EMPTY,
        ]);
        let mut movers = SlowMovers::new();

        advance(&mut grid, &mut movers);

        // The slow tile steps first; the other one stops short of it.
        assert_eq!(grid.values(), vec![0, 0, 2, 2, 0]);
        assert_eq!(movers.as_slice()[0].current, p(0, 3));
        assert_eq!(movers.as_slice()[0].value, 2);
    }

    #[test]
    fn slow_contrarian_merges_when_adjacent() {
        let both = PassiveMask::CONTRARIAN | PassiveMask::SLOW;
        let mut grid = row(&[Cell::numbered(2).with_passive(both), Cell::numbered(2)]);
        let mut movers = SlowMovers::new();

        let mut behavior = ContrarianBehavior::new();
        // Snapshot a board where the partner has not arrived yet.
        let mut snapshot = grid.clone();
        snapshot[p(0, 1)] = Cell::EMPTY;
        behavior.pre_snapshot(&snapshot, Direction::Left);

        let registry = crate::behavior::BehaviorRegistry::with_defaults();
        let empty = BTreeSet::new();
        let mut ctx = MoveContext {
            grid: &mut grid,
            slow_movers: &mut movers,
            user_frozen: &empty,
            reserved: &empty,
            direction: Direction::Left,
            registry: &registry,
        };
        let mut result = TurnResult::default();
        assert!(behavior.advance(&mut ctx, &mut result));

        assert_eq!(grid.values(), vec![0, 4]);
        assert_eq!(result.behavior_merges, vec![MergeEvent::new(p(0, 1), 4)]);
        assert!(movers.is_empty());
    }
}
