//! Slow tiles: one cell per turn in the player's direction.

use tilegrid::{merged_value, Cell, Direction, Grid, PassiveMask, Pos};

use super::{owned_tiles, scan_ahead, MoveContext, TileBehavior};
use crate::events::{MergeEvent, MoveEvent, TurnResult};
use crate::movers::SlowMover;

/// Owns tiles that are slow but not contrarian.
///
/// During ordinary movement a slow tile and the equal tile directly behind
/// it are frozen. Afterwards, nearest-to-the-wall first, each slow tile:
///
/// 1. absorbs an equal tile that compacted up behind it
/// 2. finds where an ordinary slide would take it
/// 3. merges if that is the adjacent cell, otherwise steps one cell and
///    hands the rest of the trip to a [`SlowMover`]
///
/// The cell it leaves is cascade-filled.
#[derive(Debug, Clone, Default)]
pub struct SlowBehavior {
    /// Owned tiles at snapshot time, nearest to the move wall first.
    positions: Vec<Pos>,
}

impl SlowBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges an equal tile behind `origin` into it. Returns the new value.
    fn absorb_behind(
        ctx: &mut MoveContext<'_>,
        origin: Pos,
        result: &mut TurnResult,
    ) -> Option<i32> {
        let behind = ctx.grid.neighbor(origin, ctx.direction.opposite())?;
        let (tile, value) = (ctx.grid[behind], ctx.grid[origin].value);
        if !tile.is_numbered() || tile.value != value || ctx.reserved.contains(&behind) {
            return None;
        }

        let merged = merged_value(value);
        ctx.grid[behind] = Cell::EMPTY;
        ctx.grid[origin].value = merged;
        result.behavior_moves.push(MoveEvent::new(behind, origin, tile.value));
        result.behavior_merges.push(MergeEvent::new(origin, merged));
        ctx.slow_movers.remove_at(behind);
        Some(merged)
    }

    /// Merges into user-frozen slow movers any equal tile that ordinary
    /// movement packed behind them. These animate with ordinary movement.
    fn merge_into_frozen_movers(ctx: &mut MoveContext<'_>, result: &mut TurnResult) -> bool {
        let behind = ctx.direction.opposite();
        let mut changed = false;

        for index in 0..ctx.slow_movers.len() {
            let mover = ctx.slow_movers.as_slice()[index];
            if !mover.active || !ctx.user_frozen.contains(&mover.current) {
                continue;
            }
            let Some(adjacent) = ctx.grid.neighbor(mover.current, behind) else {
                continue;
            };
            let tile = ctx.grid[adjacent];
            if !tile.is_numbered() || tile.value != mover.value || ctx.reserved.contains(&adjacent)
            {
                continue;
            }

            let merged = merged_value(mover.value);
            ctx.grid[adjacent] = Cell::EMPTY;
            ctx.grid[mover.current].value = merged;
            if let Some(target) = ctx.slow_movers.get_mut(index) {
                target.value = merged;
            }
            // No mover may keep following the absorbed tile.
            ctx.slow_movers.consume_at(adjacent, index);
            result.moves.push(MoveEvent::new(adjacent, mover.current, tile.value));
            result.merges.push(MergeEvent::new(mover.current, merged));
            changed = true;
        }
        ctx.slow_movers.prune();
        changed
    }
}

impl TileBehavior for SlowBehavior {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn matches(&self, passive: PassiveMask) -> bool {
        passive.contains(PassiveMask::SLOW) && !passive.contains(PassiveMask::CONTRARIAN)
    }

    fn freeze_during_move(&self) -> bool {
        true
    }

    fn freeze_tile_behind(&self) -> bool {
        true
    }

    fn pre_snapshot(&mut self, grid: &Grid, direction: Direction) {
        self.positions = owned_tiles(self, grid, direction);
    }

    fn advance(&self, ctx: &mut MoveContext<'_>, result: &mut TurnResult) -> bool {
        let direction = ctx.direction;
        let mut changed = false;

        for &origin in &self.positions {
            if ctx.reserved.contains(&origin) {
                continue;
            }
            let cell = ctx.grid[origin];
            if !cell.is_numbered() || !self.matches(cell.passive) {
                continue;
            }

            changed |= Self::absorb_behind(ctx, origin, result).is_some();

            if ctx.user_frozen.contains(&origin) {
                continue;
            }
            // Slow-on-slow merges only happen through absorb_behind.
            let landing = scan_ahead(ctx.grid, origin, direction, |_, ahead| {
                !ahead.passive.contains(PassiveMask::SLOW)
            });
            let (Some(landing), Some(next)) = (landing, ctx.grid.neighbor(origin, direction))
            else {
                continue;
            };

            let tile = ctx.grid[origin].take();
            if landing.merge && landing.pos == next {
                let merged = Cell::numbered(merged_value(tile.value)).with_passive(tile.passive);
                ctx.grid[next] = merged;
                result.behavior_moves.push(MoveEvent::new(origin, next, tile.value));
                result.behavior_merges.push(MergeEvent::new(next, merged.value));
            } else {
                ctx.grid[next] = tile;
                result.behavior_moves.push(MoveEvent::new(origin, next, tile.value));
                if origin.distance(landing.pos) > 1 {
                    ctx.slow_movers
                        .push(SlowMover::new(next, landing.pos, direction, tile));
                }
            }
            ctx.cascade_fill(origin, &mut result.behavior_moves);
            changed = true;
        }

        changed |= Self::merge_into_frozen_movers(ctx, result);
        changed
    }

    fn requires_mover_cleanup(&self, _passive: PassiveMask) -> bool {
        true
    }
}
