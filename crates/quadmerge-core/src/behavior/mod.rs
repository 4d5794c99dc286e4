//! Tile behaviors: pluggable movement rules for tiles carrying passives.
//!
//! Ordinary tiles are handled entirely by the [movement engine](crate::movement).
//! A tile whose [`PassiveMask`] is claimed by a [`TileBehavior`] is frozen
//! during ordinary movement and moved afterwards by its behavior instead.
//!
//! # Architecture
//!
//! Each turn the engine drives every registered behavior through two hooks:
//!
//! 1. [`TileBehavior::pre_snapshot`] before anything on the board changes.
//!    The behavior records which tiles it owns and any facts that must be
//!    judged against the pre-move board.
//! 2. [`TileBehavior::advance`] after ordinary movement and slow-mover
//!    advance. The behavior moves its tiles through a [`MoveContext`] and
//!    reports them in the `behavior_moves` / `behavior_merges` channels.
//!
//! # Registry
//!
//! [`BehaviorRegistry`] keeps behaviors in registration order. The first
//! behavior whose [`TileBehavior::matches`] accepts a mask owns that tile for
//! freezing, cascade blocking and detonation. Registration order is also the
//! advance order.
//!
//! # Example
//!
//! ```
//! use quadmerge_core::behavior::BehaviorRegistry;
//! use tilegrid::PassiveMask;
//!
//! let registry = BehaviorRegistry::with_defaults();
//! assert_eq!(registry.names(), vec!["slow", "contrarian"]);
//!
//! let owner = registry.claiming(PassiveMask::SLOW | PassiveMask::CONTRARIAN);
//! assert_eq!(owner.map(|b| b.name()), Some("contrarian"));
//! ```

mod contrarian;
mod slow;

use std::collections::BTreeSet;
use std::fmt;

use tilegrid::{Cell, Direction, Grid, PassiveMask, Pos};

use crate::cascade::{cascade_fill, CascadeRules};
use crate::events::{MoveEvent, TurnResult};
use crate::movement::{ray, wall_distance};
use crate::movers::SlowMovers;

pub use contrarian::ContrarianBehavior;
pub use slow::SlowBehavior;

// =============================================================================
// Move Context
// =============================================================================

/// Mutable engine state lent to a behavior for its advance phase.
pub struct MoveContext<'a> {
    /// The board.
    pub grid: &'a mut Grid,
    /// Live slow movers; behaviors register new ones here.
    pub slow_movers: &'a mut SlowMovers,
    /// Single-turn user freezes.
    pub user_frozen: &'a BTreeSet<Pos>,
    /// Cells held by slow movers that were active when this phase began.
    /// Behaviors skip tiles on these cells.
    pub reserved: &'a BTreeSet<Pos>,
    /// Player move direction.
    pub direction: Direction,
    /// All registered behaviors, for cascade blocking.
    pub registry: &'a BehaviorRegistry,
}

impl MoveContext<'_> {
    /// Pulls ordinary tiles into `vacated`; see [`cascade_fill`].
    pub fn cascade_fill(&mut self, vacated: Pos, moves: &mut Vec<MoveEvent>) {
        let rules = CascadeRules {
            direction: self.direction,
            registry: self.registry,
            reserved: self.reserved,
            user_frozen: self.user_frozen,
        };
        cascade_fill(self.grid, vacated, &rules, moves);
    }
}

// =============================================================================
// Tile Behavior
// =============================================================================

/// Movement rules for tiles with particular passives.
///
/// Behaviors are `Send + Sync` so an engine can move between threads.
pub trait TileBehavior: Send + Sync {
    /// Short identifier, unique within a registry.
    fn name(&self) -> &'static str;

    /// True if this behavior owns a tile with `passive`.
    fn matches(&self, passive: PassiveMask) -> bool;

    /// Owned tiles are frozen during ordinary movement.
    fn freeze_during_move(&self) -> bool;

    /// Also freeze the equal-value tile directly behind an owned tile, so an
    /// ordinary tile cannot merge through where the owned tile would have
    /// been.
    fn freeze_tile_behind(&self) -> bool {
        false
    }

    /// Records pre-move state. Called before any board mutation of a turn.
    fn pre_snapshot(&mut self, grid: &Grid, direction: Direction);

    /// Moves owned tiles after ordinary movement. Returns true if the board
    /// changed.
    fn advance(&self, ctx: &mut MoveContext<'_>, result: &mut TurnResult) -> bool;

    /// Owned tiles stop a cascade fill.
    fn blocks_cascade(&self) -> bool {
        true
    }

    /// Destroying an owned tile with `passive` must also drop the slow mover
    /// anchored on it.
    fn requires_mover_cleanup(&self, _passive: PassiveMask) -> bool {
        false
    }
}

// =============================================================================
// Behavior Registry
// =============================================================================

/// Ordered collection of tile behaviors.
#[derive(Default)]
pub struct BehaviorRegistry {
    behaviors: Vec<Box<dyn TileBehavior>>,
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorRegistry")
            .field("behaviors", &self.names())
            .finish()
    }
}

impl BehaviorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard behaviors in advance order: slow, then contrarian.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SlowBehavior::new()));
        registry.register(Box::new(ContrarianBehavior::new()));
        registry
    }

    /// Appends a behavior. Later behaviors only own masks no earlier one
    /// matches.
    pub fn register(&mut self, behavior: Box<dyn TileBehavior>) {
        self.behaviors.push(behavior);
    }

    /// Number of registered behaviors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// True when no behavior is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|b| b.name()).collect()
    }

    /// Behaviors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn TileBehavior> + '_ {
        self.behaviors.iter().map(|b| &**b)
    }

    /// The behavior that owns tiles with `passive`, if any.
    #[must_use]
    pub fn claiming(&self, passive: PassiveMask) -> Option<&dyn TileBehavior> {
        self.iter().find(|b| b.matches(passive))
    }

    /// True if a tile with `passive` stops a cascade fill.
    #[must_use]
    pub fn blocks_cascade(&self, passive: PassiveMask) -> bool {
        self.claiming(passive).is_some_and(|b| b.blocks_cascade())
    }

    /// Runs every behavior's pre-move snapshot.
    pub fn pre_snapshot_all(&mut self, grid: &Grid, direction: Direction) {
        for behavior in &mut self.behaviors {
            behavior.pre_snapshot(grid, direction);
        }
    }

    /// Cells that ordinary movement must leave alone this turn because a
    /// behavior owns them (plus equal tiles behind owners that ask for it).
    #[must_use]
    pub fn claimed_cells(&self, grid: &Grid, direction: Direction) -> BTreeSet<Pos> {
        let mut claimed = BTreeSet::new();
        for (pos, cell) in grid.iter().filter(|(_, cell)| cell.is_numbered()) {
            let Some(owner) = self.claiming(cell.passive) else {
                continue;
            };
            if !owner.freeze_during_move() {
                continue;
            }
            claimed.insert(pos);
            if owner.freeze_tile_behind() {
                if let Some(behind) = grid.neighbor(pos, direction.opposite()) {
                    let tile = grid[behind];
                    if tile.is_numbered() && tile.value == cell.value {
                        claimed.insert(behind);
                    }
                }
            }
        }
        claimed
    }
}

/// Where a sliding tile stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Landing {
    pos: Pos,
    merge: bool,
}

/// Scans from `origin` toward `toward` like a one-tile segment compaction:
/// the farthest empty cell, or the first equal tile `can_merge` accepts.
/// `None` when the tile cannot move at all.
fn scan_ahead<F>(grid: &Grid, origin: Pos, toward: Direction, mut can_merge: F) -> Option<Landing>
where
    F: FnMut(Pos, &Cell) -> bool,
{
    let value = grid[origin].value;
    let mut landing = None;
    for pos in ray(grid, origin, toward) {
        let cell = grid[pos];
        if cell.is_empty() {
            landing = Some(Landing { pos, merge: false });
        } else if cell.is_numbered() && cell.value == value && can_merge(pos, &cell) {
            landing = Some(Landing { pos, merge: true });
            break;
        } else {
            break;
        }
    }
    landing
}

/// Positions of numbered tiles `behavior` owns, ordered nearest to the wall
/// on the `toward` side first.
fn owned_tiles(behavior: &dyn TileBehavior, grid: &Grid, toward: Direction) -> Vec<Pos> {
    let mut owned =
        grid.positions_where(|cell| cell.is_numbered() && behavior.matches(cell.passive));
    owned.sort_by_key(|pos| (wall_distance(grid, *pos, toward), *pos));
    owned
}

/// Snapshots then advances `behavior` with no ordinary movement in between.
#[cfg(test)]
fn run_behavior(
    behavior: &mut dyn TileBehavior,
    grid: &mut Grid,
    movers: &mut SlowMovers,
    user_frozen: &BTreeSet<Pos>,
    direction: Direction,
) -> (bool, TurnResult) {
    behavior.pre_snapshot(grid, direction);
    let registry = BehaviorRegistry::with_defaults();
    let reserved = movers.active_positions();
    let mut ctx = MoveContext {
        grid,
        slow_movers: movers,
        user_frozen,
        reserved: &reserved,
        direction,
        registry: &registry,
    };
    let mut result = TurnResult::default();
    let changed = behavior.advance(&mut ctx, &mut result);
    (changed, result)
}
