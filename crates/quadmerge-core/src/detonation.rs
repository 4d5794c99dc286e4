//! Bomb detonation.
//!
//! A bomb that ends up orthogonally next to a destructible target removes
//! itself and that target. The pass runs several times per turn, so every
//! call collects candidates first and only then applies them, re-checking
//! each one so two bombs never consume the same target.
//!
//! # Targets
//!
//! Neighbours are examined in [`Direction::ALL`] order and the first match
//! wins:
//!
//! - a hazard
//! - a numbered tile owned by a registered behavior
//! - a user-frozen numbered tile, only once ordinary movement has run

use std::collections::BTreeSet;

use tilegrid::{Cell, CellKind, Direction, Grid, PassiveMask, Pos};
use tracing::trace;

use crate::behavior::BehaviorRegistry;
use crate::events::TurnResult;
use crate::movers::SlowMovers;

/// Engine state a detonation pass may touch.
pub struct DetonationScope<'a> {
    /// The board.
    pub grid: &'a mut Grid,
    /// Live slow movers; destroyed owned tiles drop theirs.
    pub slow_movers: &'a mut SlowMovers,
    /// Single-turn user freezes; destroyed targets lose theirs.
    pub user_frozen: &'a mut BTreeSet<Pos>,
    /// This turn's movement freeze set; destroyed targets leave it.
    pub frozen: &'a mut BTreeSet<Pos>,
    /// Behaviors, to recognise owned tiles.
    pub registry: &'a BehaviorRegistry,
}

/// What a pending detonation expects to find at its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Hazard,
    Owned { passive: PassiveMask, cleanup: bool },
    UserFrozen,
}

#[derive(Debug, Clone, Copy)]
struct Detonation {
    bomb: Pos,
    target: Pos,
    kind: Target,
}

impl DetonationScope<'_> {
    fn classify(&self, pos: Pos, include_user_frozen: bool) -> Option<Target> {
        let cell = self.grid[pos];
        if cell.is_hazard() {
            return Some(Target::Hazard);
        }
        if !cell.is_numbered() {
            return None;
        }
        if let Some(owner) = self.registry.claiming(cell.passive) {
            return Some(Target::Owned {
                passive: cell.passive,
                cleanup: owner.requires_mover_cleanup(cell.passive),
            });
        }
        (include_user_frozen && self.user_frozen.contains(&pos)).then_some(Target::UserFrozen)
    }

    fn still_valid(&self, detonation: &Detonation) -> bool {
        if !self.grid[detonation.bomb].is_bomb() {
            return false;
        }
        let target = self.grid[detonation.target];
        match detonation.kind {
            Target::Hazard => target.is_hazard(),
            Target::Owned { passive, .. } => target.is_numbered() && target.passive == passive,
            Target::UserFrozen => {
                target.is_numbered() && self.user_frozen.contains(&detonation.target)
            }
        }
    }

    fn pending(&self, include_user_frozen: bool) -> Vec<Detonation> {
        self.grid
            .find(CellKind::Bomb)
            .into_iter()
            .filter_map(|bomb| {
                Direction::ALL
                    .into_iter()
                    .filter_map(|dir| self.grid.neighbor(bomb, dir))
                    .find_map(|target| {
                        self.classify(target, include_user_frozen)
                            .map(|kind| Detonation { bomb, target, kind })
                    })
            })
            .collect()
    }
}

/// Detonates every bomb next to a valid target. Returns true if any
/// detonation was applied.
///
/// Both cells of each detonation are recorded in `result.bomb_destroyed`;
/// destroyed hazards are also recorded in `result.hazard_kills`.
pub fn detonate(
    scope: &mut DetonationScope<'_>,
    include_user_frozen: bool,
    result: &mut TurnResult,
) -> bool {
    let mut applied = false;

    for detonation in scope.pending(include_user_frozen) {
        if !scope.still_valid(&detonation) {
            continue;
        }
        let Detonation { bomb, target, kind } = detonation;

        scope.grid[bomb] = Cell::EMPTY;
        scope.grid[target] = Cell::EMPTY;
        result.bomb_destroyed.insert(bomb);
        result.bomb_destroyed.insert(target);
        scope.frozen.remove(&target);
        scope.user_frozen.remove(&target);

        match kind {
            Target::Owned { cleanup: true, .. } => {
                scope.slow_movers.remove_at(target);
            }
            Target::Hazard => result.hazard_kills.push(target),
            Target::Owned { .. } | Target::UserFrozen => {}
        }
        trace!(%bomb, %target, ?kind, "bomb detonated");
        applied = true;
    }
    applied
}
