//! The turn orchestrator.
//!
//! [`Engine`] owns one game: the grid, the behavior registry, the live mover
//! lists, the single-turn freezes, and the progression counters. The host
//! drives it through [`Engine::process_move`] and a small editing surface.
//!
//! # Turn Phases
//!
//! 1. **SNAPSHOT**: every behavior records its tiles on the untouched board
//! 2. **FREEZE**: build the movement freeze set (user freezes, mover cells,
//!    behavior-claimed cells, hazards and walls)
//! 3. **DETONATE**: bombs already next to a target go off
//! 4. **SLIDE**: ordinary movement, segment by segment
//! 5. **DETONATE**: again, now also against user-frozen tiles
//! 6. **MOVERS**: slow movers advance one cell
//! 7. **BEHAVIORS**: each behavior advances its tiles, each followed by a
//!    detonation pass
//! 8. **GATE**: if nothing above changed the board and no slow mover moved,
//!    the turn is rejected with no side effects
//! 9. **HAZARDS**: hazards wander; ordinary tiles cascade into cells they left
//! 10. **SETTLE**: clear freezes, score, spawn, roll passives, check for
//!     expansion, tick the hazard respawn timer
//!
//! # Determinism
//!
//! One seed drives every random choice. Spawning uses the grid's generator;
//! hazard steering and the passive roller use their own `ChaCha8Rng` streams
//! derived from the same seed, so no phase perturbs another's sequence.
//!
//! # Example
//!
//! ```
//! use quadmerge_core::config::EngineConfig;
//! use quadmerge_core::engine::Engine;
//! use tilegrid::{Direction, PassiveMask, Pos};
//!
//! // No random spawns, so the board stays exactly as placed.
//! let config = EngineConfig::with_size(1, 4).with_spawns(0, 0);
//! let mut engine = Engine::with_config(config).unwrap();
//! engine.set_tile(Pos::new(0, 3), 8, PassiveMask::SLOW).unwrap();
//!
//! let result = engine.process_move(Direction::Left);
//! assert!(result.board_changed);
//! assert_eq!(engine.grid_values(), vec![0, 0, 8, 0]);
//! assert_eq!(engine.slow_movers()[0].destination, Pos::new(0, 0));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tilegrid::{hash_grid_into, Cell, CellKind, Direction, Grid, PassiveMask, Pos};
use tracing::{debug, info};

use crate::behavior::{BehaviorRegistry, MoveContext};
use crate::cascade::{cascade_fill, CascadeRules};
use crate::config::EngineConfig;
use crate::detonation::{detonate, DetonationScope};
use crate::error::EngineError;
use crate::events::TurnResult;
use crate::movement;
use crate::movers::{RandomMover, RandomMovers, RespawnTimer, SlowMover, SlowMovers};
use crate::roller::PassiveRoller;

/// ChaCha stream steering hazards.
const HAZARD_STREAM: u64 = 1;
/// ChaCha stream feeding the passive roller.
const ROLLER_STREAM: u64 = 2;

fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

// =============================================================================
// Engine
// =============================================================================

/// One game in progress.
///
/// `process_move` takes `&mut self`, so turns on one engine are serialized by
/// construction. The engine is `Send` and can move to another thread between
/// turns.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    grid: Grid,
    behaviors: BehaviorRegistry,
    slow_movers: SlowMovers,
    hazards: RandomMovers,
    respawn: RespawnTimer,
    roller: PassiveRoller,
    /// Single-turn freezes placed by the host; cleared after every valid turn.
    user_frozen: BTreeSet<Pos>,
    score: i64,
    expansion_threshold: i32,
    expansions: u32,
    /// Valid turns played.
    turn: u64,
}

impl Engine {
    /// Creates a `rows x cols` game with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if either dimension is zero.
    pub fn new(rows: usize, cols: usize, seed: u64) -> Result<Self, EngineError> {
        Self::with_config(EngineConfig::with_size(rows, cols).with_seed(seed))
    }

    /// Creates a game from `config` and spawns its starting tiles.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let mut engine = Self {
            grid: Grid::with_seed(config.rows, config.cols, config.seed),
            behaviors: BehaviorRegistry::with_defaults(),
            slow_movers: SlowMovers::new(),
            hazards: RandomMovers::new(stream_rng(config.seed, HAZARD_STREAM)),
            respawn: RespawnTimer::default(),
            roller: PassiveRoller::new(
                stream_rng(config.seed, ROLLER_STREAM),
                config.grant_rate_percent_per_value,
            ),
            user_frozen: BTreeSet::new(),
            score: config.starting_score,
            expansion_threshold: config.initial_expansion_threshold,
            expansions: 0,
            turn: 0,
            config,
        };

        for _ in 0..engine.config.starting_tiles {
            engine
                .grid
                .spawn_number(engine.config.spawn_value, &BTreeSet::new());
        }
        debug!(
            rows = engine.grid.rows(),
            cols = engine.grid.cols(),
            seed = engine.config.seed,
            "engine created"
        );
        Ok(engine)
    }

    // =========================================================================
    // Turn
    // =========================================================================

    /// Resolves one player move.
    ///
    /// A rejected move returns a default [`TurnResult`] (`board_changed` is
    /// false) and leaves the game untouched.
    pub fn process_move(&mut self, direction: Direction) -> TurnResult {
        debug!(
            turn = self.turn,
            %direction,
            score = self.score,
            movers = self.slow_movers.len(),
            "turn start"
        );
        let mut result = TurnResult::default();

        self.behaviors.pre_snapshot_all(&self.grid, direction);
        let mut frozen = self.effective_frozen(direction);
        let hazards_before = self.grid.count(CellKind::Hazard);

        let mut changed = self.detonate(&mut frozen, false, &mut result);

        let outcome = movement::slide(&mut self.grid, direction, &frozen);
        changed |= outcome.changed;
        result.moves = outcome.moves;
        result.merges = outcome.merges;
        result.bomb_destroyed.extend(outcome.destroyed);

        changed |= self.detonate(&mut frozen, true, &mut result);

        result.slow_mover_updates = self.slow_movers.advance(&mut self.grid, &self.user_frozen);

        // Movers created during this phase start travelling next turn.
        let reserved = self.slow_movers.active_positions();
        for behavior in self.behaviors.iter() {
            let mut ctx = MoveContext {
                grid: &mut self.grid,
                slow_movers: &mut self.slow_movers,
                user_frozen: &self.user_frozen,
                reserved: &reserved,
                direction,
                registry: &self.behaviors,
            };
            changed |= behavior.advance(&mut ctx, &mut result);

            let mut scope = DetonationScope {
                grid: &mut self.grid,
                slow_movers: &mut self.slow_movers,
                user_frozen: &mut self.user_frozen,
                frozen: &mut frozen,
                registry: &self.behaviors,
            };
            changed |= detonate(&mut scope, true, &mut result);
        }

        if !changed && result.slow_mover_updates.is_empty() {
            debug!(turn = self.turn, %direction, "move rejected: board unchanged");
            return TurnResult::default();
        }

        self.advance_hazards(direction, hazards_before, &reserved, &mut result);
        self.settle(&mut result);

        self.turn += 1;
        debug!(
            turn = self.turn,
            score_delta = result.score_delta,
            spawned = ?result.spawned_tile,
            expansion = result.expansion_required,
            "turn end"
        );
        result
    }

    /// Cells ordinary movement must leave alone this turn.
    fn effective_frozen(&self, direction: Direction) -> BTreeSet<Pos> {
        let mut frozen = self.user_frozen.clone();
        frozen.extend(self.slow_movers.active_positions());
        frozen.extend(self.behaviors.claimed_cells(&self.grid, direction));
        frozen.extend(
            self.grid
                .positions_where(|cell| cell.is_hazard() || cell.is_wall()),
        );
        frozen
    }

    fn detonate(
        &mut self,
        frozen: &mut BTreeSet<Pos>,
        include_user_frozen: bool,
        result: &mut TurnResult,
    ) -> bool {
        let mut scope = DetonationScope {
            grid: &mut self.grid,
            slow_movers: &mut self.slow_movers,
            user_frozen: &mut self.user_frozen,
            frozen,
            registry: &self.behaviors,
        };
        detonate(&mut scope, include_user_frozen, result)
    }

    /// Moves hazards, arms the respawn timer if one died this turn, and
    /// cascades ordinary tiles into the cells hazards left.
    fn advance_hazards(
        &mut self,
        direction: Direction,
        hazards_before: usize,
        reserved: &BTreeSet<Pos>,
        result: &mut TurnResult,
    ) {
        let updates = self.hazards.advance(
            &mut self.grid,
            &self.user_frozen,
            &mut result.bomb_destroyed,
        );
        let vacated: BTreeSet<Pos> = updates
            .iter()
            .filter(|update| update.from != update.to)
            .map(|update| update.from)
            .collect();
        result.random_mover_updates = updates;

        if self.hazards_enabled() && self.grid.count(CellKind::Hazard) < hazards_before {
            self.respawn.arm(self.config.hazard_respawn_delay);
        }

        let rules = CascadeRules {
            direction,
            registry: &self.behaviors,
            reserved,
            user_frozen: &self.user_frozen,
        };
        for pos in vacated {
            if self.grid[pos].is_empty() {
                cascade_fill(&mut self.grid, pos, &rules, &mut result.behavior_moves);
            }
        }
    }

    /// Post-gate bookkeeping of a valid turn.
    fn settle(&mut self, result: &mut TurnResult) {
        self.user_frozen.clear();
        result.board_changed = true;

        let merges = result.all_merges();
        result.score_delta = result.merge_total();
        self.score += result.score_delta;

        let movers = self.slow_movers.active_positions();
        let mut spawn_excluded = result.bomb_destroyed.clone();
        spawn_excluded.extend(movers.iter().copied());
        let mut spawned = Vec::new();
        for _ in 0..self.config.spawns_per_turn {
            if let Some(pos) = self
                .grid
                .spawn_number(self.config.spawn_value, &spawn_excluded)
            {
                spawned.push(pos);
            }
        }
        result.spawned_tile = spawned.last().copied();

        let mut grant_excluded: BTreeSet<Pos> = merges.iter().map(|merge| merge.pos).collect();
        grant_excluded.extend(movers);
        grant_excluded.extend(spawned);
        result.passive_grants = self.roller.roll(&self.grid, &merges, &grant_excluded);

        if merges
            .iter()
            .any(|merge| merge.value >= self.expansion_threshold)
        {
            result.expansion_required = true;
            self.expansion_threshold = self.expansion_threshold.saturating_mul(2);
            info!(next_threshold = self.expansion_threshold, "expansion required");
        }

        if self.respawn.tick() && self.hazards_enabled() && !self.grid.has_kind(CellKind::Hazard)
        {
            match self.grid.spawn_hazard() {
                Some(pos) => {
                    result.spawned_hazard = Some(pos);
                    info!(%pos, "hazard respawned");
                }
                None => self.respawn.arm(1),
            }
        }
    }

    // =========================================================================
    // Editing
    // =========================================================================

    fn check_bounds(&self, pos: Pos) -> Result<(), EngineError> {
        if self.grid.contains(pos) {
            Ok(())
        } else {
            Err(EngineError::OutOfBounds {
                pos,
                rows: self.grid.rows(),
                cols: self.grid.cols(),
            })
        }
    }

    /// Overwrites a cell. Any slow mover anchored there is dropped; the mask
    /// is discarded unless `value` is a numbered tile.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] for a position off the board.
    pub fn set_tile(&mut self, pos: Pos, value: i32, passive: PassiveMask) -> Result<(), EngineError> {
        self.check_bounds(pos)?;
        self.slow_movers.remove_at(pos);
        self.grid[pos] = Cell::numbered(value).with_passive(passive);
        Ok(())
    }

    /// Adds `mask` to the passives of the tile at `pos`. A slow mover on
    /// that tile carries the new passives from then on.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] for a position off the board.
    pub fn assign_passive(&mut self, pos: Pos, mask: PassiveMask) -> Result<(), EngineError> {
        self.check_bounds(pos)?;
        let cell = self.grid[pos];
        let updated = cell.with_passive(cell.passive | mask);
        self.grid[pos] = updated;
        self.slow_movers.set_passive_at(pos, updated.passive);
        Ok(())
    }

    /// Places a bomb if the cell is empty. Returns whether it was placed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] for a position off the board.
    pub fn place_bomb(&mut self, pos: Pos) -> Result<bool, EngineError> {
        self.check_bounds(pos)?;
        if !self.grid[pos].is_empty() {
            return Ok(false);
        }
        self.grid[pos] = Cell::bomb();
        Ok(true)
    }

    /// Freezes a numbered tile or hazard for the next valid turn. Returns
    /// whether a freeze was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] for a position off the board.
    pub fn place_freeze(&mut self, pos: Pos) -> Result<bool, EngineError> {
        self.check_bounds(pos)?;
        let cell = self.grid[pos];
        if !cell.is_numbered() && !cell.is_hazard() {
            return Ok(false);
        }
        self.user_frozen.insert(pos);
        Ok(true)
    }

    /// Removes a freeze, if present.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] for a position off the board.
    pub fn clear_freeze(&mut self, pos: Pos) -> Result<(), EngineError> {
        self.check_bounds(pos)?;
        self.user_frozen.remove(&pos);
        Ok(())
    }

    /// Grows the board by one row or column on the `direction` side.
    ///
    /// Call once the host has finished animating the expansion a turn asked
    /// for. Mover coordinates and freezes follow the board when it grows up
    /// or left. The first expansion places a wall at the middle of the new
    /// edge.
    pub fn complete_expansion(&mut self, direction: Direction) {
        self.grid.expand(direction);

        let (dr, dc) = match direction {
            Direction::Up => (1, 0),
            Direction::Left => (0, 1),
            Direction::Down | Direction::Right => (0, 0),
        };
        if (dr, dc) != (0, 0) {
            self.slow_movers.shift(dr, dc);
            self.user_frozen = self
                .user_frozen
                .iter()
                .filter_map(|pos| pos.offset(dr, dc))
                .collect();
        }

        self.expansions += 1;
        if self.expansions == 1 {
            let wall = self.edge_midpoint(direction);
            self.grid[wall] = Cell::wall();
            debug!(%wall, "wall placed");
        }

        if self.hazards_enabled() && !self.grid.has_kind(CellKind::Hazard) {
            if let Some(pos) = self.grid.spawn_hazard() {
                info!(%pos, "hazard spawned on expansion");
            }
        }
        info!(
            %direction,
            rows = self.grid.rows(),
            cols = self.grid.cols(),
            expansions = self.expansions,
            "board expanded"
        );
    }

    /// Middle cell of the outer edge on the `direction` side.
    fn edge_midpoint(&self, direction: Direction) -> Pos {
        let (rows, cols) = (self.grid.rows(), self.grid.cols());
        match direction {
            Direction::Up => Pos::new(0, cols / 2),
            Direction::Down => Pos::new(rows - 1, cols / 2),
            Direction::Left => Pos::new(rows / 2, 0),
            Direction::Right => Pos::new(rows / 2, cols - 1),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Row-major flattened cell values.
    #[must_use]
    pub fn grid_values(&self) -> Vec<i32> {
        self.grid.values()
    }

    /// Every tile carrying a passive, row-major.
    #[must_use]
    pub fn passive_map(&self) -> Vec<(Pos, PassiveMask)> {
        self.grid.passive_map()
    }

    /// Live slow movers, in creation order.
    #[must_use]
    pub fn slow_movers(&self) -> &[SlowMover] {
        self.slow_movers.as_slice()
    }

    /// Hazards currently on the board, row-major.
    #[must_use]
    pub fn random_movers(&self) -> Vec<RandomMover> {
        self.grid
            .find(CellKind::Hazard)
            .into_iter()
            .map(|pos| RandomMover { pos })
            .collect()
    }

    /// Current row count.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    /// Current column count.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    /// Running score.
    #[must_use]
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Merged value that triggers the next expansion.
    #[must_use]
    pub fn expansion_threshold(&self) -> i32 {
        self.expansion_threshold
    }

    /// Expansions completed so far.
    #[must_use]
    pub fn expansions(&self) -> u32 {
        self.expansions
    }

    /// Hazards spawn and respawn once the threshold has passed the unlock
    /// value.
    #[must_use]
    pub fn hazards_enabled(&self) -> bool {
        self.expansion_threshold > self.config.hazard_unlock_threshold
    }

    /// Turns until a destroyed hazard is replaced, 0 when none is pending.
    #[must_use]
    pub fn hazard_respawn_in(&self) -> u32 {
        self.respawn.remaining()
    }

    /// Valid turns played.
    #[must_use]
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Cells frozen for the next valid turn.
    #[must_use]
    pub fn user_frozen(&self) -> &BTreeSet<Pos> {
        &self.user_frozen
    }

    /// The board.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The configuration the engine was built from.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registered behaviors.
    #[must_use]
    pub fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    /// Mutable access to the behavior registry, for registering extra
    /// behaviors before play.
    #[must_use]
    pub fn behaviors_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.behaviors
    }

    /// Deterministic fingerprint of the whole game state except the random
    /// generators.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        hash_grid_into(&self.grid, &mut hasher);
        self.score.hash(&mut hasher);
        self.expansion_threshold.hash(&mut hasher);
        self.expansions.hash(&mut hasher);
        self.slow_movers.as_slice().hash(&mut hasher);
        self.user_frozen.hash(&mut hasher);
        self.respawn.remaining().hash(&mut hasher);
        self.turn.hash(&mut hasher);
        hasher.finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
