//! # Quadmerge Core
//!
//! Turn resolution for a 2048-family merge puzzle with stateful tile effects.
//!
//! This crate takes a board from [`tilegrid`] and a player direction and
//! produces the next board plus a [`TurnResult`] describing every slide,
//! merge, detonation and spawn a host needs to animate the turn.
//!
//! ## Architecture
//!
//! - **Movement**: segment-aware sliding; frozen cells act as walls
//! - **Behaviors**: pluggable rules for tiles with passives (slow, contrarian)
//! - **Movers**: multi-turn slow movers and wandering hazards
//! - **Detonation**: bombs destroying hazards and special tiles
//! - **Roller**: seeded passive-grant proposals from merges
//! - **Engine**: the fixed-order turn orchestrator tying the above together
//!
//! ## Usage
//!
//! ```
//! use quadmerge_core::{Engine, EngineConfig};
//! use tilegrid::{Direction, PassiveMask, Pos};
//!
//! let config = EngineConfig::with_size(1, 4).with_spawns(0, 0);
//! let mut engine = Engine::with_config(config).unwrap();
//! engine.set_tile(Pos::new(0, 0), 2, PassiveMask::empty()).unwrap();
//! engine.set_tile(Pos::new(0, 1), 2, PassiveMask::empty()).unwrap();
//!
//! let result = engine.process_move(Direction::Left);
//! assert_eq!(result.score_delta, 4);
//! assert_eq!(engine.grid_values(), vec![4, 0, 0, 0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export the board substrate
pub use tilegrid;

pub mod behavior;
pub mod cascade;
pub mod config;
pub mod detonation;
pub mod engine;
pub mod error;
pub mod events;
pub mod movement;
pub mod movers;
pub mod roller;

#[cfg(test)]
mod tests;

pub use behavior::{BehaviorRegistry, ContrarianBehavior, MoveContext, SlowBehavior, TileBehavior};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{ConfigError, EngineError};
pub use events::{
    MergeEvent, MoveEvent, PassiveGrant, RandomMoverUpdate, SlowMoverUpdate, TurnResult,
};
pub use movers::{RandomMover, SlowMover};
pub use roller::PassiveRoller;
