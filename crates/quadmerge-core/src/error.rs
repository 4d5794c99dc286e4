//! Error types for engine construction and direct board editing.
//!
//! Turn resolution itself has no failure mode: [`Engine::process_move`]
//! reports a rejected move through [`TurnResult::board_changed`] instead.
//!
//! [`Engine::process_move`]: crate::engine::Engine::process_move
//! [`TurnResult::board_changed`]: crate::events::TurnResult::board_changed

use thiserror::Error;
use tilegrid::Pos;

/// Invalid [`EngineConfig`](crate::config::EngineConfig) values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The board needs at least one row and one column.
    #[error("grid must be at least 1x1, got {rows}x{cols}")]
    EmptyGrid {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },

    /// Spawned tiles must be numbered.
    #[error("spawn value must be positive, got {0}")]
    NonPositiveSpawnValue(i32),

    /// The first expansion threshold must be a reachable tile value.
    #[error("expansion threshold must be positive, got {0}")]
    NonPositiveThreshold(i32),

    /// Grant rate must be a finite, non-negative percentage.
    #[error("grant rate must be finite and non-negative, got {0}")]
    InvalidGrantRate(f64),
}

/// Errors from the direct board-editing surface of the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A coordinate outside the current board.
    #[error("position {pos} is outside the {rows}x{cols} board")]
    OutOfBounds {
        /// Offending position.
        pos: Pos,
        /// Board rows at the time of the call.
        rows: usize,
        /// Board columns at the time of the call.
        cols: usize,
    },

    /// The engine was built from an invalid configuration.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
