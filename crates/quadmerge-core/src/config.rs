//! Engine configuration.
//!
//! [`EngineConfig`] gathers every tunable constant of a game: board size,
//! seed, scoring and progression thresholds, spawning, hazard timing and the
//! passive grant rate. Defaults reproduce the standard game.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial row count.
    pub rows: usize,
    /// Initial column count.
    pub cols: usize,
    /// Seed for every random source in the engine.
    pub seed: u64,
    /// Score at engine creation.
    pub starting_score: i64,
    /// Merged value that first triggers a board expansion.
    pub initial_expansion_threshold: i32,
    /// Value of spawned tiles.
    pub spawn_value: i32,
    /// Tiles spawned at engine creation.
    pub starting_tiles: usize,
    /// Tiles spawned after each valid turn.
    pub spawns_per_turn: usize,
    /// Hazards are enabled once the expansion threshold exceeds this value.
    pub hazard_unlock_threshold: i32,
    /// Valid turns between a hazard's destruction and its replacement.
    pub hazard_respawn_delay: u32,
    /// Grant chance per merged value, in percent.
    pub grant_rate_percent_per_value: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 4,
            seed: 0,
            starting_score: 4500,
            initial_expansion_threshold: 2048,
            spawn_value: 2,
            starting_tiles: 2,
            spawns_per_turn: 1,
            hazard_unlock_threshold: 4096,
            hazard_respawn_delay: 3,
            grant_rate_percent_per_value: 0.1,
        }
    }
}

impl EngineConfig {
    /// Default configuration with the given board size.
    #[must_use]
    pub fn with_size(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Default::default()
        }
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets how many tiles are spawned at creation and after each turn.
    ///
    /// Scripted scenarios use `(0, 0)` to keep the board exactly as placed.
    #[must_use]
    pub fn with_spawns(mut self, starting_tiles: usize, spawns_per_turn: usize) -> Self {
        self.starting_tiles = starting_tiles;
        self.spawns_per_turn = spawns_per_turn;
        self
    }

    /// Sets the first expansion threshold.
    #[must_use]
    pub fn with_expansion_threshold(mut self, threshold: i32) -> Self {
        self.initial_expansion_threshold = threshold;
        self
    }

    /// Sets the passive grant rate.
    #[must_use]
    pub fn with_grant_rate(mut self, percent_per_value: f64) -> Self {
        self.grant_rate_percent_per_value = percent_per_value;
        self
    }

    /// Checks every field for a usable value.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.spawn_value <= 0 {
            return Err(ConfigError::NonPositiveSpawnValue(self.spawn_value));
        }
        if self.initial_expansion_threshold <= 0 {
            return Err(ConfigError::NonPositiveThreshold(
                self.initial_expansion_threshold,
            ));
        }
        let rate = self.grant_rate_percent_per_value;
        if !rate.is_finite() || rate < 0.0 {
            return Err(ConfigError::InvalidGrantRate(rate));
        }
        Ok(())
    }
}
