//! # Tilegrid
//!
//! Resizable tile grid substrate for merge puzzles.
//!
//! Tilegrid stores the authoritative board of a 2048-family game: a row-major
//! array of [`Cell`]s, each holding a numeric value and a [`PassiveMask`] of
//! tile effects. The grid owns the seeded random source used for spawning, so
//! a fixed seed reproduces every spawn decision.
//!
//! - **Values**: `0` is empty, positive values are numbered tiles, negative
//!   sentinels mark bombs, hazards, and walls
//! - **Growth**: the board can gain an outer row or column, never lose one
//! - **Determinism**: `ChaCha8Rng` spawning plus [`Grid::state_hash`]
//!
//! ## Quick Start
//!
//! ```
//! use tilegrid::{Cell, Direction, Grid, Pos};
//!
//! let mut grid = Grid::with_seed(4, 4, 7);
//! grid[Pos::new(0, 1)] = Cell::numbered(2);
//!
//! let spawned = grid.spawn_number(2, &Default::default()).unwrap();
//! assert_eq!(grid[spawned].value, 2);
//!
//! grid.expand(Direction::Right);
//! assert_eq!(grid.cols(), 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cell;
pub mod coord;
pub mod grid;
pub mod hash;
pub mod passive;

// Re-exports for convenience
pub use cell::{merged_value, Cell, CellKind, BOMB, HAZARD, WALL};
pub use coord::{Direction, ParseDirectionError, Pos};
pub use grid::Grid;
pub use hash::{hash_grid, hash_grid_into};
pub use passive::PassiveMask;
