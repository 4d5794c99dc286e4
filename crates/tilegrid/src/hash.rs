//! State hashing for determinism verification.
//!
//! Two grids that went through identical operations from the same seed must
//! produce identical hashes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::Grid;

/// Compute a deterministic hash of grid state.
///
/// This hash includes:
/// - Row and column counts
/// - Every cell value and passive mask, row-major
#[must_use]
pub fn hash_grid(grid: &Grid) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_grid_into(grid, &mut hasher);
    hasher.finish()
}

/// Feed grid state into an existing hasher, for callers that hash more state
/// alongside the board.
pub fn hash_grid_into<H: Hasher>(grid: &Grid, hasher: &mut H) {
    grid.rows().hash(hasher);
    grid.cols().hash(hasher);
    for (_, cell) in grid.iter() {
        cell.value.hash(hasher);
        cell.passive.bits().hash(hasher);
    }
}
