//! Movement engine: segment-aware sliding and merging.
//!
//! A move walks every lane (row for horizontal moves, column for vertical
//! ones) from the edge the tiles slide toward. Each lane is cut into
//! segments at frozen positions and every segment is compacted on its own,
//! so a frozen tile behaves like a wall that never moves and never merges.
//!
//! # Compaction
//!
//! Within a segment the non-empty tiles are scanned front to back with a
//! one-tile lookahead:
//!
//! 1. A bomb next to any tile (bomb first or second) removes both. The slot
//!    they were heading for is recorded as destroyed; the next tile may
//!    still take it.
//! 2. Two equal positive tiles merge into one of double value. The merged
//!    tile keeps the leading tile's passive, else the trailing tile's.
//! 3. Anything else slides into the next free slot.
//!
//! Merges consume both tiles in one step, so `[2, 2, 2]` compacts to
//! `[4, 2]`, never `[8]`.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use quadmerge_core::movement::slide;
//! use tilegrid::{Cell, Direction, Grid, Pos};
//!
//! let mut grid = Grid::with_seed(1, 4, 0);
//! grid[Pos::new(0, 0)] = Cell::numbered(2);
//! grid[Pos::new(0, 1)] = Cell::numbered(2);
//!
//! let outcome = slide(&mut grid, Direction::Left, &BTreeSet::new());
//! assert!(outcome.changed);
//! assert_eq!(grid.values(), vec![4, 0, 0, 0]);
//! assert_eq!(outcome.merges.len(), 1);
//! ```

use std::collections::BTreeSet;
use std::iter;

use tilegrid::{merged_value, Cell, Direction, Grid, Pos};

use crate::events::{MergeEvent, MoveEvent};

/// What one call to [`slide`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Every tile that changed address, including tiles consumed by a merge
    /// or a bomb.
    pub moves: Vec<MoveEvent>,
    /// Every merge, at the merged tile's position.
    pub merges: Vec<MergeEvent>,
    /// Slots where a bomb and its partner were removed.
    pub destroyed: BTreeSet<Pos>,
    /// The flattened board differs from before the move.
    pub changed: bool,
}

// =============================================================================
// Geometry
// =============================================================================

/// Every lane of a `rows x cols` board for a move in `direction`.
///
/// Each lane is ordered from the edge tiles slide toward, so index 0 is the
/// first slot to fill.
#[must_use]
pub fn lanes(rows: usize, cols: usize, direction: Direction) -> Vec<Vec<Pos>> {
    match direction {
        Direction::Left => (0..rows)
            .map(|row| (0..cols).map(|col| Pos::new(row, col)).collect())
            .collect(),
        Direction::Right => (0..rows)
            .map(|row| (0..cols).rev().map(|col| Pos::new(row, col)).collect())
            .collect(),
        Direction::Up => (0..cols)
            .map(|col| (0..rows).map(|row| Pos::new(row, col)).collect())
            .collect(),
        Direction::Down => (0..cols)
            .map(|col| (0..rows).rev().map(|row| Pos::new(row, col)).collect())
            .collect(),
    }
}

/// Maximal runs of non-frozen positions in `lane`, in lane order.
#[must_use]
pub fn segments<'a>(lane: &'a [Pos], frozen: &BTreeSet<Pos>) -> Vec<&'a [Pos]> {
    lane.split(|pos| frozen.contains(pos))
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// In-bounds positions strictly past `from` in `direction`, nearest first.
pub fn ray(grid: &Grid, from: Pos, direction: Direction) -> impl Iterator<Item = Pos> + '_ {
    iter::successors(grid.neighbor(from, direction), move |pos| {
        grid.neighbor(*pos, direction)
    })
}

/// Number of cells between `pos` and the wall on the `direction` side.
#[must_use]
pub fn wall_distance(grid: &Grid, pos: Pos, direction: Direction) -> usize {
    match direction {
        Direction::Up => pos.row,
        Direction::Down => grid.rows() - 1 - pos.row,
        Direction::Left => pos.col,
        Direction::Right => grid.cols() - 1 - pos.col,
    }
}

// =============================================================================
// Sliding
// =============================================================================

/// Slides every non-frozen tile of `grid` in `direction`.
///
/// Frozen positions are never read or written. `changed` compares the full
/// flattened board before and after.
pub fn slide(grid: &mut Grid, direction: Direction, frozen: &BTreeSet<Pos>) -> MoveOutcome {
    let before = grid.values();
    let mut outcome = MoveOutcome::default();

    for lane in lanes(grid.rows(), grid.cols(), direction) {
        for segment in segments(&lane, frozen) {
            compact(grid, segment, &mut outcome);
        }
    }

    outcome.changed = grid.values() != before;
    outcome
}

fn record_move(outcome: &mut MoveOutcome, from: Pos, to: Pos, value: i32) {
    if from != to {
        outcome.moves.push(MoveEvent::new(from, to, value));
    }
}

/// Compacts one segment toward its first slot.
fn compact(grid: &mut Grid, segment: &[Pos], outcome: &mut MoveOutcome) {
    let tiles: Vec<(Pos, Cell)> = segment
        .iter()
        .map(|pos| (*pos, grid[*pos]))
        .filter(|(_, cell)| !cell.is_empty())
        .collect();

    let mut placed: Vec<Cell> = Vec::with_capacity(tiles.len());
    let mut i = 0;

    while i < tiles.len() {
        let target = segment[placed.len()];
        let (origin, cell) = tiles[i];

        match tiles.get(i + 1) {
            Some(&(next_origin, next)) if cell.is_bomb() || next.is_bomb() => {
                record_move(outcome, origin, target, cell.value);
                record_move(outcome, next_origin, target, next.value);
                outcome.destroyed.insert(target);
                i += 2;
            }
            Some(&(next_origin, next)) if cell.is_numbered() && cell.value == next.value => {
                let passive = if cell.has_passive() {
                    cell.passive
                } else {
                    next.passive
                };
                let merged = Cell::numbered(merged_value(cell.value)).with_passive(passive);
                record_move(outcome, origin, target, cell.value);
                record_move(outcome, next_origin, target, next.value);
                outcome.merges.push(MergeEvent::new(target, merged.value));
                placed.push(merged);
                i += 2;
            }
            _ => {
                record_move(outcome, origin, target, cell.value);
                placed.push(cell);
                i += 1;
            }
        }
    }

    for (slot, pos) in segment.iter().enumerate() {
        grid[*pos] = placed.get(slot).copied().unwrap_or(Cell::EMPTY);
    }
}
