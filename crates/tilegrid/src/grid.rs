//! Grid: the authoritative board of cells.
//!
//! The grid is a row-major array of [`Cell`]s with a seeded `ChaCha8Rng` for
//! spawning. Everything else in a game (movers, frozen sets, behaviour
//! snapshots) is derived from or kept in step with the grid; the grid itself
//! is the ground truth.
//!
//! # Growth
//!
//! [`Grid::expand`] inserts one outer row or column on the requested side.
//! Row and column counts never decrease. Expanding up or left shifts every
//! existing position by one; callers holding positions must shift them too.

use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::cell::{Cell, CellKind};
use crate::coord::{Direction, Pos};
use crate::passive::PassiveMask;

/// The game board.
#[derive(Debug, Clone)]
pub struct Grid {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Row-major cell storage, `rows * cols` long.
    cells: Vec<Cell>,
    /// Spawning RNG (injected).
    rng: ChaCha8Rng,
}

impl Grid {
    /// Creates an empty grid that spawns with the given RNG.
    #[must_use]
    pub fn new(rows: usize, cols: usize, rng: ChaCha8Rng) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::EMPTY; rows * cols],
            rng,
        }
    }

    /// Creates an empty grid with a `ChaCha8Rng` seeded from `seed`.
    #[must_use]
    pub fn with_seed(rows: usize, cols: usize, seed: u64) -> Self {
        Self::new(rows, cols, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True if `pos` addresses a cell of this grid.
    #[must_use]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index_of(&self, pos: Pos) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }

    /// Returns the cell at `pos`, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, pos: Pos) -> Option<&Cell> {
        self.index_of(pos).map(|i| &self.cells[i])
    }

    /// Returns the cell at `pos` mutably, or `None` if out of bounds.
    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut Cell> {
        self.index_of(pos).map(|i| &mut self.cells[i])
    }

    /// The in-bounds neighbour of `pos` one step in `direction`.
    #[must_use]
    pub fn neighbor(&self, pos: Pos, direction: Direction) -> Option<Pos> {
        pos.step(direction).filter(|p| self.contains(*p))
    }

    /// All in-bounds orthogonal neighbours, in [`Direction::ALL`] order.
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| self.neighbor(pos, dir))
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Pos::new(row, col)))
    }

    /// Every `(position, cell)` pair in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &Cell)> {
        self.positions().zip(self.cells.iter())
    }

    /// Positions of cells satisfying `pred`, row-major.
    pub fn positions_where<F>(&self, mut pred: F) -> Vec<Pos>
    where
        F: FnMut(&Cell) -> bool,
    {
        self.iter()
            .filter(|(_, cell)| pred(*cell))
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Positions of every cell of the given kind, row-major.
    #[must_use]
    pub fn find(&self, kind: CellKind) -> Vec<Pos> {
        self.positions_where(|cell| cell.kind() == kind)
    }

    /// True if at least one cell has the given kind.
    #[must_use]
    pub fn has_kind(&self, kind: CellKind) -> bool {
        self.cells.iter().any(|cell| cell.kind() == kind)
    }

    /// Number of cells of the given kind.
    #[must_use]
    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|cell| cell.kind() == kind).count()
    }

    /// Empty positions not in `excluded`, row-major.
    #[must_use]
    pub fn empty_cells(&self, excluded: &BTreeSet<Pos>) -> Vec<Pos> {
        self.iter()
            .filter(|(pos, cell)| cell.is_empty() && !excluded.contains(pos))
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Numbered-tile positions not in `excluded`, row-major.
    #[must_use]
    pub fn numbered_cells(&self, excluded: &BTreeSet<Pos>) -> Vec<Pos> {
        self.iter()
            .filter(|(pos, cell)| cell.is_numbered() && !excluded.contains(pos))
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Row-major flattened values.
    #[must_use]
    pub fn values(&self) -> Vec<i32> {
        self.cells.iter().map(|cell| cell.value).collect()
    }

    /// `(position, mask)` for every tile carrying a passive, row-major.
    #[must_use]
    pub fn passive_map(&self) -> Vec<(Pos, PassiveMask)> {
        self.iter()
            .filter(|(_, cell)| cell.has_passive())
            .map(|(pos, cell)| (pos, cell.passive))
            .collect()
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    fn spawn(&mut self, cell: Cell, excluded: &BTreeSet<Pos>) -> Option<Pos> {
        let empties = self.empty_cells(excluded);
        let pos = *empties.choose(&mut self.rng)?;
        self[pos] = cell;
        trace!(%pos, value = cell.value, "spawned tile");
        Some(pos)
    }

    /// Places a numbered tile of `value` in a random empty cell outside
    /// `excluded`. Returns `None` when no such cell exists.
    pub fn spawn_number(&mut self, value: i32, excluded: &BTreeSet<Pos>) -> Option<Pos> {
        self.spawn(Cell::numbered(value), excluded)
    }

    /// Places a bomb in a random empty cell.
    pub fn spawn_bomb(&mut self) -> Option<Pos> {
        self.spawn(Cell::bomb(), &BTreeSet::new())
    }

    /// Places a hazard in a random empty cell.
    pub fn spawn_hazard(&mut self) -> Option<Pos> {
        self.spawn(Cell::hazard(), &BTreeSet::new())
    }

    /// Mutable access to the spawning RNG.
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    // ========================================================================
    // Growth
    // ========================================================================

    /// Adds one empty outer row or column on the `direction` side.
    pub fn expand(&mut self, direction: Direction) {
        let (rows, cols) = if direction.is_horizontal() {
            (self.rows, self.cols + 1)
        } else {
            (self.rows + 1, self.cols)
        };
        let (row_shift, col_shift) = match direction {
            Direction::Up => (1, 0),
            Direction::Left => (0, 1),
            Direction::Down | Direction::Right => (0, 0),
        };

        let mut cells = vec![Cell::EMPTY; rows * cols];
        for (pos, cell) in self.iter() {
            cells[(pos.row + row_shift) * cols + pos.col + col_shift] = *cell;
        }

        self.rows = rows;
        self.cols = cols;
        self.cells = cells;
    }

    /// Deterministic fingerprint of dimensions and cell contents.
    ///
    /// RNG state is not included.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        crate::hash::hash_grid(self)
    }
}

impl Index<Pos> for Grid {
    type Output = Cell;

    /// # Panics
    ///
    /// Panics if `pos` is outside the grid. Coordinates are the caller's
    /// responsibility; use [`Grid::get`] when unsure.
    fn index(&self, pos: Pos) -> &Cell {
        match self.index_of(pos) {
            Some(i) => &self.cells[i],
            None => panic!("{pos} outside {}x{} grid", self.rows, self.cols),
        }
    }
}

impl IndexMut<Pos> for Grid {
    fn index_mut(&mut self, pos: Pos) -> &mut Cell {
        match self.index_of(pos) {
            Some(i) => &mut self.cells[i],
            None => panic!("{pos} outside {}x{} grid", self.rows, self.cols),
        }
    }
}
