//! Setup utilities for engine-level tests.

use tilegrid::{Direction, PassiveMask, Pos};

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::events::TurnResult;

/// Shorthand for [`Pos::new`].
pub fn p(row: usize, col: usize) -> Pos {
    Pos::new(row, col)
}

/// An engine that never spawns, so boards stay exactly as placed.
pub fn scripted_engine(rows: usize, cols: usize) -> Engine {
    Engine::with_config(EngineConfig::with_size(rows, cols).with_spawns(0, 0))
        .expect("scripted config is valid")
}

/// A scripted engine whose hazard gate is already open.
pub fn hazard_engine(rows: usize, cols: usize) -> Engine {
    Engine::with_config(
        EngineConfig::with_size(rows, cols)
            .with_spawns(0, 0)
            .with_expansion_threshold(8192),
    )
    .expect("hazard config is valid")
}

/// Writes `values` into row `row`, left to right, without passives.
pub fn set_row(engine: &mut Engine, row: usize, values: &[i32]) {
    for (col, value) in values.iter().enumerate() {
        engine
            .set_tile(p(row, col), *value, PassiveMask::empty())
            .expect("row fits the board");
    }
}

/// A scripted single-row engine holding `values`.
pub fn row_engine(values: &[i32]) -> Engine {
    let mut engine = scripted_engine(1, values.len());
    set_row(&mut engine, 0, values);
    engine
}

/// Plays `moves` in order and returns every result.
pub fn play(engine: &mut Engine, moves: &[Direction]) -> Vec<TurnResult> {
    moves.iter().map(|dir| engine.process_move(*dir)).collect()
}

/// A deterministic move sequence cycling through every direction.
pub fn move_script(len: usize) -> Vec<Direction> {
    const ORDER: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];
    (0..len).map(|i| ORDER[(i * 3 + i / 4) % 4]).collect()
}
