//! Multi-turn mover state machines.
//!
//! Two kinds of tile keep state between turns:
//!
//! - [`SlowMovers`]: tiles travelling one cell per turn toward a destination
//!   computed when they started moving
//! - [`RandomMovers`]: hazards that step to a random legal neighbour each turn
//!
//! The grid is always the source of truth. A slow mover shadows exactly one
//! cell and every operation that moves or destroys that cell updates the mover
//! in the same call. The hazard list is rebuilt from the grid every turn.

mod random;
mod slow;

pub use random::{RandomMover, RandomMovers, RespawnTimer};
pub use slow::{SlowMover, SlowMovers};
