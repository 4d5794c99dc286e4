//! Passive roller: turns merges into candidate passive grants.
//!
//! Each merge gives a grant chance of `value * rate` percent. Whole hundreds
//! are guaranteed grants; the remainder is one weighted coin flip. Every grant
//! picks a tile uniformly from the numbered tiles outside the excluded set.
//!
//! The roller only proposes. Applying a grant is left to the host, usually
//! through [`Engine::assign_passive`](crate::engine::Engine::assign_passive).

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tilegrid::{Grid, Pos};
use tracing::trace;

use crate::events::{MergeEvent, PassiveGrant};

/// Splits the grant chance for a merged `value` into guaranteed grants and a
/// remaining percentage in `[0, 100)`.
#[must_use]
pub fn grant_odds(value: i32, rate_percent: f64) -> (u32, f64) {
    let chance = f64::from(value.max(0)) * rate_percent;
    let whole = (chance / 100.0).floor();
    let remainder = chance - whole * 100.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let guaranteed = whole as u32;
    (guaranteed, remainder)
}

/// Seeded source of passive grants.
#[derive(Debug, Clone)]
pub struct PassiveRoller {
    rng: ChaCha8Rng,
    rate_percent: f64,
}

impl PassiveRoller {
    /// A roller drawing from `rng` at `rate_percent` per merged value.
    #[must_use]
    pub fn new(rng: ChaCha8Rng, rate_percent: f64) -> Self {
        Self { rng, rate_percent }
    }

    /// Grant chance per merged value, in percent.
    #[must_use]
    pub fn rate_percent(&self) -> f64 {
        self.rate_percent
    }

    /// Rolls every merge in order. Tiles may be picked more than once.
    pub fn roll(
        &mut self,
        grid: &Grid,
        merges: &[MergeEvent],
        excluded: &BTreeSet<Pos>,
    ) -> Vec<PassiveGrant> {
        let eligible = grid.numbered_cells(excluded);
        if eligible.is_empty() {
            return Vec::new();
        }

        let mut grants = Vec::new();
        for merge in merges {
            let (guaranteed, remainder) = grant_odds(merge.value, self.rate_percent);
            let mut picks = guaranteed;
            if remainder > 0.0 && self.rng.gen_range(0.0..100.0) < remainder {
                picks += 1;
            }

            for _ in 0..picks {
                let Some(&pos) = eligible.choose(&mut self.rng) else {
                    break;
                };
                let tile = grid[pos];
                trace!(%pos, value = tile.value, merged = merge.value, "passive grant rolled");
                grants.push(PassiveGrant {
                    pos,
                    tile_value: tile.value,
                });
            }
        }
        grants
    }
}
