//! End-to-end turns through [`Engine::process_move`].

use proptest::prelude::*;
use tilegrid::{CellKind, Direction, PassiveMask, Pos};

use super::helpers::*;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::events::{MergeEvent, MoveEvent, PassiveGrant, TurnResult};

// =============================================================================
// Ordinary Movement
// =============================================================================

#[test]
fn pair_merges_and_scores() {
    let mut engine = row_engine(&[2, 2, 0, 0]);

    let result = engine.process_move(Direction::Left);

    assert!(result.board_changed);
    assert_eq!(result.moves, vec![MoveEvent::new(p(0, 1), p(0, 0), 2)]);
    assert_eq!(result.merges, vec![MergeEvent::new(p(0, 0), 4)]);
    assert_eq!(engine.grid_values(), vec![4, 0, 0, 0]);
    assert_eq!(result.score_delta, 4);
    assert_eq!(engine.score(), 4504);
    assert_eq!(engine.turn(), 1);
}

#[test]
fn bomb_takes_one_neighbour_with_it() {
    let mut engine = row_engine(&[2, -1, 2, 0]);

    let result = engine.process_move(Direction::Left);

    assert!(result.board_changed);
    assert_eq!(engine.grid_values(), vec![2, 0, 0, 0]);
    assert!(!result.bomb_destroyed.is_empty());
    assert!(result.merges.is_empty());
    assert_eq!(result.score_delta, 0);
}

#[test]
fn spawn_adds_exactly_one_tile() {
    let mut engine = Engine::with_config(EngineConfig::with_size(1, 4).with_spawns(0, 1))
        .expect("valid config");
    set_row(&mut engine, 0, &[2, 0, 0, 0]);

    let result = engine.process_move(Direction::Right);

    let spawned = result.spawned_tile.expect("board has room");
    let values = engine.grid_values();
    assert_eq!(values.iter().filter(|v| **v > 0).count(), 2);
    assert_eq!(values[spawned.col], 2);
    assert_ne!(spawned, p(0, 3));
}

#[test]
fn spawn_skips_bomb_craters() {
    let mut engine = Engine::with_config(EngineConfig::with_size(1, 2).with_spawns(0, 1))
        .expect("valid config");
    set_row(&mut engine, 0, &[-1, 2]);

    let result = engine.process_move(Direction::Left);

    assert_eq!(result.bomb_destroyed, [p(0, 0)].into_iter().collect());
    assert_eq!(result.spawned_tile, Some(p(0, 1)));
    assert_eq!(engine.grid_values(), vec![0, 2]);
}

#[test]
fn huge_tiles_merge_without_overflow() {
    let mut engine = row_engine(&[1 << 30, 1 << 30]);

    let result = engine.process_move(Direction::Left);

    assert_eq!(engine.grid_values(), vec![i32::MAX, 0]);
    assert_eq!(result.score_delta, i64::from(i32::MAX));
    assert!(result.expansion_required);
}

#[test]
fn wall_from_first_expansion_blocks_sliding() {
    let mut engine = scripted_engine(3, 3);
    engine.complete_expansion(Direction::Right);
    assert!(engine.grid()[p(1, 3)].is_wall());

    engine
        .set_tile(p(1, 0), 2, PassiveMask::empty())
        .expect("in bounds");
    engine.process_move(Direction::Right);

    assert_eq!(engine.grid()[p(1, 2)].value, 2);
    assert!(engine.grid()[p(1, 3)].is_wall());
}

// =============================================================================
// Slow Tiles
// =============================================================================

#[test]
fn slow_tile_crosses_the_row_over_three_turns() {
    let mut engine = scripted_engine(1, 4);
    engine
        .set_tile(p(0, 3), 8, PassiveMask::SLOW)
        .expect("in bounds");

    let first = engine.process_move(Direction::Left);
    assert!(first.board_changed);
    assert_eq!(first.behavior_moves, vec![MoveEvent::new(p(0, 3), p(0, 2), 8)]);
    assert_eq!(engine.grid_values(), vec![0, 0, 8, 0]);
    let mover = engine.slow_movers()[0];
    assert_eq!((mover.current, mover.destination), (p(0, 2), p(0, 0)));

    let second = engine.process_move(Direction::Left);
    assert!(second.board_changed);
    assert_eq!(engine.grid_values(), vec![0, 8, 0, 0]);
    assert_eq!(engine.slow_movers().len(), 1);

    let third = engine.process_move(Direction::Left);
    assert!(third.slow_mover_updates[0].finished);
    assert_eq!(engine.grid_values(), vec![8, 0, 0, 0]);
    assert!(engine.slow_movers().is_empty());
    assert_eq!(engine.passive_map(), vec![(p(0, 0), PassiveMask::SLOW)]);

    let fourth = engine.process_move(Direction::Left);
    assert!(!fourth.board_changed);
}

#[test]
fn slow_mover_travels_regardless_of_input() {
    let mut engine = scripted_engine(1, 4);
    engine
        .set_tile(p(0, 3), 8, PassiveMask::SLOW)
        .expect("in bounds");
    engine.process_move(Direction::Left);

    // The mover keeps its own direction.
    let result = engine.process_move(Direction::Right);

    assert!(result.board_changed);
    assert_eq!(engine.grid_values(), vec![0, 8, 0, 0]);
}

#[test]
fn equal_tile_behind_slow_tile_merges_into_it() {
    let mut engine = scripted_engine(1, 4);
    engine
        .set_tile(p(0, 1), 4, PassiveMask::SLOW)
        .expect("in bounds");
    engine
        .set_tile(p(0, 2), 4, PassiveMask::empty())
        .expect("in bounds");

    let result = engine.process_move(Direction::Left);

    assert!(result.merges.is_empty());
    assert_eq!(result.behavior_merges, vec![MergeEvent::new(p(0, 1), 8)]);
    assert_eq!(engine.grid_values(), vec![8, 0, 0, 0]);
    assert_eq!(engine.passive_map(), vec![(p(0, 0), PassiveMask::SLOW)]);
    assert_eq!(result.score_delta, 8);
}

#[test]
fn slow_mover_merge_counts_toward_score() {
    let mut engine = scripted_engine(1, 4);
    engine
        .set_tile(p(0, 3), 8, PassiveMask::SLOW)
        .expect("in bounds");
    engine.process_move(Direction::Left);
    engine
        .set_tile(p(0, 1), 8, PassiveMask::empty())
        .expect("in bounds");
    engine.place_freeze(p(0, 1)).expect("in bounds");

    let result = engine.process_move(Direction::Up);

    assert!(result.board_changed);
    assert!(result.slow_mover_updates[0].merged);
    assert_eq!(engine.grid_values(), vec![0, 16, 0, 0]);
    assert_eq!(result.score_delta, 16);
    assert!(engine.slow_movers().is_empty());
}

#[test]
fn bomb_destroys_slow_tile_and_its_mover() {
    let mut engine = scripted_engine(1, 5);
    engine
        .set_tile(p(0, 4), 8, PassiveMask::SLOW)
        .expect("in bounds");
    engine.process_move(Direction::Left);
    assert_eq!(engine.slow_movers()[0].current, p(0, 3));

    assert_eq!(engine.place_bomb(p(0, 2)), Ok(true));
    let result = engine.process_move(Direction::Left);

    assert!(result.board_changed);
    assert!(engine.slow_movers().is_empty());
    assert_eq!(engine.grid_values(), vec![0; 5]);
    assert_eq!(
        result.bomb_destroyed,
        [p(0, 2), p(0, 3)].into_iter().collect()
    );
    assert!(result.slow_mover_updates.is_empty());
}

#[test]
fn movers_meeting_head_on_leave_one_tile() {
    let mut engine = scripted_engine(1, 7);
    engine
        .set_tile(p(0, 5), 8, PassiveMask::SLOW)
        .expect("in bounds");
    engine
        .set_tile(p(0, 1), 8, PassiveMask::all())
        .expect("in bounds");

    engine.process_move(Direction::Left);
    assert_eq!(engine.grid_values(), vec![0, 0, 8, 0, 8, 0, 0]);
    assert_eq!(engine.slow_movers().len(), 2);

    let met = engine.process_move(Direction::Up);
    assert_eq!(met.score_delta, 16);
    assert_eq!(engine.grid_values(), vec![0, 0, 0, 16, 0, 0, 0]);
    assert!(engine.slow_movers().is_empty());

    let after = engine.process_move(Direction::Up);
    assert!(!after.board_changed);
    assert_eq!(engine.grid_values(), vec![0, 0, 0, 16, 0, 0, 0]);
}

// =============================================================================
// Contrarian Tiles
// =============================================================================

#[test]
fn contrarian_and_ordinary_tiles_part_ways() {
    let mut engine = row_engine(&[0, 0, 2, 0]);
    engine
        .set_tile(p(0, 1), 4, PassiveMask::CONTRARIAN)
        .expect("in bounds");

    let result = engine.process_move(Direction::Right);

    assert_eq!(engine.grid_values(), vec![4, 0, 0, 2]);
    assert_eq!(result.moves, vec![MoveEvent::new(p(0, 2), p(0, 3), 2)]);
    assert_eq!(result.behavior_moves, vec![MoveEvent::new(p(0, 1), p(0, 0), 4)]);
}

#[test]
fn blocked_contrarian_waits() {
    let mut engine = scripted_engine(2, 3);
    set_row(&mut engine, 0, &[2, 0, 0]);
    set_row(&mut engine, 1, &[2, 0, 0]);
    engine
        .set_tile(p(0, 1), 4, PassiveMask::CONTRARIAN)
        .expect("in bounds");

    let result = engine.process_move(Direction::Right);

    assert!(result.board_changed);
    assert_eq!(engine.grid_values(), vec![2, 4, 0, 0, 0, 2]);
    assert!(result.behavior_moves.is_empty());
}

#[test]
fn bomb_sliding_into_contrarian_detonates() {
    let mut engine = scripted_engine(1, 4);
    engine
        .set_tile(p(0, 0), 2, PassiveMask::CONTRARIAN)
        .expect("in bounds");
    engine
        .set_tile(p(0, 3), -1, PassiveMask::empty())
        .expect("in bounds");

    let result = engine.process_move(Direction::Left);

    assert!(result.board_changed);
    assert_eq!(engine.grid_values(), vec![0, 0, 0, 0]);
    assert_eq!(result.bomb_destroyed, [p(0, 0), p(0, 1)].into_iter().collect());
}

// =============================================================================
// Hazards
// =============================================================================

#[test]
fn hazard_wanders_on_valid_turns_only() {
    let mut engine = hazard_engine(3, 3);
    engine
        .set_tile(p(1, 1), -2, PassiveMask::empty())
        .expect("in bounds");
    engine
        .set_tile(p(0, 2), 2, PassiveMask::empty())
        .expect("in bounds");

    let rejected = engine.process_move(Direction::Right);
    assert!(!rejected.board_changed);
    assert_eq!(engine.random_movers()[0].pos, p(1, 1));

    let result = engine.process_move(Direction::Left);
    assert!(result.board_changed);
    assert_eq!(result.random_mover_updates.len(), 1);
    let update = result.random_mover_updates[0];
    assert_eq!(update.from, p(1, 1));
    assert_eq!(update.from.distance(update.to), 1);
    assert_eq!(engine.random_movers()[0].pos, update.to);
}

#[test]
fn frozen_hazard_stays_put() {
    let mut engine = hazard_engine(3, 3);
    engine
        .set_tile(p(1, 1), -2, PassiveMask::empty())
        .expect("in bounds");
    engine
        .set_tile(p(0, 2), 2, PassiveMask::empty())
        .expect("in bounds");
    assert_eq!(engine.place_freeze(p(1, 1)), Ok(true));

    let result = engine.process_move(Direction::Left);

    assert!(result.random_mover_updates.is_empty());
    assert!(engine.grid()[p(1, 1)].is_hazard());
}

#[test]
fn hazard_respawns_after_delay() {
    let mut engine = hazard_engine(1, 4);
    set_row(&mut engine, 0, &[-2, -1, 0, 2]);

    let first = engine.process_move(Direction::Left);
    assert_eq!(first.hazard_kills, vec![p(0, 0)]);
    assert_eq!(engine.grid_values(), vec![2, 0, 0, 0]);
    assert_eq!(engine.hazard_respawn_in(), 2);

    let second = engine.process_move(Direction::Right);
    assert!(second.spawned_hazard.is_none());
    assert_eq!(engine.hazard_respawn_in(), 1);

    let third = engine.process_move(Direction::Left);
    let pos = third.spawned_hazard.expect("room for a hazard");
    assert_eq!(engine.random_movers().len(), 1);
    assert!(engine.grid()[pos].is_hazard());
    assert_eq!(engine.hazard_respawn_in(), 0);
}

#[test]
fn hazards_stay_locked_at_low_thresholds() {
    let mut engine = scripted_engine(1, 4);
    set_row(&mut engine, 0, &[-2, -1, 0, 2]);

    engine.process_move(Direction::Left);

    assert_eq!(engine.hazard_respawn_in(), 0);
    assert_eq!(engine.grid().count(CellKind::Hazard), 0);
}

// =============================================================================
// Passive Grants
// =============================================================================

#[test]
fn grants_are_proposed_not_applied() {
    let mut engine = Engine::with_config(
        EngineConfig::with_size(1, 4)
            .with_spawns(0, 0)
            .with_grant_rate(100.0),
    )
    .expect("valid config");
    set_row(&mut engine, 0, &[2, 2, 8, 0]);

    let result = engine.process_move(Direction::Left);

    // 4 * 100% per value: four guaranteed grants, never on the merged tile.
    assert_eq!(
        result.passive_grants,
        vec![PassiveGrant { pos: p(0, 1), tile_value: 8 }; 4]
    );
    assert!(engine.passive_map().is_empty());

    engine
        .assign_passive(p(0, 1), PassiveMask::SLOW)
        .expect("in bounds");
    assert_eq!(engine.passive_map(), vec![(p(0, 1), PassiveMask::SLOW)]);
}

// =============================================================================
// Properties
// =============================================================================

fn board_strategy(rows: usize, cols: usize) -> impl Strategy<Value = Vec<(i32, u8)>> {
    let value = prop_oneof![
        4 => Just(0),
        3 => Just(2),
        2 => Just(4),
        1 => Just(8),
        1 => Just(-1),
    ];
    prop::collection::vec((value, 0u8..4), rows * cols)
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

fn build(rows: usize, cols: usize, cells: &[(i32, u8)]) -> Engine {
    let mut engine = scripted_engine(rows, cols);
    for (i, (value, bits)) in cells.iter().enumerate() {
        engine
            .set_tile(
                Pos::new(i / cols, i % cols),
                *value,
                PassiveMask::from_bits_truncate(*bits),
            )
            .expect("in bounds");
    }
    engine
}

proptest! {
    #[test]
    fn rejected_turn_changes_nothing(
        cells in board_strategy(3, 3),
        direction in direction_strategy(),
        freeze in 0usize..9,
    ) {
        let mut engine = build(3, 3, &cells);
        let _ = engine.place_freeze(Pos::new(freeze / 3, freeze % 3));

        let hash = engine.state_hash();
        let values = engine.grid_values();
        let passives = engine.passive_map();

        let result = engine.process_move(direction);

        if !result.board_changed {
            prop_assert_eq!(result, TurnResult::default());
            prop_assert_eq!(engine.state_hash(), hash);
            prop_assert_eq!(engine.grid_values(), values);
            prop_assert_eq!(engine.passive_map(), passives);
        }
    }

    #[test]
    fn score_is_the_sum_of_merges(
        cells in board_strategy(4, 4),
        moves in prop::collection::vec(direction_strategy(), 1..8),
    ) {
        let mut engine = build(4, 4, &cells);
        let start = engine.score();
        let mut total = 0;

        for direction in moves {
            let result = engine.process_move(direction);
            let merged: i64 = result.all_merges().iter().map(|m| i64::from(m.value)).sum();
            prop_assert_eq!(result.score_delta, merged);
            total += result.score_delta;
        }
        prop_assert_eq!(engine.score(), start + total);
    }

    #[test]
    fn movers_always_sit_on_their_tiles(
        cells in board_strategy(4, 4),
        moves in prop::collection::vec(direction_strategy(), 1..8),
    ) {
        let mut engine = build(4, 4, &cells);
        for direction in moves {
            engine.process_move(direction);
            assert_movers_in_sync(&engine)?;
        }
    }

    #[test]
    fn facing_movers_stay_in_sync(
        cells in prop::collection::vec(prop_oneof![3 => Just(0), 1 => Just(2), 1 => Just(8)], 9),
        slow_at in 4usize..9,
        contrarian_at in 0usize..4,
        value in prop_oneof![Just(2), Just(8)],
        moves in prop::collection::vec(direction_strategy(), 1..8),
    ) {
        let mut engine = scripted_engine(1, 9);
        set_row(&mut engine, 0, &cells);
        engine.set_tile(p(0, slow_at), value, PassiveMask::SLOW).expect("in bounds");
        engine.set_tile(p(0, contrarian_at), value, PassiveMask::all()).expect("in bounds");

        let mut scored = 0;
        for direction in moves {
            let result = engine.process_move(direction);
            scored += result.score_delta;
            assert_movers_in_sync(&engine)?;
            let mass: i64 = engine.grid_values().iter().map(|v| i64::from(*v)).sum();
            let start: i64 = cells.iter().map(|v| i64::from(*v)).sum::<i64>()
                - i64::from(cells[slow_at] + cells[contrarian_at])
                + 2 * i64::from(value);
            // Merges keep the total; nothing here can destroy a tile.
            prop_assert_eq!(mass, start);
        }
        prop_assert_eq!(engine.score(), 4500 + scored);
    }
}

/// Every live mover sits on its own tile with matching value and passives.
fn assert_movers_in_sync(engine: &Engine) -> Result<(), TestCaseError> {
    let mut seen = std::collections::BTreeSet::new();
    for mover in engine.slow_movers() {
        let cell = engine.grid()[mover.current];
        prop_assert!(mover.active);
        prop_assert!(seen.insert(mover.current), "two movers on {}", mover.current);
        prop_assert_eq!(cell.value, mover.value);
        prop_assert_eq!(cell.passive, mover.passive);
        prop_assert!(cell.passive.contains(PassiveMask::SLOW));
    }
    Ok(())
}
