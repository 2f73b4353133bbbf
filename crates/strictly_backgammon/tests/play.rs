//! Turns: move counts, re-entry, hits, undo and forced passes.

mod common;

use common::rolled_player;
use proptest::prelude::*;
use strictly_backgammon::invariants::MoveCountInvariant;
use strictly_backgammon::{
    Board, BoardImportEntry, Color, ContainerId, DieValue, Direction,
    GammonError, IllegalMoveReason, Invariant, Move, MoveKind, Play, PlayState,
};

#[test]
fn test_double_gives_four_moves() {
    let board = Board::initialize();
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 3, 3))
        .expect("Rolled player starts a play");
    assert_eq!(play.moves().len(), 4);
    assert_eq!(play.state(), PlayState::Rolled);
    assert!(MoveCountInvariant::holds(&play));

    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 6, 1))
        .expect("Rolled player starts a play");
    assert_eq!(play.moves().len(), 2);
}

#[test]
fn test_closed_board_resolves_every_die_as_no_move() {
    let mut entries = vec![
        BoardImportEntry::bar(Color::Black, 1),
        BoardImportEntry::point(10, Color::Black, 3),
    ];
    entries.extend((19..=24).map(|index| BoardImportEntry::point(index, Color::White, 2)));
    let board = Board::build(&entries, Direction::Clockwise).expect("Valid import");

    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 6, 5))
        .expect("Rolled player starts a play");
    assert!(play.is_complete());
    assert!(play.moves().iter().all(|m| m.kind() == Some(MoveKind::NoMove)));
    let play = play.to_moving().expect("Rolled play starts moving");
    assert_eq!(play.state(), PlayState::Moved);
}

#[test]
fn test_bar_checker_must_reenter_first() {
    let board = Board::build(
        &[
            BoardImportEntry::bar(Color::Black, 1),
            BoardImportEntry::point(13, Color::Black, 5),
            BoardImportEntry::point(1, Color::White, 2),
        ],
        Direction::Clockwise,
    )
    .expect("Valid import");
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 4, 2))
        .expect("Rolled player starts a play");

    assert_eq!(
        play.begin_move(ContainerId::point(13), None),
        Err(IllegalMoveReason::MustReenterFromBar.into())
    );

    let entered = play
        .move_checker(&board, ContainerId::bar(Direction::Clockwise), None)
        .expect("Bar checker enters");
    assert_eq!(entered.mv.kind(), Some(MoveKind::Reenter));
    assert_eq!(entered.mv.destination(), Some(ContainerId::point(21)));
    assert_eq!(entered.board.bar_count(Color::Black), 0);

    // With the bar clear the other checkers are free to move.
    let next = entered
        .play
        .move_checker(&entered.board, ContainerId::point(13), None)
        .expect("Mid-board checker moves");
    assert_eq!(next.play.state(), PlayState::Moved);
}

#[test]
fn test_hit_is_recorded_on_the_move() {
    let board = Board::build(
        &[
            BoardImportEntry::point(24, Color::Black, 2),
            BoardImportEntry::point(18, Color::White, 1),
            BoardImportEntry::point(3, Color::White, 2),
        ],
        Direction::Clockwise,
    )
    .expect("Valid import");
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 6, 1))
        .expect("Rolled player starts a play");
    let six = DieValue::new(6).expect("Valid face");
    let result = play
        .move_checker(&board, ContainerId::point(24), Some(six))
        .expect("Hit is legal");
    assert!(result.mv.is_hit());
    assert_eq!(result.board.bar_count(Color::White), 1);
    assert_eq!(result.board.pip_count(Color::White), 25 + 2 * 22);
}

#[test]
fn test_undo_restores_board_and_die() {
    let board = Board::initialize();
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 6, 1))
        .expect("Rolled player starts a play");
    let moved = play
        .move_checker(&board, ContainerId::point(13), None)
        .expect("Legal move");
    assert_eq!(moved.play.undo_depth(), 1);

    let (undone, restored) = moved.play.undo().expect("One move to undo");
    assert_eq!(restored, board);
    assert_eq!(undone.ready_moves().count(), 2);
    assert_eq!(undone.undo_depth(), 0);
    assert_eq!(undone.undo(), Err(IllegalMoveReason::NothingToUndo.into()));
}

#[test]
fn test_selection_can_be_cancelled() {
    let board = Board::initialize();
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 6, 1))
        .expect("Rolled player starts a play");
    let selected = play
        .begin_move(ContainerId::point(24), None)
        .expect("Back checker can move");
    assert_eq!(
        selected.begin_move(ContainerId::point(13), None),
        Err(IllegalMoveReason::MoveInFlight.into())
    );
    let cancelled = selected.cancel_move().expect("Selection in flight");
    assert_eq!(cancelled.ready_moves().count(), 2);
    assert!(cancelled.cancel_move().is_err());
}

#[test]
fn test_unrolled_die_is_unavailable() {
    let board = Board::initialize();
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 6, 1))
        .expect("Rolled player starts a play");
    let four = DieValue::new(4).expect("Valid face");
    assert_eq!(
        play.begin_move(ContainerId::point(13), Some(four)),
        Err(IllegalMoveReason::DieUnavailable(four).into())
    );
}

#[test]
fn test_auto_pass_forfeits_remaining_dice() {
    let board = Board::initialize();
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 5, 5))
        .expect("Rolled player starts a play");
    let passed = play.auto_pass().expect("Unconfirmed play can pass");
    assert!(passed.is_complete());
    assert_eq!(passed.state(), PlayState::Moved);
    let confirmed = passed.confirm(&board).expect("Complete play confirms");
    assert_eq!(confirmed.state(), PlayState::Confirmed);
    assert!(matches!(confirmed.auto_pass(), Err(GammonError::IllegalTransition { .. })));
}

#[test]
fn test_confirm_requires_every_die() {
    let board = Board::initialize();
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 6, 1))
        .expect("Rolled player starts a play");
    assert_eq!(play.confirm(&board), Err(IllegalMoveReason::TurnIncomplete.into()));
}

proptest! {
    #[test]
    fn prop_move_count_matches_roll(first in 1u8..=6, second in 1u8..=6) {
        let board = Board::initialize();
        let play = Play::initialize(&board, &rolled_player(&board, Color::White, first, second))
            .expect("Rolled player starts a play");
        let expected = if first == second { 4 } else { 2 };
        prop_assert_eq!(play.moves().len(), expected);
        prop_assert!(MoveCountInvariant::holds(&play));
    }

    #[test]
    fn prop_dry_run_leaves_move_and_board_alone(value in 1u8..=6) {
        let board = Board::initialize();
        let die = DieValue::new(value).expect("Valid face");
        let mv = Move::ready(&board, Color::Black, die);
        for skeleton in mv.possible_moves().to_vec() {
            let dry = mv.apply(&board, skeleton.origin, true).expect("Legal move");
            prop_assert_eq!(&dry.mv, &mv);
            prop_assert!(dry.mv.is_ready());
            let real = mv.apply(&board, skeleton.origin, false).expect("Legal move");
            prop_assert_eq!(&dry.board, &real.board);
            prop_assert!(real.mv.is_resolved());
            prop_assert_eq!(&board, &Board::initialize());
        }
    }
}

#[test]
fn test_closed_landing_point_is_reported() {
    let board = Board::initialize();
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 5, 2))
        .expect("Rolled player starts a play");
    let five = DieValue::new(5).expect("Valid face");
    assert_eq!(
        play.move_checker(&board, ContainerId::point(24), Some(five)),
        Err(IllegalMoveReason::PointBlocked(ContainerId::point(19)).into())
    );

    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 5, 5))
        .expect("Rolled player starts a play");
    assert_eq!(
        play.move_checker(&board, ContainerId::point(24), None),
        Err(IllegalMoveReason::PointBlocked(ContainerId::point(19)).into())
    );
}

#[test]
fn test_bear_off_refused_with_checker_outside_home() {
    let board = Board::build(
        &[
            BoardImportEntry::point(3, Color::Black, 4),
            BoardImportEntry::point(10, Color::Black, 1),
            BoardImportEntry::point(20, Color::White, 2),
        ],
        Direction::Clockwise,
    )
    .expect("Valid import");
    let play = Play::initialize(&board, &rolled_player(&board, Color::Black, 3, 1))
        .expect("Rolled player starts a play");
    let three = DieValue::new(3).expect("Valid face");
    assert_eq!(
        play.move_checker(&board, ContainerId::point(3), Some(three)),
        Err(IllegalMoveReason::BearOffNotAllowed.into())
    );
}
