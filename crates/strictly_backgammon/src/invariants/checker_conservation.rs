//! Checker conservation: 15 checkers per color, each where it says it is.

use super::Invariant;
use crate::board::{Board, CheckerContainer};
use crate::game::GameCore;
use crate::types::{CHECKERS_PER_PLAYER, Color};
use std::collections::BTreeSet;

/// Invariant: exactly 30 checkers with distinct ids, 15 of each color, and
/// every checker's recorded container is the one holding it.
pub struct CheckerConservationInvariant;

impl Invariant<Board> for CheckerConservationInvariant {
    fn holds(board: &Board) -> bool {
        let per_color = Color::ALL
            .iter()
            .all(|c| board.checker_count(*c) == usize::from(CHECKERS_PER_PLAYER));

        let ids: BTreeSet<_> = board.checkers().map(|c| c.id()).collect();
        let distinct = ids.len() == 2 * usize::from(CHECKERS_PER_PLAYER);

        let located = board.checkers().all(|checker| {
            board
                .container(checker.container())
                .is_some_and(|c| c.checkers().iter().any(|held| held.id() == checker.id()))
        });

        per_color && distinct && located
    }

    fn description() -> &'static str {
        "Board holds exactly 15 checkers per color, each in its recorded container"
    }
}

impl Invariant<GameCore> for CheckerConservationInvariant {
    fn holds(core: &GameCore) -> bool {
        <Self as Invariant<Board>>::holds(core.board())
    }

    fn description() -> &'static str {
        <Self as Invariant<Board>>::description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    #[test]
    fn standard_and_random_boards_hold() {
        assert!(CheckerConservationInvariant::holds(&Board::initialize()));
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let board = Board::random(&mut rng, Direction::Counterclockwise);
            assert!(CheckerConservationInvariant::holds(&board));
        }
    }

    #[test]
    fn short_board_fails() {
        let mut board = Board::empty(Direction::Clockwise);
        board
            .push_checker(crate::board::CheckerId(0), Color::Black, crate::board::ContainerId::point(1))
            .unwrap();
        assert!(!CheckerConservationInvariant::holds(&board));
    }
}
