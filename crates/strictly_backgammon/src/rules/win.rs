//! Win detection.

use crate::board::Board;
use crate::types::{CHECKERS_PER_PLAYER, Color};

/// Whether `color` has borne off all fifteen checkers.
pub fn has_borne_off_all(board: &Board, color: Color) -> bool {
    board.off_count(color) == usize::from(CHECKERS_PER_PLAYER)
}

/// The color that has borne everything off, if any.
pub fn winner(board: &Board) -> Option<Color> {
    Color::ALL.into_iter().find(|&c| has_borne_off_all(board, c))
}
