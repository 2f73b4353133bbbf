//! Bear-off eligibility.

use crate::board::{Board, CheckerContainer};
use crate::types::{Color, HOME_BOARD_SIZE, POINT_COUNT};

/// Whether every checker of `color` still on the board is inside its home board.
pub fn can_bear_off(board: &Board, color: Color) -> bool {
    board.bar_count(color) == 0
        && highest_occupied(board, color).is_none_or(|own| own <= HOME_BOARD_SIZE)
}

/// Farthest own-frame point holding a checker of `color`.
pub fn highest_occupied(board: &Board, color: Color) -> Option<u8> {
    let direction = board.direction_of(color);
    (1..=POINT_COUNT)
        .rev()
        .find(|&own| board.point_for(direction, own).is_some_and(|p| p.count_of(color) > 0))
}
