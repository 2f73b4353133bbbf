//! Single-die move generation.

use super::bear_off::{can_bear_off, highest_occupied};
use crate::action::MoveSkeleton;
use crate::board::{Board, CheckerContainer, ContainerId};
use crate::error::IllegalMoveReason;
use crate::types::{BAR_POSITION, Color, DieValue, POINT_COUNT};
use tracing::{debug, instrument};

/// Every legal move of one checker of `color` by `die`.
///
/// Checkers on the bar must re-enter before anything else moves, so only
/// bar-origin moves are returned while the bar is occupied. Bearing off
/// requires the whole army home; an exact roll bears off from its point and
/// a larger roll only from the farthest occupied point.
///
/// Moves are listed from the farthest origin inward.
#[instrument(skip(board), fields(color = %color, die = %die))]
pub fn possible_moves(board: &Board, color: Color, die: DieValue) -> Vec<MoveSkeleton> {
    let direction = board.direction_of(color);

    if board.bar(direction).count_of(color) > 0 {
        let target = BAR_POSITION - die.get();
        let entry = board
            .point_for(direction, target)
            .filter(|p| p.is_open_for(color))
            .map(|p| MoveSkeleton::new(die, direction, ContainerId::bar(direction), p.id()));
        debug!(entering = entry.is_some(), "Bar checker must re-enter");
        return entry.into_iter().collect();
    }

    let bearing_off = can_bear_off(board, color);
    let farthest = highest_occupied(board, color);
    let mut moves = Vec::new();

    for own in (1..=POINT_COUNT).rev() {
        let Some(origin) = board.point_for(direction, own) else {
            continue;
        };
        if origin.count_of(color) == 0 {
            continue;
        }

        if own > die.get() {
            let landing = board
                .point_for(direction, own - die.get())
                .filter(|p| p.is_open_for(color));
            if let Some(landing) = landing {
                moves.push(MoveSkeleton::new(die, direction, origin.id(), landing.id()));
            }
        } else if bearing_off && (own == die.get() || Some(own) == farthest) {
            moves.push(MoveSkeleton::new(
                die,
                direction,
                origin.id(),
                ContainerId::off(direction),
            ));
        }
    }

    debug!(count = moves.len(), "Generated moves");
    moves
}

/// Why the checker of `color` at `origin` cannot move by `die`, when the
/// board pins it on a closed point or a premature bear-off.
///
/// Returns `None` when `origin` holds no checker of `color` or when the move
/// fails for some other reason.
pub fn blocked_reason(
    board: &Board,
    color: Color,
    die: DieValue,
    origin: ContainerId,
) -> Option<IllegalMoveReason> {
    let direction = board.direction_of(color);
    let holds_checker = board
        .container(origin)
        .is_some_and(|c| c.count_of(color) > 0);
    if !holds_checker || origin == ContainerId::off(direction) {
        return None;
    }
    let own = origin.own_position(direction);
    if own > die.get() {
        board
            .point_for(direction, own - die.get())
            .filter(|p| !p.is_open_for(color))
            .map(|p| IllegalMoveReason::PointBlocked(p.id()))
    } else if !can_bear_off(board, color) {
        Some(IllegalMoveReason::BearOffNotAllowed)
    } else {
        None
    }
}
