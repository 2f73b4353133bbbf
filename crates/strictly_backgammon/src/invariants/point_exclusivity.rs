//! Blocking rule: a point never holds both colors.

use super::Invariant;
use crate::board::{Board, CheckerContainer};
use crate::game::GameCore;

/// Invariant: every point is empty or single-colored, and each holding
/// (bar, off) only contains checkers of the color moving in its direction.
pub struct PointExclusivityInvariant;

impl Invariant<Board> for PointExclusivityInvariant {
    fn holds(board: &Board) -> bool {
        let points = board.points().iter().all(|point| {
            point
                .top()
                .is_none_or(|top| point.count_of(top.color()) == point.count())
        });
        let holdings = board.checkers().all(|checker| match checker.container() {
            crate::board::ContainerId::Point { .. } => true,
            crate::board::ContainerId::Bar { direction }
            | crate::board::ContainerId::Off { direction } => {
                board.color_moving(direction) == checker.color()
            }
        });
        points && holdings
    }

    fn description() -> &'static str {
        "No point holds checkers of both colors"
    }
}

impl Invariant<GameCore> for PointExclusivityInvariant {
    fn holds(core: &GameCore) -> bool {
        <Self as Invariant<Board>>::holds(core.board())
    }

    fn description() -> &'static str {
        <Self as Invariant<Board>>::description()
    }
}
