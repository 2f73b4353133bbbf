//! Single-die moves: skeletons, resolutions and the move state machine.

use crate::board::{Board, CheckerContainer, ContainerId};
use crate::error::{GammonError, IllegalMoveReason};
use crate::types::{Color, DieValue, Direction};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Kind of checker movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MoveKind {
    /// The die could not be played.
    NoMove,
    /// Point to point.
    PointToPoint,
    /// Bar to point.
    Reenter,
    /// Point to off tray.
    BearOff,
}

/// A legal origin/destination pair for one die.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new,
)]
#[serde(rename_all = "camelCase")]
pub struct MoveSkeleton {
    /// Die consumed by the move.
    pub die_value: DieValue,
    /// Direction of the mover.
    pub direction: Direction,
    /// Where the checker starts.
    pub origin: ContainerId,
    /// Where the checker lands.
    pub destination: ContainerId,
}

impl MoveSkeleton {
    /// Kind of movement the skeleton describes.
    pub fn kind(&self) -> MoveKind {
        match (self.origin, self.destination) {
            (ContainerId::Bar { .. }, _) => MoveKind::Reenter,
            (_, ContainerId::Off { .. }) => MoveKind::BearOff,
            _ => MoveKind::PointToPoint,
        }
    }
}

impl std::fmt::Display for MoveSkeleton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} ({})", self.origin, self.destination, self.die_value)
    }
}

/// How a die was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "kebab-case")]
pub enum Resolution {
    /// No legal move existed, or the die was forfeited.
    NoMove,
    /// A checker moved.
    #[serde(rename_all = "camelCase")]
    Moved {
        /// The move made.
        skeleton: MoveSkeleton,
        /// Whether an opposing blot was sent to the bar.
        is_hit: bool,
    },
}

impl Resolution {
    /// Kind of movement.
    pub fn kind(&self) -> MoveKind {
        match self {
            Resolution::NoMove => MoveKind::NoMove,
            Resolution::Moved { skeleton, .. } => skeleton.kind(),
        }
    }
}

/// State tag of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MoveStateKind {
    /// Waiting for an origin.
    Ready,
    /// Origin chosen, not yet applied.
    InProgress,
    /// Applied or resolved as no-move.
    Completed,
    /// Committed by the player.
    Confirmed,
}

/// State of a move with its state-specific data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "stateKind", rename_all = "kebab-case")]
pub enum MoveState {
    /// Waiting for an origin.
    Ready,
    /// Origin chosen, not yet applied.
    InProgress {
        /// The selected move.
        skeleton: MoveSkeleton,
    },
    /// Applied or resolved as no-move.
    Completed {
        /// Outcome.
        resolution: Resolution,
    },
    /// Committed by the player.
    Confirmed {
        /// Outcome.
        resolution: Resolution,
    },
}

impl MoveState {
    /// Returns the state tag.
    pub fn kind(&self) -> MoveStateKind {
        match self {
            MoveState::Ready => MoveStateKind::Ready,
            MoveState::InProgress { .. } => MoveStateKind::InProgress,
            MoveState::Completed { .. } => MoveStateKind::Completed,
            MoveState::Confirmed { .. } => MoveStateKind::Confirmed,
        }
    }
}

/// Board and move after applying a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// Board after the move (or the preview, for a dry run).
    pub board: Board,
    /// The move in its new state.
    pub mv: Move,
}

/// One die's worth of action within a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    id: Uuid,
    color: Color,
    direction: Direction,
    die_value: DieValue,
    possible_moves: Vec<MoveSkeleton>,
    state: MoveState,
}

impl Move {
    /// Creates a ready move with its legal skeletons computed against `board`.
    pub fn ready(board: &Board, color: Color, die_value: DieValue) -> Self {
        Self {
            id: Uuid::new_v4(),
            color,
            direction: board.direction_of(color),
            die_value,
            possible_moves: board.possible_moves(color, die_value),
            state: MoveState::Ready,
        }
    }

    /// Move id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Moving color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Moving direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Die this move consumes.
    pub fn die_value(&self) -> DieValue {
        self.die_value
    }

    /// Legal skeletons, as of the last refresh.
    pub fn possible_moves(&self) -> &[MoveSkeleton] {
        &self.possible_moves
    }

    /// Current state.
    pub fn state(&self) -> &MoveState {
        &self.state
    }

    /// Whether the move is waiting for an origin.
    pub fn is_ready(&self) -> bool {
        self.state == MoveState::Ready
    }

    /// Whether the die has been used or forfeited.
    pub fn is_resolved(&self) -> bool {
        self.resolution().is_some()
    }

    /// Outcome, once completed or confirmed.
    pub fn resolution(&self) -> Option<Resolution> {
        match self.state {
            MoveState::Completed { resolution } | MoveState::Confirmed { resolution } => {
                Some(resolution)
            }
            _ => None,
        }
    }

    /// Kind of movement, once resolved.
    pub fn kind(&self) -> Option<MoveKind> {
        self.resolution().map(|r| r.kind())
    }

    /// Origin, when a checker moved or is about to.
    pub fn origin(&self) -> Option<ContainerId> {
        self.skeleton().map(|s| s.origin)
    }

    /// Destination, when a checker moved or is about to.
    pub fn destination(&self) -> Option<ContainerId> {
        self.skeleton().map(|s| s.destination)
    }

    /// Whether the move hit an opposing blot.
    pub fn is_hit(&self) -> bool {
        matches!(self.resolution(), Some(Resolution::Moved { is_hit: true, .. }))
    }

    fn skeleton(&self) -> Option<MoveSkeleton> {
        match self.state {
            MoveState::InProgress { skeleton } => Some(skeleton),
            MoveState::Completed {
                resolution: Resolution::Moved { skeleton, .. },
            }
            | MoveState::Confirmed {
                resolution: Resolution::Moved { skeleton, .. },
            } => Some(skeleton),
            _ => None,
        }
    }

    fn wrong_state(&self, operation: &'static str, expected: &str) -> GammonError {
        GammonError::illegal_transition("move", operation, self.state.kind(), expected)
    }

    /// Recomputes the legal skeletons of a ready move against a new board.
    pub(crate) fn refresh(&mut self, board: &Board) {
        if self.is_ready() {
            self.possible_moves = board.possible_moves(self.color, self.die_value);
        }
    }

    /// Skeleton this move can play from `origin`.
    pub fn skeleton_from(&self, origin: ContainerId) -> Option<MoveSkeleton> {
        self.possible_moves.iter().copied().find(|s| s.origin == origin)
    }

    /// Selects an origin, moving the ready move in progress.
    pub fn begin(&self, origin: ContainerId) -> Result<Move, GammonError> {
        if !self.is_ready() {
            return Err(self.wrong_state("begin", "ready"));
        }
        let skeleton = self
            .skeleton_from(origin)
            .ok_or(IllegalMoveReason::NoLegalMoveFrom(origin))?;
        Ok(Move {
            state: MoveState::InProgress { skeleton },
            ..self.clone()
        })
    }

    /// Drops an in-progress selection, returning the move to ready.
    pub fn cancel(&self) -> Result<Move, GammonError> {
        match self.state {
            MoveState::InProgress { .. } => Ok(Move {
                state: MoveState::Ready,
                ..self.clone()
            }),
            _ => Err(self.wrong_state("cancel", "in-progress")),
        }
    }

    /// Applies the selected skeleton to `board`.
    #[instrument(skip(self, board), fields(die = %self.die_value, color = %self.color))]
    pub fn complete(&self, board: &Board) -> Result<MoveResult, GammonError> {
        let MoveState::InProgress { skeleton } = self.state else {
            return Err(self.wrong_state("complete", "in-progress"));
        };
        let is_hit = board
            .container(skeleton.destination)
            .is_some_and(|c| c.count_of(self.color.opponent()) == 1);
        let next = board.move_checker(skeleton.origin, skeleton.destination, skeleton.direction)?;
        debug!(skeleton = %skeleton, is_hit, "Move completed");
        Ok(MoveResult {
            board: next,
            mv: Move {
                state: MoveState::Completed {
                    resolution: Resolution::Moved { skeleton, is_hit },
                },
                ..self.clone()
            },
        })
    }

    /// Moves the checker at `origin` with this die.
    ///
    /// A dry run returns the board the move would produce and leaves the
    /// move ready; `board` is never modified either way. Applying a move
    /// that is no longer ready fails.
    #[instrument(skip(self, board), fields(die = %self.die_value, origin = %origin))]
    pub fn apply(
        &self,
        board: &Board,
        origin: ContainerId,
        dry_run: bool,
    ) -> Result<MoveResult, GammonError> {
        let result = self.begin(origin)?.complete(board)?;
        if dry_run {
            Ok(MoveResult {
                board: result.board,
                mv: self.clone(),
            })
        } else {
            Ok(result)
        }
    }

    /// Resolves a ready move whose die has no legal skeleton.
    pub fn resolve_no_move(&self) -> Result<Move, GammonError> {
        if !self.is_ready() {
            return Err(self.wrong_state("resolve as no-move", "ready"));
        }
        if !self.possible_moves.is_empty() {
            return Err(GammonError::invariant(format!(
                "die {} still has {} legal moves",
                self.die_value,
                self.possible_moves.len()
            )));
        }
        Ok(self.forfeited())
    }

    /// Gives up the die regardless of legal skeletons (timeouts, auto-pass).
    pub fn forfeit(&self) -> Result<Move, GammonError> {
        match self.state {
            MoveState::Ready => Ok(self.forfeited()),
            MoveState::InProgress { .. } => Ok(self.cancel()?.forfeited()),
            _ => Err(self.wrong_state("forfeit", "ready or in-progress")),
        }
    }

    fn forfeited(&self) -> Move {
        Move {
            state: MoveState::Completed {
                resolution: Resolution::NoMove,
            },
            ..self.clone()
        }
    }

    /// Commits the move. An in-progress move is applied first.
    #[instrument(skip(self, board), fields(die = %self.die_value))]
    pub fn confirm(&self, board: &Board) -> Result<MoveResult, GammonError> {
        let completed = match self.state {
            MoveState::InProgress { .. } => self.complete(board)?,
            MoveState::Completed { .. } => MoveResult {
                board: board.clone(),
                mv: self.clone(),
            },
            _ => return Err(self.wrong_state("confirm", "in-progress or completed")),
        };
        let Some(resolution) = completed.mv.resolution() else {
            return Err(GammonError::invariant("completed move has no resolution"));
        };
        Ok(MoveResult {
            board: completed.board,
            mv: Move {
                state: MoveState::Confirmed { resolution },
                ..completed.mv
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardImportEntry;

    fn die(value: u8) -> DieValue {
        DieValue::new(value).unwrap()
    }

    #[test]
    fn dry_run_leaves_move_ready() {
        let board = Board::initialize();
        let mv = Move::ready(&board, Color::Black, die(6));
        let preview = mv.apply(&board, ContainerId::point(24), true).unwrap();
        assert!(preview.mv.is_ready());
        assert_eq!(preview.board.point(18).unwrap().count(), 1);
        assert_eq!(board, Board::initialize());
    }

    #[test]
    fn applying_twice_fails() {
        let board = Board::initialize();
        let mv = Move::ready(&board, Color::Black, die(6));
        let first = mv.apply(&board, ContainerId::point(24), false).unwrap();
        assert_eq!(first.mv.kind(), Some(MoveKind::PointToPoint));
        let err = first.mv.apply(&first.board, ContainerId::point(24), false).unwrap_err();
        assert!(matches!(err, GammonError::IllegalTransition { .. }));
    }

    #[test]
    fn records_hits() {
        let board = Board::build(
            &[
                BoardImportEntry::point(13, Color::Black, 2),
                BoardImportEntry::point(9, Color::White, 1),
            ],
            Direction::Clockwise,
        )
        .unwrap();
        let mv = Move::ready(&board, Color::Black, die(4));
        let result = mv.apply(&board, ContainerId::point(13), false).unwrap();
        assert!(result.mv.is_hit());
        assert_eq!(result.mv.destination(), Some(ContainerId::point(9)));
        assert_eq!(result.board.bar_count(Color::White), 1);
    }

    #[test]
    fn illegal_origin_is_rejected() {
        let board = Board::initialize();
        let mv = Move::ready(&board, Color::Black, die(5));
        let err = mv.apply(&board, ContainerId::point(24), false).unwrap_err();
        assert_eq!(
            err,
            GammonError::IllegalMove(IllegalMoveReason::NoLegalMoveFrom(ContainerId::point(24)))
        );
    }

    #[test]
    fn no_move_resolution_has_no_endpoints() {
        let board = Board::build(
            &[
                BoardImportEntry::bar(Color::Black, 1),
                BoardImportEntry::point(20, Color::White, 2),
            ],
            Direction::Clockwise,
        )
        .unwrap();
        let mv = Move::ready(&board, Color::Black, die(5));
        let resolved = mv.resolve_no_move().unwrap();
        assert_eq!(resolved.kind(), Some(MoveKind::NoMove));
        assert_eq!(resolved.origin(), None);
        assert_eq!(resolved.destination(), None);
    }

    #[test]
    fn confirm_applies_in_progress_move() {
        let board = Board::initialize();
        let mv = Move::ready(&board, Color::Black, die(1))
            .begin(ContainerId::point(6))
            .unwrap();
        let confirmed = mv.confirm(&board).unwrap();
        assert_eq!(confirmed.mv.state().kind(), MoveStateKind::Confirmed);
        assert_eq!(confirmed.board.point(5).unwrap().count(), 1);
        assert!(confirmed.mv.confirm(&confirmed.board).is_err());
    }
}
