//! Error types for the backgammon engine.

use crate::board::ContainerId;
use crate::types::{Color, DieValue};
use uuid::Uuid;

/// Errors raised by engine operations.
///
/// `IllegalTransition` and `IllegalMove` are ordinary user-facing rejections.
/// `InvariantViolation` means the value that produced it is corrupt and must
/// be discarded. `Encoding` covers malformed imports, snapshots and ids.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GammonError {
    /// Operation invoked on a value whose state does not permit it.
    #[display(
        "Illegal transition: cannot {} {} in state '{}' (expected {})",
        operation,
        entity,
        actual,
        expected
    )]
    IllegalTransition {
        /// Kind of value (game, play, move, player, dice, cube).
        entity: &'static str,
        /// Operation that was attempted.
        operation: &'static str,
        /// State the value was actually in.
        actual: String,
        /// State(s) the operation requires.
        expected: String,
    },

    /// Requested action breaks a rule of play.
    #[display("Illegal move: {}", _0)]
    IllegalMove(IllegalMoveReason),

    /// Internal consistency check failed.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),

    /// Import, snapshot or position id could not be read or written.
    #[display("Encoding error: {}", _0)]
    Encoding(String),
}

impl std::error::Error for GammonError {}

impl GammonError {
    /// Creates an illegal-transition error.
    pub fn illegal_transition(
        entity: &'static str,
        operation: &'static str,
        actual: impl ToString,
        expected: impl ToString,
    ) -> Self {
        Self::IllegalTransition {
            entity,
            operation,
            actual: actual.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Creates an invariant violation tagged with the caller's location.
    #[track_caller]
    pub fn invariant(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self::InvariantViolation(format!(
            "{} at {}:{}",
            message.into(),
            location.file(),
            location.line()
        ))
    }

    /// Creates an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Whether the caller may present the error and carry on with the same value.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::IllegalTransition { .. } | Self::IllegalMove(_))
    }
}

impl From<IllegalMoveReason> for GammonError {
    fn from(reason: IllegalMoveReason) -> Self {
        Self::IllegalMove(reason)
    }
}

impl From<serde_json::Error> for GammonError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<base64::DecodeError> for GammonError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Encoding(format!("position id is not valid base64: {}", err))
    }
}

/// Why a requested action breaks the rules.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum IllegalMoveReason {
    /// The acting color is not the one on turn.
    #[display("it is not {}'s turn", _0)]
    NotYourTurn(Color),
    /// The origin holds no checker of the mover's color.
    #[display("no {} checker at {}", _0, _1)]
    NoCheckerAtOrigin(Color, ContainerId),
    /// Checkers on the bar must re-enter before anything else moves.
    #[display("checkers on the bar must re-enter first")]
    MustReenterFromBar,
    /// Destination holds two or more opposing checkers.
    #[display("{} is blocked", _0)]
    PointBlocked(ContainerId),
    /// Bearing off before every checker is home.
    #[display("cannot bear off until every checker is home")]
    BearOffNotAllowed,
    /// No unresolved die can move the checker at the origin.
    #[display("no legal move from {} with any remaining die", _0)]
    NoLegalMoveFrom(ContainerId),
    /// The requested die has already been used or was never rolled.
    #[display("no unused die shows {}", _0)]
    DieUnavailable(DieValue),
    /// A move is already selected and not yet resolved.
    #[display("a move is already in progress")]
    MoveInFlight,
    /// The turn still has dice to play.
    #[display("the turn still has unresolved dice")]
    TurnIncomplete,
    /// Nothing has been moved this turn.
    #[display("nothing to undo this turn")]
    NothingToUndo,
    /// The game was configured without undo.
    #[display("undo is disabled for this game")]
    UndoDisabled,
    /// The cube cannot go past 64.
    #[display("the cube is already at 64")]
    CubeMaxxed,
    /// Only the cube's owner may double.
    #[display("{} owns the cube", _0)]
    CubeOwnedByOpponent(Color),
    /// Message addressed to another game.
    #[display("message addressed to game {}", _0)]
    WrongGame(Uuid),
    /// Sender is not seated in the game.
    #[display("player {} is not seated in this game", _0)]
    UnknownPlayer(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_records_location() {
        let err = GammonError::invariant("checker count 29");
        let GammonError::InvariantViolation(message) = &err else {
            panic!("expected invariant violation, got {err:?}");
        };
        assert!(message.contains("checker count 29"));
        assert!(message.contains("error.rs"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn reasons_display_in_context() {
        let err: GammonError = IllegalMoveReason::CubeMaxxed.into();
        assert_eq!(err.to_string(), "Illegal move: the cube is already at 64");
        assert!(err.is_recoverable());
    }
}
