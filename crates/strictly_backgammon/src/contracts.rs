//! Contract-based validation for game transitions.
//!
//! Contracts formalize Hoare-style reasoning: {P} action {Q}. Preconditions
//! run on every call and reject illegal requests with a typed error;
//! postconditions run in debug builds and turn a broken invariant into an
//! `InvariantViolation`.

use crate::board::{CheckerContainer, ContainerId};
use crate::error::{GammonError, IllegalMoveReason};
use crate::game::{AnyGame, Game, GameCore, Moved, Moving};
use crate::invariants::{GameInvariants, Invariant, InvariantSet, MoveCountInvariant};
use crate::play::PlayState;
use crate::player::PlayerState;
use crate::types::DieValue;
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions of a transition.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), GammonError>;

    /// Checks postconditions against the state the action produced.
    fn post(before: &S, after: &GameCore) -> Result<(), GammonError>;
}

/// Checks every game invariant, folding violations into one error.
pub fn verify(core: &GameCore) -> Result<(), GammonError> {
    GameInvariants::check_all(core).map_err(|violations| {
        let descriptions = violations
            .iter()
            .map(|v| v.description.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        warn!(game = %core.id(), %descriptions, "Invariant check failed");
        GammonError::invariant(format!("Postcondition failed: {}", descriptions))
    })
}

// ─────────────────────────────────────────────────────────────
//  Move preconditions
// ─────────────────────────────────────────────────────────────

/// A request to move one checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// Where the checker starts.
    pub origin: ContainerId,
    /// Die to use; the first fitting die when absent.
    pub die: Option<DieValue>,
}

/// Precondition: the origin holds a checker of the mover.
pub struct CheckerAtOrigin;

impl CheckerAtOrigin {
    /// Checks the origin.
    pub fn check(request: &MoveRequest, game: &Game<Moving>) -> Result<(), GammonError> {
        let color = game.phase().active_color;
        let owned = match request.origin {
            ContainerId::Off { .. } => false,
            origin => game
                .board()
                .container(origin)
                .is_some_and(|c| c.count_of(color) > 0),
        };
        if owned {
            Ok(())
        } else {
            Err(IllegalMoveReason::NoCheckerAtOrigin(color, request.origin).into())
        }
    }
}

/// Precondition: checkers on the bar re-enter before anything else moves.
pub struct BarFirst;

impl BarFirst {
    /// Checks re-entry priority.
    pub fn check(request: &MoveRequest, game: &Game<Moving>) -> Result<(), GammonError> {
        let direction = game.play().direction();
        if request.origin != ContainerId::bar(direction) && !game.board().bar(direction).is_empty() {
            Err(IllegalMoveReason::MustReenterFromBar.into())
        } else {
            Ok(())
        }
    }
}

/// Precondition: a requested die is still unused.
pub struct DieAvailable;

impl DieAvailable {
    /// Checks the die.
    pub fn check(request: &MoveRequest, game: &Game<Moving>) -> Result<(), GammonError> {
        match request.die {
            Some(die) if !game.play().ready_moves().any(|m| m.die_value() == die) => {
                Err(IllegalMoveReason::DieUnavailable(die).into())
            }
            _ => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Move Contract
// ─────────────────────────────────────────────────────────────

/// Contract for moving one checker.
///
/// Preconditions:
/// - The origin holds a checker of the mover
/// - Bar checkers move first
/// - A requested die is unused
///
/// Postconditions:
/// - Game invariants hold
/// - The board changed
pub struct MoveContract;

impl Contract<Game<Moving>, MoveRequest> for MoveContract {
    #[instrument(skip(game))]
    fn pre(game: &Game<Moving>, request: &MoveRequest) -> Result<(), GammonError> {
        CheckerAtOrigin::check(request, game)?;
        BarFirst::check(request, game)?;
        DieAvailable::check(request, game)?;
        Ok(())
    }

    fn post(before: &Game<Moving>, after: &GameCore) -> Result<(), GammonError> {
        verify(after)?;
        if before.board() == after.board() {
            return Err(GammonError::invariant("move left the board unchanged"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Confirm-turn Contract
// ─────────────────────────────────────────────────────────────

/// Contract for ending a turn.
///
/// Preconditions:
/// - Every die is resolved
/// - The play obeys the move-count law
///
/// Postconditions:
/// - Game invariants hold
/// - Exactly one player is about to roll
pub struct ConfirmTurnContract;

impl Contract<Game<Moved>, ()> for ConfirmTurnContract {
    fn pre(game: &Game<Moved>, _: &()) -> Result<(), GammonError> {
        let play = game.play();
        if play.state() != PlayState::Moved || !play.is_complete() {
            return Err(IllegalMoveReason::TurnIncomplete.into());
        }
        if !MoveCountInvariant::holds(play) {
            return Err(GammonError::invariant(MoveCountInvariant::description()));
        }
        Ok(())
    }

    fn post(before: &Game<Moved>, after: &GameCore) -> Result<(), GammonError> {
        verify(after)?;
        let mover = before.phase().active_color;
        let rolling = after.player(mover.opponent()).state() == PlayerState::Rolling;
        let waiting = after.player(mover).state() == PlayerState::Inactive;
        if rolling && waiting {
            Ok(())
        } else {
            Err(GammonError::invariant("turn did not pass to the opponent"))
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Sanity check
// ─────────────────────────────────────────────────────────────

/// Returns the moving game if `game` is in the moving phase and consistent.
///
/// Checks the game invariants, that the active player is moving while the
/// other waits, that the play belongs to the active color and still has an
/// unresolved die, that the play obeys the move-count law, and that no
/// double is pending. Never panics and has no side effects.
pub fn sanity_check_moving_game(game: &AnyGame) -> Option<&Game<Moving>> {
    let AnyGame::Moving(moving) = game else {
        return None;
    };
    let color = moving.phase().active_color;
    let play = moving.play();
    let consistent = verify(moving.core()).is_ok()
        && moving.core().player(color).state() == PlayerState::Moving
        && moving.core().player(color.opponent()).state() == PlayerState::Inactive
        && play.color() == color
        && play.state() == PlayState::Moving
        && !play.is_complete()
        && MoveCountInvariant::holds(play)
        && moving.cube().offered_by().is_none();
    consistent.then_some(moving)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRoller;
    use crate::player::Player;
    use crate::types::{Color, Direction};

    fn moving() -> AnyGame {
        let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).unwrap();
        let game: AnyGame = Game::new(
            Player::new("black", Color::Black, Direction::Clockwise, false),
            Player::new("white", Color::White, Direction::Counterclockwise, false),
        )
        .unwrap()
        .into();
        game.roll_for_start(&mut roller)
            .unwrap()
            .roll(&mut roller)
            .unwrap()
            .to_moving()
            .unwrap()
    }

    #[test]
    fn moving_game_passes_sanity_check() {
        let game = moving();
        assert!(sanity_check_moving_game(&game).is_some());
        let passed = game.auto_pass().unwrap();
        assert!(sanity_check_moving_game(&passed).is_none());
    }

    #[test]
    fn empty_origin_is_rejected() {
        let game = moving();
        let Some(moving) = sanity_check_moving_game(&game) else {
            panic!("expected a moving game");
        };
        let request = MoveRequest {
            origin: ContainerId::point(20),
            die: None,
        };
        assert_eq!(
            MoveContract::pre(moving, &request),
            Err(GammonError::IllegalMove(IllegalMoveReason::NoCheckerAtOrigin(
                Color::Black,
                ContainerId::point(20)
            )))
        );
    }

    #[test]
    fn unknown_die_is_rejected() {
        let game = moving();
        let Some(moving) = sanity_check_moving_game(&game) else {
            panic!("expected a moving game");
        };
        let four = DieValue::new(4).unwrap();
        let request = MoveRequest {
            origin: ContainerId::point(24),
            die: Some(four),
        };
        assert_eq!(
            MoveContract::pre(moving, &request),
            Err(GammonError::IllegalMove(IllegalMoveReason::DieUnavailable(four)))
        );
    }
}
