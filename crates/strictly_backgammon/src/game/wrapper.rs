//! Serializable wrapper over every game phase.

use super::core::GameCore;
use super::phases::{
    Completed, Doubled, Doubling, GameStateKind, Moved, Moving, Outcome, PreparingMove,
    RolledForStart, Rolled, Rolling, RollingForStart,
};
use super::typestate::{Game, MoveTransition, StartTransition, TurnTransition};
use crate::board::{Board, ContainerId};
use crate::cube::Cube;
use crate::dice::DieRoller;
use crate::error::{GammonError, IllegalMoveReason};
use crate::play::Play;
use crate::types::{Color, DieValue};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// What happens to a player who fails to act in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TimeoutAction {
    /// Forfeit the remaining dice and end the turn.
    AutoPass,
    /// Lose the game.
    Resign,
}

/// A game in any phase.
///
/// Typestate games cannot be stored in one collection or sent over the
/// wire, so this enum wraps them. Its transition methods borrow the game
/// and return a new one; on error the original is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stateKind", rename_all = "kebab-case")]
pub enum AnyGame {
    /// Opening roll pending.
    RollingForStart(Game<RollingForStart>),
    /// Opening roll decided.
    RolledForStart(Game<RolledForStart>),
    /// Active player about to roll.
    Rolling(Game<Rolling>),
    /// Turn roll available.
    Rolled(Game<Rolled>),
    /// Origin selection open.
    PreparingMove(Game<PreparingMove>),
    /// Double offered.
    Doubling(Game<Doubling>),
    /// Double accepted.
    Doubled(Game<Doubled>),
    /// Checkers moving.
    Moving(Game<Moving>),
    /// Turn resolved.
    Moved(Game<Moved>),
    /// Game over.
    Completed(Game<Completed>),
}

macro_rules! any_game_from {
    ($($phase:ident),*) => {$(
        impl From<Game<$phase>> for AnyGame {
            fn from(game: Game<$phase>) -> Self {
                AnyGame::$phase(game)
            }
        }
    )*};
}

any_game_from!(
    RollingForStart,
    RolledForStart,
    Rolling,
    Rolled,
    PreparingMove,
    Doubling,
    Doubled,
    Moving,
    Moved,
    Completed
);

impl From<StartTransition> for AnyGame {
    fn from(result: StartTransition) -> Self {
        match result {
            StartTransition::Tied(g) => g.into(),
            StartTransition::Started(g) => g.into(),
        }
    }
}

impl From<MoveTransition> for AnyGame {
    fn from(result: MoveTransition) -> Self {
        match result {
            MoveTransition::Moving(g) => g.into(),
            MoveTransition::Moved(g) => g.into(),
        }
    }
}

impl From<TurnTransition> for AnyGame {
    fn from(result: TurnTransition) -> Self {
        match result {
            TurnTransition::NextTurn(g) => g.into(),
            TurnTransition::Won(g) => g.into(),
        }
    }
}

/// Runs the same expression against whichever game is wrapped.
macro_rules! each_phase {
    ($value:expr, $game:ident => $body:expr) => {
        match $value {
            AnyGame::RollingForStart($game) => $body,
            AnyGame::RolledForStart($game) => $body,
            AnyGame::Rolling($game) => $body,
            AnyGame::Rolled($game) => $body,
            AnyGame::PreparingMove($game) => $body,
            AnyGame::Doubling($game) => $body,
            AnyGame::Doubled($game) => $body,
            AnyGame::Moving($game) => $body,
            AnyGame::Moved($game) => $body,
            AnyGame::Completed($game) => $body,
        }
    };
}

impl AnyGame {
    // ── accessors ─────────────────────────────────────────────

    /// Shared state.
    pub fn core(&self) -> &GameCore {
        each_phase!(self, g => g.core())
    }

    /// State tag.
    pub fn kind(&self) -> GameStateKind {
        each_phase!(self, g => g.kind())
    }

    /// Checker layout.
    pub fn board(&self) -> &Board {
        &self.core().board
    }

    /// Doubling cube.
    pub fn cube(&self) -> &Cube {
        &self.core().cube
    }

    /// Color whose turn it is.
    pub fn active_color(&self) -> Option<Color> {
        each_phase!(self, g => g.active_color())
    }

    /// Turn in progress.
    pub fn active_play(&self) -> Option<&Play> {
        each_phase!(self, g => g.active_play())
    }

    /// Outcome, once the game is over.
    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            AnyGame::Completed(g) => Some(g.outcome()),
            _ => None,
        }
    }

    /// Winner, once the game is over.
    pub fn winner(&self) -> Option<Color> {
        self.outcome().map(|o| o.winner)
    }

    /// Whether the game has ended.
    pub fn is_over(&self) -> bool {
        matches!(self, AnyGame::Completed(_))
    }

    /// Position id with the active color on roll.
    pub fn position_id(&self) -> String {
        each_phase!(self, g => g.position_id())
    }

    /// Color whose clock is running.
    pub fn on_the_clock(&self) -> Option<Color> {
        match self {
            AnyGame::Doubling(g) => g.active_color().map(Color::opponent),
            _ => self.active_color(),
        }
    }

    fn mismatch(&self, operation: &'static str, expected: &str) -> GammonError {
        warn!(state = %self.kind(), operation, "Rejected transition");
        GammonError::illegal_transition("game", operation, self.kind(), expected)
    }

    // ── transitions ───────────────────────────────────────────

    /// Opening roll.
    pub fn roll_for_start<R: DieRoller + ?Sized>(&self, roller: &mut R) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::RollingForStart(g) => Ok(g.clone().roll_for_start(roller)?.into()),
            _ => Err(self.mismatch("roll for start", "rolling-for-start")),
        }
    }

    /// Turn roll.
    pub fn roll<R: DieRoller + ?Sized>(&self, roller: &mut R) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::RolledForStart(g) => Ok(g.clone().roll(roller)?.into()),
            AnyGame::Rolling(g) => Ok(g.clone().roll(roller)?.into()),
            _ => Err(self.mismatch("roll", "rolled-for-start or rolling")),
        }
    }

    /// Opens origin selection.
    pub fn prepare_move(&self) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::Rolled(g) => Ok(g.clone().prepare_move().into()),
            _ => Err(self.mismatch("prepare move", "rolled")),
        }
    }

    /// Swaps the order of the rolled dice.
    pub fn switch_dice(&self) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::Rolled(g) => Ok(g.clone().switch_dice()?.into()),
            AnyGame::PreparingMove(g) => Ok(g.clone().switch_dice()?.into()),
            _ => Err(self.mismatch("switch dice", "rolled or preparing-move")),
        }
    }

    /// Offers a double before any checker has moved.
    pub fn offer_double(&self) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::Rolled(g) => Ok(g.clone().prepare_move().to_doubling()?.into()),
            AnyGame::PreparingMove(g) => Ok(g.clone().to_doubling()?.into()),
            _ => Err(self.mismatch("offer double", "rolled or preparing-move")),
        }
    }

    /// Takes an offered double.
    pub fn accept_double(&self) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::Doubling(g) => Ok(g.clone().accept_double()?.into()),
            _ => Err(self.mismatch("accept double", "doubling")),
        }
    }

    /// Passes on an offered double, ending the game.
    pub fn decline_double(&self) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::Doubling(g) => Ok(g.clone().decline_double()?.into()),
            _ => Err(self.mismatch("decline double", "doubling")),
        }
    }

    /// Enters the moving phase.
    pub fn to_moving(&self) -> Result<AnyGame, GammonError> {
        self.moving_transition("start moving").map(AnyGame::from)
    }

    fn moving_transition(&self, operation: &'static str) -> Result<MoveTransition, GammonError> {
        match self {
            AnyGame::Rolled(g) => g.clone().prepare_move().to_moving(),
            AnyGame::PreparingMove(g) => g.clone().to_moving(),
            AnyGame::Doubled(g) => g.clone().to_moving(),
            AnyGame::Moving(g) => Ok(MoveTransition::Moving(g.clone())),
            _ => Err(self.mismatch(operation, "rolled, preparing-move, doubled or moving")),
        }
    }

    /// Moves one checker, entering the moving phase first if needed.
    #[instrument(skip(self), fields(state = %self.kind()))]
    pub fn move_checker(&self, origin: ContainerId, die: Option<DieValue>) -> Result<AnyGame, GammonError> {
        match self.moving_transition("move checker")? {
            MoveTransition::Moving(g) => Ok(g.move_checker(origin, die)?.into()),
            MoveTransition::Moved(_) => Err(IllegalMoveReason::NoLegalMoveFrom(origin).into()),
        }
    }

    /// Takes back the last checker moved this turn.
    pub fn undo(&self) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::Moving(g) => Ok(g.clone().undo()?.into()),
            AnyGame::Moved(g) => Ok(g.clone().undo()?.into()),
            _ => Err(self.mismatch("undo", "moving or moved")),
        }
    }

    /// Forfeits every unused die, leaving the turn ready to confirm.
    pub fn auto_pass(&self) -> Result<AnyGame, GammonError> {
        if let AnyGame::Moved(_) = self {
            return Ok(self.clone());
        }
        match self.moving_transition("auto-pass")? {
            MoveTransition::Moving(g) => Ok(g.auto_pass()?.into()),
            MoveTransition::Moved(g) => Ok(g.into()),
        }
    }

    /// Ends the turn.
    pub fn confirm_turn(&self) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::Moved(g) => Ok(g.clone().confirm_turn()?.into()),
            _ => Err(self.mismatch("confirm turn", "moved")),
        }
    }

    /// `color` concedes the game.
    pub fn resign(&self, color: Color) -> Result<AnyGame, GammonError> {
        match self {
            AnyGame::Completed(_) => Err(self.mismatch("resign", "a game in progress")),
            AnyGame::RollingForStart(g) => Ok(g.clone().resign(color)?.into()),
            AnyGame::RolledForStart(g) => Ok(g.clone().resign(color)?.into()),
            AnyGame::Rolling(g) => Ok(g.clone().resign(color)?.into()),
            AnyGame::Rolled(g) => Ok(g.clone().resign(color)?.into()),
            AnyGame::PreparingMove(g) => Ok(g.clone().resign(color)?.into()),
            AnyGame::Doubling(g) => Ok(g.clone().resign(color)?.into()),
            AnyGame::Doubled(g) => Ok(g.clone().resign(color)?.into()),
            AnyGame::Moving(g) => Ok(g.clone().resign(color)?.into()),
            AnyGame::Moved(g) => Ok(g.clone().resign(color)?.into()),
        }
    }

    /// Applies the forced transition for a player who ran out of time.
    ///
    /// `AutoPass` forfeits the remaining dice and ends the turn; a player who
    /// times out while answering a double passes it. `Resign` loses the game
    /// at the current stake.
    ///
    /// Only the player on the clock can time out: the mover, or the taker
    /// while a double awaits an answer. Before the opening roll either
    /// player may.
    #[instrument(skip(self), fields(state = %self.kind()))]
    pub fn timeout(&self, color: Color, action: TimeoutAction) -> Result<AnyGame, GammonError> {
        if self.on_the_clock().is_some_and(|due| due != color) {
            warn!(%color, "Timeout named a player who is not on the clock");
            return Err(IllegalMoveReason::NotYourTurn(color).into());
        }
        match action {
            TimeoutAction::Resign => match self {
                AnyGame::Completed(_) => Err(self.mismatch("time out", "a game in progress")),
                AnyGame::RollingForStart(g) => Ok(g.clone().time_out(color)?.into()),
                AnyGame::RolledForStart(g) => Ok(g.clone().time_out(color)?.into()),
                AnyGame::Rolling(g) => Ok(g.clone().time_out(color)?.into()),
                AnyGame::Rolled(g) => Ok(g.clone().time_out(color)?.into()),
                AnyGame::PreparingMove(g) => Ok(g.clone().time_out(color)?.into()),
                AnyGame::Doubling(g) => Ok(g.clone().time_out(color)?.into()),
                AnyGame::Doubled(g) => Ok(g.clone().time_out(color)?.into()),
                AnyGame::Moving(g) => Ok(g.clone().time_out(color)?.into()),
                AnyGame::Moved(g) => Ok(g.clone().time_out(color)?.into()),
            },
            TimeoutAction::AutoPass => match self {
                AnyGame::Doubling(_) => self.decline_double(),
                AnyGame::Rolled(_)
                | AnyGame::PreparingMove(_)
                | AnyGame::Doubled(_)
                | AnyGame::Moving(_)
                | AnyGame::Moved(_) => self.auto_pass()?.confirm_turn(),
                _ => Err(self.mismatch("auto-pass", "a turn in progress")),
            },
        }
    }
}
