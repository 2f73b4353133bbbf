//! The game as a typestate machine.
//!
//! `Game<S>` is parameterised by its phase. Every transition consumes the
//! game and returns the next phase (or a result enum when the next phase
//! depends on the dice or the board), so an operation that makes no sense in
//! the current phase does not exist on its type.

use super::core::{GameCore, GameSettings};
use super::phases::{
    CompletionReason, Completed, Doubled, Doubling, GameStateKind, Moved, Moving, Ongoing,
    Outcome, Phase, PreparingMove, RolledForStart, Rolled, Rolling, RollingForStart,
};
use crate::board::{Board, ContainerId};
use crate::contracts::{ConfirmTurnContract, Contract, MoveContract, MoveRequest, verify};
use crate::cube::Cube;
use crate::dice::DieRoller;
use crate::error::{GammonError, IllegalMoveReason};
use crate::play::{Play, PlayResult, PlayState};
use crate::player::{Player, PlayerState, Players};
use crate::position_id::position_id;
use crate::rules;
use crate::types::{Color, DieValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// A game in phase `S`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game<S> {
    pub(crate) core: GameCore,
    pub(crate) phase: S,
}

// ─────────────────────────────────────────────────────────────
//  Transition results
// ─────────────────────────────────────────────────────────────

/// Result of the opening roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartTransition {
    /// Both dice showed the same face; roll again.
    Tied(Game<RollingForStart>),
    /// The higher die moves first.
    Started(Game<RolledForStart>),
}

/// Result of entering the moving phase or moving a checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTransition {
    /// Dice remain.
    Moving(Game<Moving>),
    /// Every die is resolved.
    Moved(Game<Moved>),
}

/// Result of confirming a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnTransition {
    /// The opponent rolls next.
    NextTurn(Game<Rolling>),
    /// The mover bore off the last checker.
    Won(Game<Completed>),
}

// ─────────────────────────────────────────────────────────────
//  Any phase
// ─────────────────────────────────────────────────────────────

impl<S: Phase> Game<S> {
    /// Shared state.
    pub fn core(&self) -> &GameCore {
        &self.core
    }

    /// Phase data.
    pub fn phase(&self) -> &S {
        &self.phase
    }

    /// State tag.
    pub fn kind(&self) -> GameStateKind {
        S::KIND
    }

    /// Game id.
    pub fn id(&self) -> Uuid {
        self.core.id
    }

    /// Checker layout.
    pub fn board(&self) -> &Board {
        &self.core.board
    }

    /// Doubling cube.
    pub fn cube(&self) -> &Cube {
        &self.core.cube
    }

    /// Both seats.
    pub fn players(&self) -> &Players {
        &self.core.players
    }

    /// Color whose turn it is.
    pub fn active_color(&self) -> Option<Color> {
        self.phase.active_color()
    }

    /// Player whose turn it is.
    pub fn active_player(&self) -> Option<&Player> {
        self.active_color().map(|c| self.core.player(c))
    }

    /// Player waiting for the turn.
    pub fn inactive_player(&self) -> Option<&Player> {
        self.active_color().map(|c| self.core.player(c.opponent()))
    }

    /// Turn in progress.
    pub fn active_play(&self) -> Option<&Play> {
        self.phase.play()
    }

    /// Position id with the active color on roll (black before the opening roll).
    pub fn position_id(&self) -> String {
        position_id(&self.core.board, self.active_color().unwrap_or(Color::Black))
    }

    fn advance<T: Phase>(self, phase: T) -> Game<T> {
        let mut core = self.core;
        core.touch();
        debug!(from = %S::KIND, to = %T::KIND, "Game transition");
        Game { core, phase }
    }
}

impl<S: Ongoing> Game<S> {
    /// `color` concedes; the opponent wins at the current stake.
    #[instrument(skip(self), fields(game = %self.core.id, state = %S::KIND))]
    pub fn resign(self, color: Color) -> Result<Game<Completed>, GammonError> {
        self.finish(color.opponent(), CompletionReason::Resigned)
    }

    /// `color` ran out of time and loses at the current stake.
    pub fn time_out(self, color: Color) -> Result<Game<Completed>, GammonError> {
        self.finish(color.opponent(), CompletionReason::TimedOut)
    }

    fn finish(self, winner: Color, reason: CompletionReason) -> Result<Game<Completed>, GammonError> {
        let mut core = self.core.clone();
        if core.cube.offered_by().is_some() {
            core.cube = core.cube.withdraw()?;
        }
        core.players.update(winner, |p| Ok(p.to_winner()))?;
        core.players.update(winner.opponent(), |p| Ok(p.deactivate()))?;
        let outcome = Outcome {
            winner,
            reason,
            stake: core.cube.stake(),
        };
        info!(game = %core.id, %outcome, "Game completed");
        Ok(Game { core, phase: self.phase }.advance(Completed { outcome }))
    }
}

// ─────────────────────────────────────────────────────────────
//  Opening
// ─────────────────────────────────────────────────────────────

impl Game<RollingForStart> {
    /// Standard game between two fresh players.
    pub fn new(black: Player, white: Player) -> Result<Self, GammonError> {
        let board = Board::standard(black.direction());
        Self::setup(
            Players::new(black, white)?,
            board,
            Cube::new(),
            GameSettings::default(),
        )
    }

    /// Game from explicit parts; the board and cube may be mid-game.
    #[instrument(skip_all)]
    pub fn setup(
        players: Players,
        board: Board,
        cube: Cube,
        settings: GameSettings,
    ) -> Result<Self, GammonError> {
        let mut core = GameCore::new(players, board, cube, settings)?;
        verify(&core)?;
        for color in Color::ALL {
            core.players.update(color, Player::to_rolling_for_start)?;
        }
        info!(game = %core.id, "Game created");
        Ok(Game {
            core,
            phase: RollingForStart,
        })
    }

    /// Both players throw one die; the higher face moves first.
    #[instrument(skip(self, roller), fields(game = %self.core.id))]
    pub fn roll_for_start<R: DieRoller + ?Sized>(
        self,
        roller: &mut R,
    ) -> Result<StartTransition, GammonError> {
        let mut core = self.core.clone();
        for color in Color::ALL {
            core.players.update(color, |p| p.roll_for_start(roller))?;
        }
        let black = core.player(Color::Black).roll_for_start_value();
        let white = core.player(Color::White).roll_for_start_value();
        let (Some(black), Some(white)) = (black, white) else {
            return Err(GammonError::invariant("opening roll left a die blank"));
        };

        if black == white {
            info!(value = %black, "Opening roll tied");
            for color in Color::ALL {
                core.players.update(color, Player::to_rolling_for_start)?;
            }
            return Ok(StartTransition::Tied(Game {
                core,
                phase: RollingForStart,
            }));
        }

        let active_color = if black > white { Color::Black } else { Color::White };
        core.players.update(active_color.opponent(), Player::sit_out)?;
        info!(%active_color, %black, %white, "Opening roll decided");
        Ok(StartTransition::Started(
            Game { core, phase: self.phase }.advance(RolledForStart { active_color }),
        ))
    }
}

fn roll_turn<S: Phase, R: DieRoller + ?Sized>(
    game: Game<S>,
    active_color: Color,
    roller: &mut R,
) -> Result<Game<Rolled>, GammonError> {
    let mut core = game.core.clone();
    core.players
        .update(active_color, |p| p.to_rolling()?.roll(roller))?;
    let play = Play::initialize(&core.board, core.player(active_color))?;
    info!(color = %active_color, roll = %play.roll(), "Turn rolled");
    Ok(Game { core, phase: game.phase }.advance(Rolled { active_color, play }))
}

impl Game<RolledForStart> {
    /// The opening winner rolls both dice.
    #[instrument(skip(self, roller), fields(game = %self.core.id))]
    pub fn roll<R: DieRoller + ?Sized>(self, roller: &mut R) -> Result<Game<Rolled>, GammonError> {
        let color = self.phase.color();
        roll_turn(self, color, roller)
    }
}

impl Game<Rolling> {
    /// The active player rolls both dice.
    #[instrument(skip(self, roller), fields(game = %self.core.id))]
    pub fn roll<R: DieRoller + ?Sized>(self, roller: &mut R) -> Result<Game<Rolled>, GammonError> {
        let color = self.phase.color();
        roll_turn(self, color, roller)
    }
}

// ─────────────────────────────────────────────────────────────
//  Before the first checker moves
// ─────────────────────────────────────────────────────────────

/// Swaps the dice and rebuilds the turn from the new order.
fn switched(core: &GameCore, color: Color) -> Result<(GameCore, Play), GammonError> {
    let mut core = core.clone();
    core.players.update(color, Player::switch_dice)?;
    let play = Play::initialize(&core.board, core.player(color))?;
    core.touch();
    Ok((core, play))
}

fn begin_moving(
    mut core: GameCore,
    active_color: Color,
    play: Play,
) -> Result<MoveTransition, GammonError> {
    let play = play.to_moving()?;
    core.players.update(active_color, Player::to_moving)?;
    core.touch();
    if play.state() == PlayState::Moved {
        debug!(color = %active_color, "No legal moves this turn");
        core.players.update(active_color, Player::to_moved)?;
        return Ok(MoveTransition::Moved(Game {
            core,
            phase: Moved { active_color, play },
        }));
    }
    Ok(MoveTransition::Moving(Game {
        core,
        phase: Moving { active_color, play },
    }))
}

impl Game<Rolled> {
    /// The rolled turn.
    pub fn play(&self) -> &Play {
        &self.phase.play
    }

    /// Opens origin selection.
    pub fn prepare_move(self) -> Game<PreparingMove> {
        let phase = PreparingMove {
            active_color: self.phase.active_color,
            play: self.phase.play.clone(),
        };
        self.advance(phase)
    }

    /// Presents the roll in the other order.
    pub fn switch_dice(self) -> Result<Game<Rolled>, GammonError> {
        let active_color = self.phase.active_color;
        let (core, play) = switched(&self.core, active_color)?;
        Ok(Game {
            core,
            phase: Rolled { active_color, play },
        })
    }
}

impl Game<PreparingMove> {
    /// The rolled turn.
    pub fn play(&self) -> &Play {
        &self.phase.play
    }

    /// Presents the roll in the other order.
    pub fn switch_dice(self) -> Result<Game<PreparingMove>, GammonError> {
        let active_color = self.phase.active_color;
        let (core, play) = switched(&self.core, active_color)?;
        Ok(Game {
            core,
            phase: PreparingMove { active_color, play },
        })
    }

    /// Offers a double. The mover may not touch a checker until the
    /// opponent answers.
    #[instrument(skip(self), fields(game = %self.core.id, color = %self.phase.active_color))]
    pub fn to_doubling(self) -> Result<Game<Doubling>, GammonError> {
        let active_color = self.phase.active_color;
        let mut core = self.core.clone();
        core.cube = core
            .cube
            .offer(active_color, *core.settings.enforce_cube_ownership())?;
        core.players.update(active_color, Player::to_doubled)?;
        info!(stake = core.cube.stake(), "Double offered");
        let play = self.phase.play.clone();
        Ok(Game { core, phase: self.phase }.advance(Doubling { active_color, play }))
    }

    /// Starts moving checkers.
    pub fn to_moving(self) -> Result<MoveTransition, GammonError> {
        begin_moving(self.core, self.phase.active_color, self.phase.play)
    }
}

impl Game<Doubling> {
    /// Color that offered the double.
    pub fn offered_by(&self) -> Color {
        self.phase.active_color
    }

    /// The opponent takes: the cube turns and the offerer moves at the new stake.
    #[instrument(skip(self), fields(game = %self.core.id))]
    pub fn accept_double(self) -> Result<Game<Doubled>, GammonError> {
        let mut core = self.core.clone();
        core.cube = core.cube.accept()?;
        let phase = Doubled {
            active_color: self.phase.active_color,
            play: self.phase.play.clone(),
        };
        Ok(Game { core, phase: self.phase }.advance(phase))
    }

    /// The opponent passes: the offerer wins at the stake before the offer.
    #[instrument(skip(self), fields(game = %self.core.id))]
    pub fn decline_double(self) -> Result<Game<Completed>, GammonError> {
        let winner = self.phase.active_color;
        self.finish(winner, CompletionReason::DoubleDeclined)
    }
}

impl Game<Doubled> {
    /// Starts moving checkers at the new stake.
    pub fn to_moving(self) -> Result<MoveTransition, GammonError> {
        begin_moving(self.core, self.phase.active_color, self.phase.play)
    }
}

// ─────────────────────────────────────────────────────────────
//  Moving
// ─────────────────────────────────────────────────────────────

fn take_back(mut core: GameCore, active_color: Color, play: &Play) -> Result<Game<Moving>, GammonError> {
    if !*core.settings.allow_undo() {
        return Err(IllegalMoveReason::UndoDisabled.into());
    }
    let (play, board) = play.undo()?;
    core.board = board;
    core.refresh_pip_counts();
    if core.player(active_color).state() == PlayerState::Moved {
        core.players.update(active_color, Player::to_moving)?;
    }
    core.touch();
    info!(color = %active_color, depth = play.undo_depth(), "Move undone");
    Ok(Game {
        core,
        phase: Moving { active_color, play },
    })
}

impl Game<Moving> {
    /// The turn being played.
    pub fn play(&self) -> &Play {
        &self.phase.play
    }

    /// Moves the checker at `origin`, with `die` or the first die that fits.
    #[instrument(skip(self), fields(game = %self.core.id, color = %self.phase.active_color))]
    pub fn move_checker(
        self,
        origin: ContainerId,
        die: Option<DieValue>,
    ) -> Result<MoveTransition, GammonError> {
        let request = MoveRequest { origin, die };
        MoveContract::pre(&self, &request)?;

        let active_color = self.phase.active_color;
        let PlayResult { play, board, .. } =
            self.phase.play.move_checker(&self.core.board, origin, die)?;
        let mut core = self.core.clone();
        core.board = board;
        core.refresh_pip_counts();
        core.touch();

        #[cfg(debug_assertions)]
        MoveContract::post(&self, &core)?;

        if play.state() == PlayState::Moved {
            core.players.update(active_color, Player::to_moved)?;
            return Ok(MoveTransition::Moved(Game {
                core,
                phase: Moved { active_color, play },
            }));
        }
        Ok(MoveTransition::Moving(Game {
            core,
            phase: Moving { active_color, play },
        }))
    }

    /// Takes back the last checker moved this turn.
    pub fn undo(self) -> Result<Game<Moving>, GammonError> {
        take_back(self.core, self.phase.active_color, &self.phase.play)
    }

    /// Forfeits every die still unused.
    #[instrument(skip(self), fields(game = %self.core.id))]
    pub fn auto_pass(self) -> Result<Game<Moved>, GammonError> {
        let active_color = self.phase.active_color;
        let play = self.phase.play.auto_pass()?;
        let mut core = self.core;
        core.players.update(active_color, Player::to_moved)?;
        core.touch();
        Ok(Game {
            core,
            phase: Moved { active_color, play },
        })
    }
}

impl Game<Moved> {
    /// The resolved turn.
    pub fn play(&self) -> &Play {
        &self.phase.play
    }

    /// Takes back the last checker moved this turn.
    pub fn undo(self) -> Result<Game<Moving>, GammonError> {
        take_back(self.core, self.phase.active_color, &self.phase.play)
    }

    /// Commits the turn; the game ends if the mover has borne off every checker.
    #[instrument(skip(self), fields(game = %self.core.id, color = %self.phase.active_color))]
    pub fn confirm_turn(self) -> Result<TurnTransition, GammonError> {
        ConfirmTurnContract::pre(&self, &())?;

        let active_color = self.phase.active_color;
        let confirmed = self.phase.play.confirm(&self.core.board)?;
        debug!(moves = confirmed.moves().len(), "Turn confirmed");

        if rules::has_borne_off_all(&self.core.board, active_color) {
            return Ok(TurnTransition::Won(
                self.finish(active_color, CompletionReason::BoreOff)?,
            ));
        }

        let mut core = self.core.clone();
        core.players.update(active_color, |p| Ok(p.deactivate()))?;
        core.players.update(active_color.opponent(), Player::to_rolling)?;
        core.turn_number += 1;

        #[cfg(debug_assertions)]
        ConfirmTurnContract::post(&self, &core)?;

        info!(turn = core.turn_number, next = %active_color.opponent(), "Turn ended");
        let next = Rolling {
            active_color: active_color.opponent(),
        };
        Ok(TurnTransition::NextTurn(
            Game { core, phase: self.phase }.advance(next),
        ))
    }
}

// ─────────────────────────────────────────────────────────────
//  Completed
// ─────────────────────────────────────────────────────────────

impl Game<Completed> {
    /// The outcome; always present.
    pub fn outcome(&self) -> &Outcome {
        &self.phase.outcome
    }

    /// Winning color.
    pub fn winner(&self) -> Color {
        self.phase.outcome.winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRoller;
    use crate::types::Direction;

    fn fresh() -> Game<RollingForStart> {
        Game::new(
            Player::new("black", Color::Black, Direction::Clockwise, false),
            Player::new("white", Color::White, Direction::Counterclockwise, false),
        )
        .unwrap()
    }

    fn started(faces: &[u8]) -> (Game<RolledForStart>, ScriptedRoller) {
        let mut roller = ScriptedRoller::new(faces).unwrap();
        match fresh().roll_for_start(&mut roller).unwrap() {
            StartTransition::Started(game) => (game, roller),
            StartTransition::Tied(_) => panic!("expected a decided opening roll"),
        }
    }

    #[test]
    fn tie_returns_to_rolling_for_start() {
        let mut roller = ScriptedRoller::new(&[4, 4, 6, 2]).unwrap();
        let tied = match fresh().roll_for_start(&mut roller).unwrap() {
            StartTransition::Tied(game) => game,
            StartTransition::Started(_) => panic!("expected a tie"),
        };
        assert_eq!(
            tied.core().player(Color::Black).state(),
            PlayerState::RollingForStart
        );
        match tied.roll_for_start(&mut roller).unwrap() {
            StartTransition::Started(game) => assert_eq!(game.active_color(), Some(Color::Black)),
            StartTransition::Tied(_) => panic!("expected a decided opening roll"),
        }
    }

    #[test]
    fn opening_winner_rolls_first() {
        let (game, mut roller) = started(&[2, 5, 6, 1]);
        assert_eq!(game.active_color(), Some(Color::White));
        assert_eq!(game.core().player(Color::Black).state(), PlayerState::Inactive);

        let rolled = game.roll(&mut roller).unwrap();
        assert_eq!(rolled.play().roll().pip_total(), 7);
        assert_eq!(rolled.play().color(), Color::White);
    }

    #[test]
    fn switch_dice_reorders_moves() {
        let (game, mut roller) = started(&[5, 2, 6, 1]);
        let rolled = game.roll(&mut roller).unwrap();
        let first = rolled.play().moves()[0].die_value().get();
        let switched = rolled.switch_dice().unwrap();
        assert_eq!(switched.play().moves()[1].die_value().get(), first);
    }

    #[test]
    fn full_turn_passes_to_opponent() {
        let (game, mut roller) = started(&[5, 2, 6, 1]);
        let preparing = game.roll(&mut roller).unwrap().prepare_move();
        let MoveTransition::Moving(moving) = preparing.to_moving().unwrap() else {
            panic!("expected moves to remain");
        };
        let MoveTransition::Moving(moving) = moving
            .move_checker(ContainerId::point(24), DieValue::new(6).ok())
            .unwrap()
        else {
            panic!("expected one die left");
        };
        let MoveTransition::Moved(moved) = moving.move_checker(ContainerId::point(8), None).unwrap()
        else {
            panic!("expected the turn to be resolved");
        };
        let TurnTransition::NextTurn(next) = moved.confirm_turn().unwrap() else {
            panic!("expected the game to continue");
        };
        assert_eq!(next.active_color(), Some(Color::White));
        assert_eq!(*next.core().turn_number(), 1);
        assert_eq!(next.core().player(Color::Black).pip_count(), 167 - 7);
    }

    #[test]
    fn undo_reverts_moved_to_moving() {
        let (game, mut roller) = started(&[5, 2, 6, 1]);
        let MoveTransition::Moving(moving) = game.roll(&mut roller).unwrap().prepare_move().to_moving().unwrap()
        else {
            panic!("expected moves to remain");
        };
        let board = moving.board().clone();
        let MoveTransition::Moving(moving) = moving.move_checker(ContainerId::point(13), None).unwrap()
        else {
            panic!("expected one die left");
        };
        let reverted = moving.undo().unwrap();
        assert_eq!(reverted.board(), &board);
        assert_eq!(reverted.core().player(Color::Black).pip_count(), 167);
    }

    #[test]
    fn decline_ends_game_for_offerer() {
        let (game, mut roller) = started(&[5, 2, 6, 1]);
        let doubling = game.roll(&mut roller).unwrap().prepare_move().to_doubling().unwrap();
        assert_eq!(doubling.offered_by(), Color::Black);
        let done = doubling.decline_double().unwrap();
        assert_eq!(done.winner(), Color::Black);
        assert_eq!(done.outcome().reason, CompletionReason::DoubleDeclined);
        assert_eq!(done.outcome().stake, 1);
        assert_eq!(done.core().player(Color::Black).state(), PlayerState::Winner);
    }

    #[test]
    fn accepted_double_keeps_the_turn() {
        let (game, mut roller) = started(&[5, 2, 6, 1]);
        let doubled = game
            .roll(&mut roller)
            .unwrap()
            .prepare_move()
            .to_doubling()
            .unwrap()
            .accept_double()
            .unwrap();
        assert_eq!(doubled.active_color(), Some(Color::Black));
        assert_eq!(doubled.cube().stake(), 2);
        assert_eq!(doubled.cube().owner(), Some(Color::White));
        assert!(matches!(doubled.to_moving().unwrap(), MoveTransition::Moving(_)));
    }

    #[test]
    fn resign_awards_opponent() {
        let done = fresh().resign(Color::White).unwrap();
        assert_eq!(done.winner(), Color::Black);
        assert_eq!(done.outcome().reason, CompletionReason::Resigned);
    }
}
