//! Robot self-play driven through the message handlers.

use anyhow::{Context, Result};
use strictly_backgammon::messages::MoveExecutePayload;
use strictly_backgammon::{
    AnyGame, Board, Color, Cube, DieRoller, Envelope, Game, GameActionType, GameHistory,
    GameStateKind, MessageType, Outcome, Players, handle_message,
};
use tracing::{debug, info, instrument};

use crate::config::MatchConfig;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// The game reached a result.
    Finished(Outcome),
    /// The turn limit ran out first.
    Abandoned {
        /// Turns completed.
        turns: u32,
    },
}

/// Next thing a robot does.
#[derive(Debug)]
enum RobotAction {
    Send(Envelope),
    /// No legal move is left; the dice are forfeited.
    Pass,
}

/// Plays both seats of one game.
pub struct Orchestrator<R: DieRoller> {
    game: AnyGame,
    history: GameHistory,
    roller: R,
    max_turns: u32,
    quiet: bool,
}

impl<R: DieRoller> Orchestrator<R> {
    /// Seats the configured robots on a standard board.
    #[instrument(skip_all)]
    pub fn new(config: &MatchConfig, roller: R, quiet: bool) -> Result<Self> {
        let (black, white) = config.players();
        if let Some(seat) = [&black, &white].into_iter().find(|p| !p.is_robot()) {
            anyhow::bail!("{} is not a robot seat; the driver only plays robots", seat.user_id());
        }
        let board = Board::standard(black.direction());
        let game: AnyGame = Game::setup(
            Players::new(black, white)?,
            board,
            Cube::new(),
            config.game_settings(),
        )?
        .into();
        let history = GameHistory::new(&game);
        info!(game = %game.core().id(), "Match created");
        Ok(Self {
            game,
            history,
            roller,
            max_turns: *config.max_turns(),
            quiet,
        })
    }

    /// Current game.
    pub fn game(&self) -> &AnyGame {
        &self.game
    }

    /// Actions recorded so far.
    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    /// Plays until the game ends or the turn limit is reached.
    #[instrument(skip(self), fields(game = %self.game.core().id()))]
    pub fn run(&mut self) -> Result<MatchResult> {
        loop {
            if let Some(outcome) = self.game.outcome() {
                info!(%outcome, "Match finished");
                return Ok(MatchResult::Finished(*outcome));
            }
            let turns = *self.game.core().turn_number();
            if turns >= self.max_turns {
                info!(turns, "Turn limit reached");
                return Ok(MatchResult::Abandoned { turns });
            }
            self.step()?;
        }
    }

    /// Applies one robot action and records it.
    fn step(&mut self) -> Result<()> {
        let before = self.game.clone();
        let (after, player_id, action_type, data) = match self.decide()? {
            RobotAction::Send(envelope) => {
                let handled = handle_message(&before, &envelope, &mut self.roller)
                    .with_context(|| format!("{} rejected in {}", envelope.message_type, before.kind()))?;
                (handled.game, envelope.player_id, handled.action_type, envelope.data)
            }
            RobotAction::Pass => {
                let color = before.active_color().context("no one is on the move")?;
                let after = before.auto_pass()?;
                let id = before.core().player(color).id();
                (after, Some(id), GameActionType::AutoPass, serde_json::Value::Null)
            }
        };
        debug!(%action_type, from = %before.kind(), to = %after.kind(), "Robot acted");
        self.history
            .record(&before, &after, player_id, action_type, data)?;
        if action_type == GameActionType::ConfirmTurn && !self.quiet {
            self.report_turn(&before, &after);
        }
        self.game = after;
        Ok(())
    }

    fn decide(&self) -> Result<RobotAction> {
        let game = &self.game;
        let kind = game.kind();
        let envelope = |color: Color, message_type| {
            Envelope::new(message_type)
                .for_game(*game.core().id())
                .from_player(game.core().player(color).id())
        };
        if kind == GameStateKind::RollingForStart {
            return Ok(RobotAction::Send(envelope(Color::Black, MessageType::DiceRoll)));
        }
        let active = game
            .active_color()
            .with_context(|| format!("no active color in {}", kind))?;
        let action = match kind {
            GameStateKind::RolledForStart | GameStateKind::Rolling => {
                RobotAction::Send(envelope(active, MessageType::DiceRoll))
            }
            // Robots never offer, but a restored game may be waiting on an answer.
            GameStateKind::Doubling => {
                RobotAction::Send(envelope(active.opponent(), MessageType::CubeAccept))
            }
            GameStateKind::Rolled
            | GameStateKind::PreparingMove
            | GameStateKind::Doubled
            | GameStateKind::Moving => {
                let play = game.active_play().context("turn has no play")?;
                let possible = play.possible_moves();
                if possible.is_empty() {
                    RobotAction::Pass
                } else {
                    let best = game.core().player(active).best_move(&possible)?;
                    let payload = MoveExecutePayload {
                        origin: best.origin,
                        die_value: Some(best.die_value),
                    };
                    RobotAction::Send(envelope(active, MessageType::MoveExecute).with_data(&payload)?)
                }
            }
            GameStateKind::Moved => RobotAction::Send(envelope(active, MessageType::TurnEnd)),
            GameStateKind::RollingForStart | GameStateKind::Completed => {
                anyhow::bail!("nothing to do in {}", kind)
            }
        };
        Ok(action)
    }

    fn report_turn(&self, before: &AnyGame, after: &AnyGame) {
        let Some(play) = before.active_play() else {
            return;
        };
        let pips = after.board().pip_counts();
        println!(
            "turn {:>3}  {:<5} rolled {}  pips black {:>3} white {:>3}",
            before.core().turn_number() + 1,
            play.color().to_string(),
            play.roll(),
            pips.get(Color::Black),
            pips.get(Color::White),
        );
    }
}
