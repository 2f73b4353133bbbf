//! A full turn: two or four moves driven by one roll.

use crate::action::{Move, MoveResult, MoveSkeleton, MoveStateKind};
use crate::board::{Board, ContainerId};
use crate::error::{GammonError, IllegalMoveReason};
use crate::player::{Player, PlayerState};
use crate::rules;
use crate::types::{Color, DieValue, Direction, Roll};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Where a turn is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PlayState {
    /// Dice rolled, nothing selected yet.
    Rolled,
    /// Checkers are being moved.
    Moving,
    /// Every die resolved.
    Moved,
    /// Committed; undo no longer possible.
    Confirmed,
}

/// Board and moves as they were before one move of the turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoFrame {
    board: Board,
    moves: Vec<Move>,
}

/// Result of moving one checker within a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayResult {
    /// The turn after the move.
    pub play: Play,
    /// Board after the move.
    pub board: Board,
    /// The move just made.
    pub mv: Move,
}

/// One player's turn.
///
/// Holds a move per die (four for a double). After each move the
/// remaining ready moves are recomputed against the new board; once none
/// of them has a legal skeleton they all resolve as no-move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Play {
    id: Uuid,
    color: Color,
    direction: Direction,
    roll: Roll,
    moves: Vec<Move>,
    state: PlayState,
    undo_stack: Vec<UndoFrame>,
}

impl Play {
    /// Builds the turn from a rolled player.
    #[instrument(skip(board, player), fields(color = %player.color()))]
    pub fn initialize(board: &Board, player: &Player) -> Result<Play, GammonError> {
        if player.state() != PlayerState::Rolled {
            return Err(GammonError::illegal_transition(
                "play",
                "initialize",
                player.state(),
                PlayerState::Rolled,
            ));
        }
        let roll = player.dice().current_roll().ok_or_else(|| {
            GammonError::invariant(format!("{} is rolled without a roll", player.color()))
        })?;

        let moves = roll
            .die_values()
            .into_iter()
            .map(|die| Move::ready(board, player.color(), die))
            .collect();
        let mut play = Play {
            id: Uuid::new_v4(),
            color: player.color(),
            direction: player.direction(),
            roll,
            moves,
            state: PlayState::Rolled,
            undo_stack: Vec::new(),
        };
        play.settle()?;
        debug!(roll = %roll, complete = play.is_complete(), "Play initialized");
        Ok(play)
    }

    /// Play id.
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

    /// Roll the turn is built from.
    pub fn roll(&self) -> Roll {
        self.roll
    }

    /// Moves in die order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Current state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Number of moves that can currently be undone.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Whether every die is resolved.
    pub fn is_complete(&self) -> bool {
        self.moves.iter().all(Move::is_resolved)
    }

    /// Moves still waiting for an origin.
    pub fn ready_moves(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter().filter(|m| m.is_ready())
    }

    /// Moves already made or forfeited.
    pub fn resolved_moves(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter().filter(|m| m.is_resolved())
    }

    /// Every legal skeleton across the unresolved dice.
    pub fn possible_moves(&self) -> Vec<MoveSkeleton> {
        self.ready_moves()
            .flat_map(|m| m.possible_moves().iter().copied())
            .collect()
    }

    fn wrong_state(&self, operation: &'static str, expected: &str) -> GammonError {
        GammonError::illegal_transition("play", operation, self.state, expected)
    }

    /// Resolves every ready move as no-move once none of them can be played.
    fn settle(&mut self) -> Result<(), GammonError> {
        let stuck = self.ready_moves().all(|m| m.possible_moves().is_empty());
        if stuck {
            for mv in self.moves.iter_mut().filter(|m| m.is_ready()) {
                debug!(die = %mv.die_value(), "No legal move for die");
                *mv = mv.resolve_no_move()?;
            }
        }
        if self.is_complete() && self.state == PlayState::Moving {
            self.state = PlayState::Moved;
        }
        Ok(())
    }

    /// Enters the moving state; a turn with nothing to play goes straight to moved.
    pub fn to_moving(self) -> Result<Play, GammonError> {
        if self.state != PlayState::Rolled {
            return Err(self.wrong_state("start moving", "rolled"));
        }
        let state = if self.is_complete() {
            PlayState::Moved
        } else {
            PlayState::Moving
        };
        Ok(Play { state, ..self })
    }

    fn select(&self, origin: ContainerId, die: Option<DieValue>) -> Result<usize, GammonError> {
        let ready = || self.moves.iter().enumerate().filter(|(_, m)| m.is_ready());

        if let Some(die) = die {
            let mut with_die = ready().filter(|(_, m)| m.die_value() == die).peekable();
            if with_die.peek().is_none() {
                return Err(IllegalMoveReason::DieUnavailable(die).into());
            }
            return with_die
                .find(|(_, m)| m.skeleton_from(origin).is_some())
                .map(|(i, _)| i)
                .ok_or_else(|| IllegalMoveReason::NoLegalMoveFrom(origin).into());
        }

        if let Some((i, _)) = ready().find(|(_, m)| m.skeleton_from(origin).is_some()) {
            return Ok(i);
        }

        // Explain the rejection as precisely as the board allows.
        let bar = ContainerId::bar(self.direction);
        let must_enter = origin != bar
            && ready().any(|(_, m)| m.possible_moves().iter().any(|s| s.origin == bar));
        if must_enter {
            Err(IllegalMoveReason::MustReenterFromBar.into())
        } else {
            Err(IllegalMoveReason::NoLegalMoveFrom(origin).into())
        }
    }

    /// Selects the checker at `origin`, using `die` if given or else the
    /// first unresolved die that can move it.
    #[instrument(skip(self), fields(color = %self.color, origin = %origin))]
    pub fn begin_move(&self, origin: ContainerId, die: Option<DieValue>) -> Result<Play, GammonError> {
        let mut play = match self.state {
            PlayState::Rolled => self.clone().to_moving()?,
            PlayState::Moving => self.clone(),
            _ => return Err(self.wrong_state("move", "rolled or moving")),
        };
        if play.moves.iter().any(|m| m.state().kind() == MoveStateKind::InProgress) {
            return Err(IllegalMoveReason::MoveInFlight.into());
        }
        let index = play.select(origin, die)?;
        play.moves[index] = play.moves[index].begin(origin)?;
        Ok(play)
    }

    fn in_flight(&self) -> Option<usize> {
        self.moves
            .iter()
            .position(|m| m.state().kind() == MoveStateKind::InProgress)
    }

    /// Drops the current selection.
    pub fn cancel_move(&self) -> Result<Play, GammonError> {
        let index = self
            .in_flight()
            .ok_or_else(|| self.wrong_state("cancel", "a move in progress"))?;
        let mut play = self.clone();
        play.moves[index] = play.moves[index].cancel()?;
        Ok(play)
    }

    /// Applies the selected move to `board`.
    #[instrument(skip(self, board), fields(color = %self.color))]
    pub fn finish_move(&self, board: &Board) -> Result<PlayResult, GammonError> {
        let index = self
            .in_flight()
            .ok_or_else(|| self.wrong_state("finish move", "a move in progress"))?;

        let mut before = self.moves.clone();
        before[index] = before[index].cancel()?;

        let MoveResult { board: next, mv } = self.moves[index].complete(board)?;

        let mut play = self.clone();
        play.undo_stack.push(UndoFrame {
            board: board.clone(),
            moves: before,
        });
        play.moves[index] = mv.clone();
        for pending in play.moves.iter_mut() {
            pending.refresh(&next);
        }
        play.settle()?;

        info!(
            die = %mv.die_value(),
            kind = ?mv.kind(),
            hit = mv.is_hit(),
            remaining = play.ready_moves().count(),
            "Checker moved"
        );
        Ok(PlayResult {
            play,
            board: next,
            mv,
        })
    }

    /// Moves the checker at `origin` in one step.
    pub fn move_checker(
        &self,
        board: &Board,
        origin: ContainerId,
        die: Option<DieValue>,
    ) -> Result<PlayResult, GammonError> {
        self.begin_move(origin, die)
            .map_err(|err| self.sharpen(board, origin, die, err))?
            .finish_move(board)
    }

    /// Replaces a bare "no legal move" with the board's reason, if it has one.
    fn sharpen(
        &self,
        board: &Board,
        origin: ContainerId,
        die: Option<DieValue>,
        err: GammonError,
    ) -> GammonError {
        if !matches!(err, GammonError::IllegalMove(IllegalMoveReason::NoLegalMoveFrom(_))) {
            return err;
        }
        let dice: Vec<DieValue> = match die {
            Some(die) => vec![die],
            None => self.ready_moves().map(Move::die_value).collect(),
        };
        dice.into_iter()
            .find_map(|die| rules::blocked_reason(board, self.color, die, origin))
            .map_or(err, |reason| {
                debug!(%reason, "Move refused by the board");
                reason.into()
            })
    }

    /// Reverts the last move of the turn, returning the turn and the board before it.
    #[instrument(skip(self), fields(color = %self.color, depth = self.undo_stack.len()))]
    pub fn undo(&self) -> Result<(Play, Board), GammonError> {
        if !matches!(self.state, PlayState::Moving | PlayState::Moved) {
            return Err(self.wrong_state("undo", "moving or moved"));
        }
        let mut play = self.clone();
        let frame = play
            .undo_stack
            .pop()
            .ok_or(IllegalMoveReason::NothingToUndo)?;
        play.moves = frame.moves;
        play.state = PlayState::Moving;
        Ok((play, frame.board))
    }

    /// Forfeits every unresolved die.
    pub fn auto_pass(&self) -> Result<Play, GammonError> {
        let mut play = match self.state {
            PlayState::Rolled | PlayState::Moving | PlayState::Moved => self.clone(),
            PlayState::Confirmed => return Err(self.wrong_state("auto-pass", "an unconfirmed play")),
        };
        for mv in play.moves.iter_mut().filter(|m| !m.is_resolved()) {
            *mv = mv.forfeit()?;
        }
        play.state = PlayState::Moved;
        Ok(play)
    }

    /// Commits the turn and discards the undo history.
    #[instrument(skip(self, board), fields(color = %self.color))]
    pub fn confirm(&self, board: &Board) -> Result<Play, GammonError> {
        if self.state != PlayState::Moved || !self.is_complete() {
            return Err(IllegalMoveReason::TurnIncomplete.into());
        }
        let moves = self
            .moves
            .iter()
            .map(|m| m.confirm(board).map(|r| r.mv))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Play {
            moves,
            state: PlayState::Confirmed,
            undo_stack: Vec::new(),
            ..self.clone()
        })
    }
}
