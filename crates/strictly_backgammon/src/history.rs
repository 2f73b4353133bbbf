//! Append-only record of game actions.

use crate::error::GammonError;
use crate::game::{AnyGame, Outcome};
use crate::snapshot::GameStateSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Kind of recorded action.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameActionType {
    /// Opening roll.
    RollForStart,
    /// Turn roll.
    RollDice,
    /// Dice order swapped.
    SwitchDice,
    /// One checker moved.
    MakeMove,
    /// Turn committed.
    ConfirmTurn,
    /// Double offered.
    OfferDouble,
    /// Double taken.
    AcceptDouble,
    /// Double passed.
    DeclineDouble,
    /// Game conceded.
    Resign,
    /// Last move taken back.
    UndoMove,
    /// Remaining dice forfeited.
    AutoPass,
    /// Player ran out of time.
    Timeout,
}

/// One entry of the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameHistoryAction {
    /// Entry id.
    pub id: Uuid,
    /// Game the entry belongs to.
    pub game_id: Uuid,
    /// Position in the log, starting at 1.
    pub sequence_number: u64,
    /// When the action was recorded.
    pub timestamp: DateTime<Utc>,
    /// Acting player, if any.
    pub player_id: Option<Uuid>,
    /// Kind of action.
    pub action_type: GameActionType,
    /// Action parameters as sent.
    pub action_data: serde_json::Value,
    /// Game before the action.
    pub game_state_before: GameStateSnapshot,
    /// Game after the action.
    pub game_state_after: GameStateSnapshot,
}

/// Summary fields kept alongside the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMetadata {
    /// When the log was opened.
    pub created_at: DateTime<Utc>,
    /// Black's account.
    pub black_user_id: String,
    /// White's account.
    pub white_user_id: String,
    /// Completed turns as of the latest entry.
    pub total_turns: u32,
    /// Outcome once the game is over.
    pub final_outcome: Option<Outcome>,
}

/// Append-only log of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameHistory {
    game_id: Uuid,
    actions: Vec<GameHistoryAction>,
    metadata: HistoryMetadata,
}

impl GameHistory {
    /// Opens an empty log for `game`.
    pub fn new(game: &AnyGame) -> Self {
        let core = game.core();
        Self {
            game_id: *core.id(),
            actions: Vec::new(),
            metadata: HistoryMetadata {
                created_at: Utc::now(),
                black_user_id: core.player(crate::types::Color::Black).user_id().to_string(),
                white_user_id: core.player(crate::types::Color::White).user_id().to_string(),
                total_turns: *core.turn_number(),
                final_outcome: game.outcome().copied(),
            },
        }
    }

    /// Game id.
    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// Entries in order.
    pub fn actions(&self) -> &[GameHistoryAction] {
        &self.actions
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&GameHistoryAction> {
        self.actions.last()
    }

    /// Summary fields.
    pub fn metadata(&self) -> &HistoryMetadata {
        &self.metadata
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Appends an action with snapshots of the game before and after it.
    #[instrument(skip(self, before, after, action_data), fields(game = %self.game_id))]
    pub fn record(
        &mut self,
        before: &AnyGame,
        after: &AnyGame,
        player_id: Option<Uuid>,
        action_type: GameActionType,
        action_data: serde_json::Value,
    ) -> Result<&GameHistoryAction, GammonError> {
        for game in [before, after] {
            if *game.core().id() != self.game_id {
                return Err(crate::error::IllegalMoveReason::WrongGame(*game.core().id()).into());
            }
        }
        let action = GameHistoryAction {
            id: Uuid::new_v4(),
            game_id: self.game_id,
            sequence_number: self.actions.len() as u64 + 1,
            timestamp: Utc::now(),
            player_id,
            action_type,
            action_data,
            game_state_before: GameStateSnapshot::capture(before),
            game_state_after: GameStateSnapshot::capture(after),
        };
        self.metadata.total_turns = *after.core().turn_number();
        self.metadata.final_outcome = after.outcome().copied();
        debug!(sequence = action.sequence_number, %action_type, "Action recorded");
        self.actions.push(action);
        self.actions
            .last()
            .ok_or_else(|| GammonError::invariant("history lost the entry just pushed"))
    }

    /// Checks that sequence numbers run 1, 2, 3, … and that each entry starts
    /// from the state the previous one ended in.
    pub fn verify_integrity(&self) -> Result<(), GammonError> {
        let mut previous: Option<&GameHistoryAction> = None;
        for (i, action) in self.actions.iter().enumerate() {
            let expected = i as u64 + 1;
            if action.sequence_number != expected {
                warn!(expected, found = action.sequence_number, "History sequence gap");
                return Err(GammonError::encoding(format!(
                    "history entry {} has sequence number {}",
                    expected, action.sequence_number
                )));
            }
            if action.game_id != self.game_id {
                return Err(GammonError::encoding(format!(
                    "history entry {} belongs to game {}",
                    expected, action.game_id
                )));
            }
            if previous.is_some_and(|p| p.game_state_after != action.game_state_before) {
                warn!(sequence = expected, "History chain broken");
                return Err(GammonError::encoding(format!(
                    "history entry {} does not start where entry {} ended",
                    expected,
                    expected - 1
                )));
            }
            previous = Some(action);
        }
        Ok(())
    }

    /// Game as of the latest entry.
    pub fn reconstruct_latest(&self) -> Result<AnyGame, GammonError> {
        self.latest()
            .ok_or_else(|| GammonError::encoding("history is empty"))?
            .game_state_after
            .reconstruct()
    }

    /// Game as of a given sequence number.
    pub fn reconstruct_at(&self, sequence_number: u64) -> Result<AnyGame, GammonError> {
        self.actions
            .iter()
            .find(|a| a.sequence_number == sequence_number)
            .ok_or_else(|| GammonError::encoding(format!("no history entry {}", sequence_number)))?
            .game_state_after
            .reconstruct()
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, GammonError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses JSON written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self, GammonError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRoller;
    use crate::game::Game;
    use crate::player::Player;
    use crate::types::{Color, Direction};

    fn opened() -> (AnyGame, GameHistory) {
        let game: AnyGame = Game::new(
            Player::new("black", Color::Black, Direction::Clockwise, true),
            Player::new("white", Color::White, Direction::Counterclockwise, true),
        )
        .unwrap()
        .into();
        let history = GameHistory::new(&game);
        (game, history)
    }

    #[test]
    fn records_chain_and_reconstruct() {
        let (game, mut history) = opened();
        let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).unwrap();
        let started = game.roll_for_start(&mut roller).unwrap();
        history
            .record(&game, &started, None, GameActionType::RollForStart, serde_json::Value::Null)
            .unwrap();
        let rolled = started.roll(&mut roller).unwrap();
        let black = rolled.core().player(Color::Black).id();
        history
            .record(&started, &rolled, Some(black), GameActionType::RollDice, serde_json::Value::Null)
            .unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.verify_integrity().is_ok());
        assert_eq!(history.reconstruct_latest().unwrap(), rolled);
        assert_eq!(history.reconstruct_at(1).unwrap(), started);

        let back = GameHistory::from_json(&history.to_json().unwrap()).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn broken_chain_is_detected() {
        let (game, mut history) = opened();
        let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).unwrap();
        let started = game.roll_for_start(&mut roller).unwrap();
        let rolled = started.roll(&mut roller).unwrap();
        history
            .record(&game, &started, None, GameActionType::RollForStart, serde_json::Value::Null)
            .unwrap();
        history
            .record(&game, &rolled, None, GameActionType::RollDice, serde_json::Value::Null)
            .unwrap();
        assert!(matches!(history.verify_integrity(), Err(GammonError::Encoding(_))));
    }

    #[test]
    fn other_games_are_refused() {
        let (game, mut history) = opened();
        let (other, _) = opened();
        assert!(history
            .record(&game, &other, None, GameActionType::Resign, serde_json::Value::Null)
            .is_err());
        assert!(history.is_empty());
        assert!(history.reconstruct_latest().is_err());
    }
}
