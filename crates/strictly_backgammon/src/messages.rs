//! Handlers for inbound wire messages.
//!
//! A transport hands each [`Envelope`] to [`handle_message`] together with
//! the current game. The handler checks that the message belongs to this
//! game and that the sender may act, applies the matching transition and
//! reports which history action it amounted to. Sessions, sockets and
//! retries belong to the transport.

use crate::board::ContainerId;
use crate::dice::DieRoller;
use crate::error::{GammonError, IllegalMoveReason};
use crate::game::{AnyGame, GameStateKind, TimeoutAction};
use crate::history::GameActionType;
use crate::types::{Color, DieValue};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Kind of inbound message.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Roll the dice (the opening roll before the game has started).
    DiceRoll,
    /// Swap the order of the rolled dice.
    DiceSwitch,
    /// Move one checker.
    MoveExecute,
    /// Take back the last move.
    MoveUndo,
    /// Commit the turn.
    TurnEnd,
    /// Offer a double.
    CubeDouble,
    /// Take the offered double.
    CubeAccept,
    /// Pass on the offered double.
    CubeDecline,
    /// The player on the clock ran out of time.
    TurnTimeout,
    /// Concede the game.
    GameResign,
}

/// A message as it arrives from the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Message kind.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Game the message is addressed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<Uuid>,
    /// Sending player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
    /// Type-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Transport correlation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl Envelope {
    /// An envelope with no payload, stamped now.
    pub fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            game_id: None,
            player_id: None,
            timestamp: Utc::now(),
            data: serde_json::Value::Null,
            message_id: None,
        }
    }

    /// Addresses the envelope to a game.
    pub fn for_game(mut self, game_id: Uuid) -> Self {
        self.game_id = Some(game_id);
        self
    }

    /// Marks the sender.
    pub fn from_player(mut self, player_id: Uuid) -> Self {
        self.player_id = Some(player_id);
        self
    }

    /// Attaches a payload.
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self, GammonError> {
        self.data = serde_json::to_value(data)?;
        Ok(self)
    }

    fn payload<T: DeserializeOwned>(&self) -> Result<T, GammonError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            GammonError::encoding(format!("bad {} payload: {}", self.message_type, e))
        })
    }
}

/// Payload of `MOVE_EXECUTE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveExecutePayload {
    /// Container the checker leaves.
    pub origin: ContainerId,
    /// Die to spend; the first fitting die when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub die_value: Option<DieValue>,
}

/// Payload of `TURN_TIMEOUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutPayload {
    /// Forced transition to apply.
    pub action: TimeoutAction,
    /// Player whose clock ran out; whoever is expected to act when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// Outcome of handling one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled {
    /// Game after the message.
    pub game: AnyGame,
    /// History action the message amounted to.
    pub action_type: GameActionType,
    /// Color that acted, when one did.
    pub actor: Option<Color>,
}

/// Color expected to send `message_type` in the current state.
///
/// `None` means any seated player may send it.
fn expected_actor(game: &AnyGame, message_type: MessageType) -> Option<Color> {
    let active = game.active_color();
    match message_type {
        MessageType::DiceRoll if game.kind() == GameStateKind::RollingForStart => None,
        MessageType::CubeAccept | MessageType::CubeDecline => active.map(Color::opponent),
        MessageType::TurnTimeout if game.kind() == GameStateKind::Doubling => {
            active.map(Color::opponent)
        }
        MessageType::GameResign => None,
        _ => active,
    }
}

/// Resolves the sender and checks it may act.
fn authorize(
    game: &AnyGame,
    envelope: &Envelope,
) -> Result<(Option<Color>, Option<Color>), GammonError> {
    let sender = match envelope.player_id {
        Some(id) => Some(
            game.core()
                .players()
                .by_id(id)
                .map(|p| p.color())
                .ok_or(IllegalMoveReason::UnknownPlayer(id))?,
        ),
        None => None,
    };
    let expected = expected_actor(game, envelope.message_type);
    if let (Some(sender), Some(expected)) = (sender, expected) {
        if sender != expected {
            return Err(IllegalMoveReason::NotYourTurn(sender).into());
        }
    }
    Ok((sender, expected))
}

/// Applies one message to `game`.
///
/// Fails with `WrongGame` or `UnknownPlayer` when the envelope is
/// misaddressed and `NotYourTurn` when the sender may not act now. The
/// game passed in is never modified.
#[instrument(skip(game, envelope, roller), fields(kind = %envelope.message_type, state = %game.kind()))]
pub fn handle_message<R: DieRoller + ?Sized>(
    game: &AnyGame,
    envelope: &Envelope,
    roller: &mut R,
) -> Result<Handled, GammonError> {
    let result = dispatch(game, envelope, roller);
    match &result {
        Ok(handled) => debug!(next = %handled.game.kind(), "Message applied"),
        Err(err) => warn!(%err, "Message rejected"),
    }
    result
}

fn dispatch<R: DieRoller + ?Sized>(
    game: &AnyGame,
    envelope: &Envelope,
    roller: &mut R,
) -> Result<Handled, GammonError> {
    let game_id = *game.core().id();
    if let Some(addressed) = envelope.game_id {
        if addressed != game_id {
            return Err(IllegalMoveReason::WrongGame(addressed).into());
        }
    }
    let (sender, expected) = authorize(game, envelope)?;
    let actor = sender.or(expected);

    let (next, action_type) = match envelope.message_type {
        MessageType::DiceRoll => dice_roll(game, roller)?,
        MessageType::DiceSwitch => (game.switch_dice()?, GameActionType::SwitchDice),
        MessageType::MoveExecute => move_execute(game, envelope.payload()?)?,
        MessageType::MoveUndo => (game.undo()?, GameActionType::UndoMove),
        MessageType::TurnEnd => (game.confirm_turn()?, GameActionType::ConfirmTurn),
        MessageType::CubeDouble => (game.offer_double()?, GameActionType::OfferDouble),
        MessageType::CubeAccept => (game.accept_double()?, GameActionType::AcceptDouble),
        MessageType::CubeDecline => (game.decline_double()?, GameActionType::DeclineDouble),
        MessageType::TurnTimeout => turn_timeout(game, envelope.payload()?, actor)?,
        MessageType::GameResign => game_resign(game, actor)?,
    };
    Ok(Handled {
        game: next,
        action_type,
        actor,
    })
}

/// `DICE_ROLL`: the opening roll, or the turn roll afterwards.
pub fn dice_roll<R: DieRoller + ?Sized>(
    game: &AnyGame,
    roller: &mut R,
) -> Result<(AnyGame, GameActionType), GammonError> {
    if game.kind() == GameStateKind::RollingForStart {
        Ok((game.roll_for_start(roller)?, GameActionType::RollForStart))
    } else {
        Ok((game.roll(roller)?, GameActionType::RollDice))
    }
}

/// `MOVE_EXECUTE`: moves one checker.
pub fn move_execute(
    game: &AnyGame,
    payload: MoveExecutePayload,
) -> Result<(AnyGame, GameActionType), GammonError> {
    Ok((
        game.move_checker(payload.origin, payload.die_value)?,
        GameActionType::MakeMove,
    ))
}

/// `TURN_TIMEOUT`: applies the forced transition for the late player.
pub fn turn_timeout(
    game: &AnyGame,
    payload: TimeoutPayload,
    actor: Option<Color>,
) -> Result<(AnyGame, GameActionType), GammonError> {
    if let (Some(named), Some(actor)) = (payload.color, actor) {
        if named != actor {
            return Err(IllegalMoveReason::NotYourTurn(named).into());
        }
    }
    let color = payload
        .color
        .or(actor)
        .ok_or_else(|| GammonError::illegal_transition("game", "time out", game.kind(), "a player on the clock"))?;
    Ok((game.timeout(color, payload.action)?, GameActionType::Timeout))
}

/// `GAME_RESIGN`: the sender concedes.
pub fn game_resign(
    game: &AnyGame,
    actor: Option<Color>,
) -> Result<(AnyGame, GameActionType), GammonError> {
    let color = actor
        .or_else(|| game.active_color())
        .ok_or_else(|| GammonError::illegal_transition("game", "resign", game.kind(), "a known resigning player"))?;
    Ok((game.resign(color)?, GameActionType::Resign))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRoller;
    use crate::game::Game;
    use crate::player::Player;
    use crate::types::Direction;

    fn fresh() -> AnyGame {
        Game::new(
            Player::new("black", Color::Black, Direction::Clockwise, true),
            Player::new("white", Color::White, Direction::Counterclockwise, true),
        )
        .unwrap()
        .into()
    }

    #[test]
    fn envelope_uses_wire_names() {
        let envelope = Envelope::new(MessageType::MoveExecute)
            .with_data(&MoveExecutePayload {
                origin: ContainerId::point(24),
                die_value: DieValue::new(6).ok(),
            })
            .unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "MOVE_EXECUTE");
        assert_eq!(json["data"]["dieValue"], 6);
        assert_eq!(json["data"]["origin"]["kind"], "point");
        assert!(json.get("gameId").is_none());
    }

    #[test]
    fn opening_roll_accepts_either_player() {
        let game = fresh();
        let white = game.core().player(Color::White).id();
        let mut roller = ScriptedRoller::new(&[5, 2]).unwrap();
        let envelope = Envelope::new(MessageType::DiceRoll).from_player(white);
        let handled = handle_message(&game, &envelope, &mut roller).unwrap();
        assert_eq!(handled.action_type, GameActionType::RollForStart);
        assert_eq!(handled.game.active_color(), Some(Color::Black));
        assert_eq!(handled.actor, Some(Color::White));
    }

    #[test]
    fn misaddressed_messages_are_refused() {
        let game = fresh();
        let mut roller = ScriptedRoller::new(&[5, 2]).unwrap();
        let stranger = Uuid::new_v4();
        let wrong_game = Envelope::new(MessageType::DiceRoll).for_game(stranger);
        assert_eq!(
            handle_message(&game, &wrong_game, &mut roller),
            Err(IllegalMoveReason::WrongGame(stranger).into())
        );
        let unknown = Envelope::new(MessageType::DiceRoll).from_player(stranger);
        assert_eq!(
            handle_message(&game, &unknown, &mut roller),
            Err(IllegalMoveReason::UnknownPlayer(stranger).into())
        );
        assert_eq!(roller.rolled(), 0);
    }

    #[test]
    fn out_of_turn_sender_is_refused() {
        let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).unwrap();
        let game = fresh().roll_for_start(&mut roller).unwrap();
        let white = game.core().player(Color::White).id();
        let envelope = Envelope::new(MessageType::DiceRoll).from_player(white);
        assert_eq!(
            handle_message(&game, &envelope, &mut roller),
            Err(IllegalMoveReason::NotYourTurn(Color::White).into())
        );
    }

    #[test]
    fn cube_answers_come_from_the_taker() {
        let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).unwrap();
        let game = fresh()
            .roll_for_start(&mut roller)
            .unwrap()
            .roll(&mut roller)
            .unwrap();
        let black = game.core().player(Color::Black).id();
        let white = game.core().player(Color::White).id();
        let offered = handle_message(
            &game,
            &Envelope::new(MessageType::CubeDouble).from_player(black),
            &mut roller,
        )
        .unwrap()
        .game;

        let own_answer = Envelope::new(MessageType::CubeAccept).from_player(black);
        assert!(handle_message(&offered, &own_answer, &mut roller).is_err());

        let taken = handle_message(
            &offered,
            &Envelope::new(MessageType::CubeAccept).from_player(white),
            &mut roller,
        )
        .unwrap();
        assert_eq!(taken.action_type, GameActionType::AcceptDouble);
        assert_eq!(taken.game.cube().value().map(|v| v.get()), Some(2));
    }

    #[test]
    fn bad_payload_is_an_encoding_error() {
        let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).unwrap();
        let game = fresh()
            .roll_for_start(&mut roller)
            .unwrap()
            .roll(&mut roller)
            .unwrap();
        let mut envelope = Envelope::new(MessageType::MoveExecute);
        envelope.data = serde_json::json!({ "origin": "nowhere" });
        assert!(matches!(
            handle_message(&game, &envelope, &mut roller),
            Err(GammonError::Encoding(_))
        ));
    }
}
