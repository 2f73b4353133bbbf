//! Driving a game through wire envelopes.

mod common;

use common::fresh_game;
use strictly_backgammon::messages::{MoveExecutePayload, TimeoutPayload};
use strictly_backgammon::{
    AnyGame, Color, CompletionReason, ContainerId, DieValue, Envelope, GameActionType,
    GameHistory, GameStateKind, IllegalMoveReason, MessageType, ScriptedRoller, TimeoutAction,
    handle_message,
};

fn send(
    game: &AnyGame,
    history: &mut GameHistory,
    roller: &mut ScriptedRoller,
    envelope: Envelope,
) -> AnyGame {
    let handled = handle_message(game, &envelope, roller).expect("Accepted message");
    history
        .record(
            game,
            &handled.game,
            envelope.player_id,
            handled.action_type,
            envelope.data.clone(),
        )
        .expect("Same game");
    handled.game
}

#[test]
fn test_full_turn_over_the_wire() {
    let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).expect("Valid faces");
    let game = fresh_game();
    let game_id = *game.core().id();
    let black = game.core().player(Color::Black).id();
    let mut history = GameHistory::new(&game);
    let from_black = |kind| Envelope::new(kind).for_game(game_id).from_player(black);

    let game = send(&game, &mut history, &mut roller, from_black(MessageType::DiceRoll));
    let game = send(&game, &mut history, &mut roller, from_black(MessageType::DiceRoll));
    assert_eq!(game.kind(), GameStateKind::Rolled);

    let game = send(&game, &mut history, &mut roller, from_black(MessageType::DiceSwitch));
    let first = game
        .active_play()
        .and_then(|p| p.moves().first())
        .map(|m| m.die_value().get());
    assert_eq!(first, Some(1));

    let step = |origin, die: u8| {
        from_black(MessageType::MoveExecute)
            .with_data(&MoveExecutePayload {
                origin: ContainerId::point(origin),
                die_value: DieValue::new(die).ok(),
            })
            .expect("Serializable payload")
    };
    let game = send(&game, &mut history, &mut roller, step(8, 1));
    let game = send(&game, &mut history, &mut roller, step(13, 6));
    assert_eq!(game.kind(), GameStateKind::Moved);

    let game = send(&game, &mut history, &mut roller, from_black(MessageType::MoveUndo));
    assert_eq!(game.kind(), GameStateKind::Moving);
    let game = send(&game, &mut history, &mut roller, step(13, 6));
    let game = send(&game, &mut history, &mut roller, from_black(MessageType::TurnEnd));
    assert_eq!(game.active_color(), Some(Color::White));

    let kinds: Vec<_> = history.actions().iter().map(|a| a.action_type).collect();
    assert_eq!(
        kinds,
        vec![
            GameActionType::RollForStart,
            GameActionType::RollDice,
            GameActionType::SwitchDice,
            GameActionType::MakeMove,
            GameActionType::MakeMove,
            GameActionType::UndoMove,
            GameActionType::MakeMove,
            GameActionType::ConfirmTurn,
        ]
    );
    assert!(history.verify_integrity().is_ok());
}

#[test]
fn test_envelope_parses_from_json() {
    let game = fresh_game();
    let json = serde_json::json!({
        "type": "DICE_ROLL",
        "gameId": game.core().id(),
        "timestamp": "2024-05-01T12:00:00Z",
        "data": null,
        "messageId": "abc-1"
    });
    let envelope: Envelope = serde_json::from_value(json).expect("Well-formed envelope");
    assert_eq!(envelope.message_type, MessageType::DiceRoll);
    assert_eq!(envelope.message_id.as_deref(), Some("abc-1"));

    let mut roller = ScriptedRoller::new(&[2, 6]).expect("Valid faces");
    let handled = handle_message(&game, &envelope, &mut roller).expect("Opening roll");
    assert_eq!(handled.game.active_color(), Some(Color::White));
    assert_eq!(handled.actor, None);
}

#[test]
fn test_move_out_of_turn_rejected() {
    let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).expect("Valid faces");
    let game = fresh_game()
        .roll_for_start(&mut roller)
        .and_then(|g| g.roll(&mut roller))
        .expect("Black to move");
    let white = game.core().player(Color::White).id();
    let envelope = Envelope::new(MessageType::MoveExecute)
        .from_player(white)
        .with_data(&MoveExecutePayload {
            origin: ContainerId::point(1),
            die_value: None,
        })
        .expect("Serializable payload");
    assert_eq!(
        handle_message(&game, &envelope, &mut roller),
        Err(IllegalMoveReason::NotYourTurn(Color::White).into())
    );
}

#[test]
fn test_timeout_and_resign_messages() {
    let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).expect("Valid faces");
    let game = fresh_game()
        .roll_for_start(&mut roller)
        .and_then(|g| g.roll(&mut roller))
        .expect("Black to move");

    let timeout = Envelope::new(MessageType::TurnTimeout)
        .with_data(&TimeoutPayload {
            action: TimeoutAction::Resign,
            color: None,
        })
        .expect("Serializable payload");
    let handled = handle_message(&game, &timeout, &mut roller).expect("Clock ran out");
    assert_eq!(handled.action_type, GameActionType::Timeout);
    let outcome = handled.game.outcome().expect("Game over");
    assert_eq!(outcome.winner, Color::White);
    assert_eq!(outcome.reason, CompletionReason::TimedOut);

    // Either player may resign at any time.
    let white = game.core().player(Color::White).id();
    let resign = Envelope::new(MessageType::GameResign).from_player(white);
    let handled = handle_message(&game, &resign, &mut roller).expect("Resignation");
    assert_eq!(handled.game.winner(), Some(Color::Black));
    assert_eq!(handled.actor, Some(Color::White));
}

#[test]
fn test_timeout_must_name_the_player_on_the_clock() {
    let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).expect("Valid faces");
    let game = fresh_game()
        .roll_for_start(&mut roller)
        .and_then(|g| g.roll(&mut roller))
        .expect("Black to move");
    let black = game.core().player(Color::Black).id();
    let blame_white = |action| {
        Envelope::new(MessageType::TurnTimeout)
            .with_data(&TimeoutPayload {
                action,
                color: Some(Color::White),
            })
            .expect("Serializable payload")
    };

    // The mover cannot time out the idle player.
    let from_mover = blame_white(TimeoutAction::Resign).from_player(black);
    assert_eq!(
        handle_message(&game, &from_mover, &mut roller),
        Err(IllegalMoveReason::NotYourTurn(Color::White).into())
    );

    // Nor can the transport forfeit the mover's turn in the idle player's name.
    let unaddressed = blame_white(TimeoutAction::AutoPass);
    assert_eq!(
        handle_message(&game, &unaddressed, &mut roller),
        Err(IllegalMoveReason::NotYourTurn(Color::White).into())
    );
    assert!(game.timeout(Color::White, TimeoutAction::AutoPass).is_err());

    // While a double awaits an answer the taker is on the clock.
    let doubling = game.offer_double().expect("Centered cube");
    let handled = handle_message(&doubling, &unaddressed, &mut roller).expect("Taker timed out");
    assert_eq!(handled.game.winner(), Some(Color::Black));
    assert_eq!(
        handled.game.outcome().map(|o| o.reason),
        Some(CompletionReason::DoubleDeclined)
    );
}
