//! Recording a game as an append-only history.

mod common;

use common::{fresh_game, robot_step};
use strictly_backgammon::{
    AnyGame, GameActionType, GameHistory, GameStateKind, RandomRoller,
};

fn action_for(before: &AnyGame) -> GameActionType {
    match before.kind() {
        GameStateKind::RollingForStart => GameActionType::RollForStart,
        GameStateKind::RolledForStart | GameStateKind::Rolling => GameActionType::RollDice,
        GameStateKind::Moved => GameActionType::ConfirmTurn,
        GameStateKind::Doubling => GameActionType::AcceptDouble,
        _ => GameActionType::MakeMove,
    }
}

fn recorded_game(seed: u64, steps: usize) -> (GameHistory, AnyGame) {
    let mut roller = RandomRoller::seeded(seed);
    let mut game = fresh_game();
    let mut history = GameHistory::new(&game);
    for _ in 0..steps {
        let Some(next) = robot_step(&game, &mut roller) else {
            break;
        };
        let actor = next.active_color().map(|c| next.core().player(c).id());
        history
            .record(&game, &next, actor, action_for(&game), serde_json::Value::Null)
            .expect("Same game");
        game = next;
    }
    (history, game)
}

#[test]
fn test_recorded_game_verifies_and_reconstructs() {
    let (history, game) = recorded_game(11, 60);
    assert_eq!(history.len(), 60);
    assert_eq!(
        history.actions().first().map(|a| a.action_type),
        Some(GameActionType::RollForStart)
    );
    assert!(history.verify_integrity().is_ok());
    assert_eq!(history.reconstruct_latest().expect("Non-empty"), game);
    assert_eq!(history.metadata().total_turns, *game.core().turn_number());
}

#[test]
fn test_history_survives_json() {
    let (history, game) = recorded_game(3, 25);
    let json = history.to_json().expect("Serializable");
    let value: serde_json::Value = serde_json::from_str(&json).expect("Valid JSON");
    assert_eq!(value["actions"][0]["sequenceNumber"], 1);
    assert_eq!(value["actions"][0]["actionType"], "roll-for-start");
    assert!(value["actions"][0]["gameStateBefore"].is_object());

    let back = GameHistory::from_json(&json).expect("Parsable");
    assert!(back.verify_integrity().is_ok());
    assert_eq!(back.reconstruct_latest().expect("Non-empty"), game);
}

#[test]
fn test_reordered_history_fails_integrity() {
    let (history, _) = recorded_game(5, 10);
    let json = history.to_json().expect("Serializable");
    let mut value: serde_json::Value = serde_json::from_str(&json).expect("Valid JSON");
    let actions = value["actions"].as_array_mut().expect("Actions array");
    actions.swap(3, 4);
    let tampered: GameHistory = serde_json::from_value(value).expect("Still well-formed");
    assert!(tampered.verify_integrity().is_err());
}

#[test]
fn test_metadata_records_outcome() {
    let (history, game) = recorded_game(21, 5_000);
    assert!(game.is_over());
    assert_eq!(history.metadata().final_outcome.as_ref(), game.outcome());
    assert!(history.verify_integrity().is_ok());
}
