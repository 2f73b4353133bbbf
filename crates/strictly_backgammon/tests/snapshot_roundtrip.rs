//! Snapshots rebuild the exact game they were taken from.

mod common;

use common::{rolled_game, self_play};
use proptest::prelude::*;
use strictly_backgammon::{
    ContainerId, GameStateKind, GameStateSnapshot, GammonError, SNAPSHOT_VERSION,
    START_POSITION_ID,
};

#[test]
fn test_snapshot_wire_fields() {
    let (game, _) = rolled_game(&[5, 2, 6, 1]);
    let game = game
        .move_checker(ContainerId::point(13), None)
        .expect("Legal move");
    let snapshot = GameStateSnapshot::capture(&game);
    let json: serde_json::Value =
        serde_json::from_str(&snapshot.to_json().expect("Serializable")).expect("Valid JSON");

    assert_eq!(json["version"], SNAPSHOT_VERSION);
    assert_eq!(json["stateKind"], "moving");
    assert_eq!(json["activeColor"], "black");
    assert_eq!(json["moveNumber"], 1);
    assert_eq!(json["turnNumber"], 0);
    assert_eq!(json["cubeState"]["stateKind"], "centered");
    assert_eq!(json["cubeState"]["position"], "center");
    assert_eq!(json["cubeState"]["value"], 1);
    assert_eq!(json["diceState"]["black"]["stateKind"], "rolled");
    assert_eq!(json["pipCounts"]["black"], 161);
    assert!(json["gnuPositionId"].as_str().is_some_and(|id| id.len() == 14));
    assert!(json["boardPositions"]["points"].is_object());
}

#[test]
fn test_fresh_game_snapshot_has_start_id() {
    let states = self_play(7, 0);
    let snapshot = GameStateSnapshot::capture(&states[0]);
    assert_eq!(snapshot.gnu_position_id, START_POSITION_ID);
    assert_eq!(snapshot.state_kind, GameStateKind::RollingForStart);
    assert_eq!(snapshot.reconstruct().expect("Valid snapshot"), states[0]);
}

#[test]
fn test_tampered_snapshots_are_rejected() {
    let (game, _) = rolled_game(&[5, 2, 6, 1]);
    let snapshot = GameStateSnapshot::capture(&game);

    let mut wrong_version = snapshot.clone();
    wrong_version.version = SNAPSHOT_VERSION + 1;
    assert!(matches!(wrong_version.reconstruct(), Err(GammonError::Encoding(_))));

    let mut wrong_id = snapshot.clone();
    wrong_id.gnu_position_id = START_POSITION_ID.replace('4', "5");
    assert!(wrong_id.reconstruct().is_err());

    let mut wrong_pips = snapshot.clone();
    wrong_pips.pip_counts.black += 1;
    assert!(wrong_pips.reconstruct().is_err());

    let mut no_play = snapshot;
    no_play.active_play = None;
    assert!(no_play.reconstruct().is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_self_play_snapshots_round_trip(seed in any::<u64>()) {
        for game in self_play(seed, 400) {
            let json = GameStateSnapshot::capture(&game).to_json().expect("Serializable");
            let rebuilt = GameStateSnapshot::from_json(&json)
                .and_then(|s| s.reconstruct())
                .expect("Captured snapshot reconstructs");
            prop_assert_eq!(rebuilt, game);
        }
    }
}
