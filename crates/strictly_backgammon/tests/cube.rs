//! Doubling cube behaviour seen from outside the crate.

use strictly_backgammon::{Color, Cube, CubeStateKind, CubeValue, GammonError, IllegalMoveReason};

#[test]
fn test_centered_cube_is_worth_one() {
    let cube = Cube::new();
    assert_eq!(cube.kind(), CubeStateKind::Initialized);
    assert_eq!(cube.stake(), 1);
    assert_eq!(cube.owner(), None);
    assert!(cube.can_double(Color::Black, true).is_ok());
    assert!(cube.can_double(Color::White, true).is_ok());
}

#[test]
fn test_offer_keeps_stake_until_accepted() {
    let offered = Cube::new().offer(Color::Black, false).expect("Centered cube");
    assert_eq!(offered.kind(), CubeStateKind::Offered);
    assert_eq!(offered.stake(), 1);
    assert!(matches!(
        offered.can_double(Color::White, false),
        Err(GammonError::IllegalTransition { .. })
    ));

    let taken = offered.accept().expect("Offer pending");
    assert_eq!(taken.stake(), 2);
    assert_eq!(taken.owner(), Some(Color::White));
    assert_eq!(taken.value(), Some(CubeValue::first()));

    let withdrawn = offered.withdraw().expect("Offer pending");
    assert_eq!(withdrawn.id(), offered.id());
    assert_eq!(withdrawn.kind(), CubeStateKind::Initialized);
    assert!(withdrawn.accept().is_err());
}

#[test]
fn test_redouble_by_owner_only_when_enforced() {
    let cube = Cube::new()
        .double(Color::Black, true)
        .and_then(|c| c.double(Color::White, true))
        .expect("Each owner redoubles");
    assert_eq!(cube.stake(), 4);
    assert_eq!(cube.owner(), Some(Color::Black));
    assert_eq!(
        cube.offer(Color::White, true),
        Err(IllegalMoveReason::CubeOwnedByOpponent(Color::Black).into())
    );
    assert!(cube.offer(Color::White, false).is_ok());
}

#[test]
fn test_cube_state_serializes_with_tag() {
    let cube = Cube::new().double(Color::Black, false).expect("First double");
    let json = serde_json::to_value(cube.state()).expect("Serializable");
    assert_eq!(json["stateKind"], "doubled");
    assert_eq!(json["value"], 2);
    assert_eq!(json["owner"], "white");

    let bad = serde_json::json!({ "stateKind": "doubled", "owner": "white", "value": 3 });
    assert!(serde_json::from_value::<strictly_backgammon::CubeState>(bad).is_err());
}
