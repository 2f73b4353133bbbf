//! Shared fixtures for integration tests.

#![allow(dead_code)]

use strictly_backgammon::{
    AnyGame, Board, Color, DieRoller, Direction, Game, GameStateKind, Player, RandomRoller,
    ScriptedRoller,
};

/// Black moves clockwise, white counterclockwise.
pub fn seats() -> (Player, Player) {
    (
        Player::new("black", Color::Black, Direction::Clockwise, true),
        Player::new("white", Color::White, Direction::Counterclockwise, true),
    )
}

/// A standard game waiting for the opening roll.
pub fn fresh_game() -> AnyGame {
    let (black, white) = seats();
    Game::new(black, white).expect("Valid game").into()
}

/// Rolls for start and then for the first turn with scripted faces.
pub fn rolled_game(faces: &[u8]) -> (AnyGame, ScriptedRoller) {
    let mut roller = ScriptedRoller::new(faces).expect("Valid faces");
    let game = fresh_game()
        .roll_for_start(&mut roller)
        .expect("Opening roll")
        .roll(&mut roller)
        .expect("Turn roll");
    (game, roller)
}

/// A player of `color` moving along `board`, holding a scripted roll.
pub fn rolled_player(board: &Board, color: Color, first: u8, second: u8) -> Player {
    let mut roller = ScriptedRoller::new(&[first, second]).expect("Valid faces");
    Player::new(color.to_string(), color, board.direction_of(color), true)
        .to_rolling()
        .expect("Inactive player can take the turn")
        .roll(&mut roller)
        .expect("Rolling player can roll")
}

/// Advances a robot game by one action; `None` once the game is over.
pub fn robot_step<R: DieRoller + ?Sized>(game: &AnyGame, roller: &mut R) -> Option<AnyGame> {
    let next = match game.kind() {
        GameStateKind::RollingForStart => game.roll_for_start(roller),
        GameStateKind::RolledForStart | GameStateKind::Rolling => game.roll(roller),
        GameStateKind::Rolled | GameStateKind::PreparingMove | GameStateKind::Doubled => {
            game.to_moving()
        }
        GameStateKind::Doubling => game.accept_double(),
        GameStateKind::Moving => {
            let play = game.active_play().expect("Moving game has a play");
            let player = game.core().player(play.color());
            let best = player
                .best_move(&play.possible_moves())
                .expect("Moving play has a legal move");
            game.move_checker(best.origin, Some(best.die_value))
        }
        GameStateKind::Moved => game.confirm_turn(),
        GameStateKind::Completed => return None,
    };
    Some(next.expect("Robot action is legal"))
}

/// Every state of a seeded robot game, stopping after `max_steps` actions.
pub fn self_play(seed: u64, max_steps: usize) -> Vec<AnyGame> {
    let mut roller = RandomRoller::seeded(seed);
    let mut states = vec![fresh_game()];
    for _ in 0..max_steps {
        let Some(next) = states.last().and_then(|g| robot_step(g, &mut roller)) else {
            break;
        };
        states.push(next);
    }
    states
}
