//! Strictly Backgammon - a backgammon state machine and legal-move engine.
//!
//! Every stateful entity (dice, cube, move, play, player, game) is a small
//! state machine whose transitions consume the old value and return a new
//! one. The game itself is a typestate: `Game<Rolled>` can only be played
//! from, `Game<Moved>` can only be confirmed or undone, and so on. The
//! [`AnyGame`] wrapper carries a game in any phase across serialization
//! and wire boundaries.
//!
//! # Architecture
//!
//! - **Board**: containers (24 points, two bars, two off trays) and a
//!   dual-coordinate point numbering for the two directions of travel
//! - **Rules**: move generation, blocking, bear-off and win detection
//! - **Game**: the ten-phase turn cycle with doubling, undo, resignation
//!   and timeouts
//! - **Invariants / Contracts**: checker conservation, single-color points,
//!   pip bounds and move-count checks around every transition
//! - **Snapshots / History**: versioned JSON snapshots, an append-only action
//!   log, and GNU Backgammon position ids
//! - **Messages**: pure handlers for transport envelopes
//!
//! # Example
//!
//! ```
//! use strictly_backgammon::{
//!     AnyGame, Color, ContainerId, Direction, Game, GameStateKind, Player, ScriptedRoller,
//! };
//!
//! # fn main() -> Result<(), strictly_backgammon::GammonError> {
//! let mut roller = ScriptedRoller::new(&[5, 2, 6, 1])?;
//! let game: AnyGame = Game::new(
//!     Player::new("alice", Color::Black, Direction::Clockwise, false),
//!     Player::new("bob", Color::White, Direction::Counterclockwise, false),
//! )?
//! .into();
//!
//! let game = game.roll_for_start(&mut roller)?.roll(&mut roller)?;
//! let game = game.move_checker(ContainerId::point(13), None)?;
//! let game = game.move_checker(ContainerId::point(8), None)?;
//! let game = game.confirm_turn()?;
//! assert_eq!(game.kind(), GameStateKind::Rolling);
//! assert_eq!(game.active_color(), Some(Color::White));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod action;
pub mod board;
pub mod contracts;
pub mod cube;
pub mod dice;
pub mod error;
pub mod game;
pub mod history;
pub mod invariants;
pub mod messages;
pub mod play;
pub mod player;
pub mod position_id;
pub mod rules;
pub mod snapshot;
pub mod types;

// Crate-level exports - Primitives
pub use types::{
    BAR_POSITION, CHECKERS_PER_PLAYER, Color, DieValue, Direction, HOME_BOARD_SIZE,
    MAX_PIP_COUNT, PIP_COUNT_CEILING, POINT_COUNT, PipCounts, Roll,
};

// Crate-level exports - Errors
pub use error::{GammonError, IllegalMoveReason};

// Crate-level exports - Board
pub use board::{
    Bar, Board, BoardImportEntry, Checker, CheckerContainer, CheckerId, ContainerId, Off, Point,
    standard_import,
};

// Crate-level exports - Entities
pub use action::{Move, MoveKind, MoveSkeleton, MoveState, MoveStateKind, Resolution};
pub use cube::{Cube, CubeState, CubeStateKind, CubeValue};
pub use dice::{Dice, DiceState, DiceStateKind, DieRoller, RandomRoller, ScriptedRoller};
pub use play::{Play, PlayState};
pub use player::{Player, PlayerState, Players};

// Crate-level exports - Game
pub use game::{
    AnyGame, CompletionReason, Game, GameCore, GameSettings, GameStateKind, MoveTransition,
    Outcome, StartTransition, TimeoutAction, TurnTransition,
};

// Crate-level exports - Verification
pub use contracts::{Contract, sanity_check_moving_game};
pub use invariants::{Invariant, InvariantSet, InvariantViolation};

// Crate-level exports - Serialization
pub use history::{GameActionType, GameHistory, GameHistoryAction};
pub use messages::{Envelope, Handled, MessageType, handle_message};
pub use position_id::{PositionKey, START_POSITION_ID, position_id};
pub use snapshot::{GameStateSnapshot, SNAPSHOT_VERSION};
