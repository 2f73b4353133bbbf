//! Top-level game state machine.
//!
//! # Architecture
//!
//! - [`phases`]: one type per state kind, plus the outcome of a finished game
//! - [`core`]: board, cube, seats and settings shared by every phase
//! - [`typestate`]: `Game<S>` and its consuming transitions
//! - [`wrapper`]: `AnyGame`, the serializable sum over all phases
//!
//! ```text
//! rolling-for-start → rolled-for-start → rolled → preparing-move
//!   → moving → moved → rolling → rolled → …
//!   → doubling → doubled → moving
//!   → completed
//! ```

pub mod core;
pub mod phases;
pub mod typestate;
pub mod wrapper;

pub use self::core::{GameCore, GameSettings};
pub use phases::{
    CompletionReason, Completed, Doubled, Doubling, GameStateKind, Moved, Moving, Ongoing,
    Outcome, Phase, PreparingMove, RolledForStart, Rolled, Rolling, RollingForStart,
};
pub use typestate::{Game, MoveTransition, StartTransition, TurnTransition};
pub use wrapper::{AnyGame, TimeoutAction};
