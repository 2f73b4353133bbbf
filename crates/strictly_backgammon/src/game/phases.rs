//! Phase types for the game typestate.
//!
//! Each phase carries exactly the data that exists in that state: a
//! `Rolling` game has an active color but no play, a `Moving` game always
//! has a play, and a `Completed` game always has an outcome.

use crate::play::Play;
use crate::types::Color;
use serde::{Deserialize, Serialize};

/// State tag of a game.
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
pub enum GameStateKind {
    /// Both players throw one die.
    RollingForStart,
    /// Opening roll decided; the winner rolls next.
    RolledForStart,
    /// Active player about to roll.
    Rolling,
    /// Turn roll available.
    Rolled,
    /// Origin selection open.
    PreparingMove,
    /// Double offered, waiting for the opponent.
    Doubling,
    /// Double accepted.
    Doubled,
    /// Checkers moving.
    Moving,
    /// Every die resolved, waiting for confirmation.
    Moved,
    /// Game over.
    Completed,
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CompletionReason {
    /// The winner bore off all fifteen checkers.
    BoreOff,
    /// The loser refused a double.
    DoubleDeclined,
    /// The loser resigned.
    Resigned,
    /// The loser ran out of time.
    TimedOut,
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    /// Winning color.
    pub winner: Color,
    /// How the game ended.
    pub reason: CompletionReason,
    /// Points won (the cube value in force, or 1).
    pub stake: u8,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} wins {} ({})", self.winner, self.stake, self.reason)
    }
}

/// Marker implemented by every phase.
pub trait Phase: Clone {
    /// Tag of the phase.
    const KIND: GameStateKind;

    /// Color whose turn it is, when there is one.
    fn active_color(&self) -> Option<Color>;

    /// The turn in progress, when there is one.
    fn play(&self) -> Option<&Play> {
        None
    }
}

/// Phases in which a player may still resign.
pub trait Ongoing: Phase {}

// ─────────────────────────────────────────────────────────────
//  Opening
// ─────────────────────────────────────────────────────────────

/// Both players are about to throw one die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingForStart;

impl Phase for RollingForStart {
    const KIND: GameStateKind = GameStateKind::RollingForStart;

    fn active_color(&self) -> Option<Color> {
        None
    }
}

impl Ongoing for RollingForStart {}

/// The opening roll picked a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolledForStart {
    pub(crate) active_color: Color,
}

/// The active player is about to roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rolling {
    pub(crate) active_color: Color,
}

macro_rules! colored_phase {
    ($($phase:ident),*) => {$(
        impl $phase {
            /// Color on roll.
            pub fn color(&self) -> Color {
                self.active_color
            }
        }

        impl Phase for $phase {
            const KIND: GameStateKind = GameStateKind::$phase;

            fn active_color(&self) -> Option<Color> {
                Some(self.active_color)
            }
        }

        impl Ongoing for $phase {}
    )*};
}

colored_phase!(RolledForStart, Rolling);

// ─────────────────────────────────────────────────────────────
//  Turn phases
// ─────────────────────────────────────────────────────────────

macro_rules! turn_phase {
    ($($(#[$doc:meta])* $phase:ident),* $(,)?) => {$(
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $phase {
            pub(crate) active_color: Color,
            pub(crate) play: Play,
        }

        impl Phase for $phase {
            const KIND: GameStateKind = GameStateKind::$phase;

            fn active_color(&self) -> Option<Color> {
                Some(self.active_color)
            }

            fn play(&self) -> Option<&Play> {
                Some(&self.play)
            }
        }

        impl Ongoing for $phase {}
    )*};
}

turn_phase!(
    /// Dice rolled; the turn exists but nothing is selected.
    Rolled,
    /// Origin selection open.
    PreparingMove,
    /// Double offered; the turn waits on the opponent.
    Doubling,
    /// Double taken; the offerer moves at the new stake.
    Doubled,
    /// Checkers moving.
    Moving,
    /// Every die resolved.
    Moved,
);

// ─────────────────────────────────────────────────────────────
//  Terminal
// ─────────────────────────────────────────────────────────────

/// The game is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completed {
    pub(crate) outcome: Outcome,
}

impl Completed {
    /// The outcome; always present.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
}

impl Phase for Completed {
    const KIND: GameStateKind = GameStateKind::Completed;

    fn active_color(&self) -> Option<Color> {
        None
    }
}
