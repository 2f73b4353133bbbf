//! Core value types for backgammon.

use crate::error::GammonError;
use serde::{Deserialize, Serialize};

/// Checkers each color owns for the whole game.
pub const CHECKERS_PER_PLAYER: u8 = 15;

/// Pip count of the standard starting position.
pub const MAX_PIP_COUNT: u16 = 167;

/// Number of points on the board.
pub const POINT_COUNT: u8 = 24;

/// Own-frame position of the bar: one step beyond the farthest point.
pub const BAR_POSITION: u8 = 25;

/// Points in a home board.
pub const HOME_BOARD_SIZE: u8 = 6;

/// Largest pip count a seat can physically reach (every checker on the bar).
pub const PIP_COUNT_CEILING: u16 = CHECKERS_PER_PLAYER as u16 * BAR_POSITION as u16;

// ─────────────────────────────────────────────────────────────
//  Color & Direction
// ─────────────────────────────────────────────────────────────

/// Checker color.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    /// Black checkers.
    Black,
    /// White checkers.
    White,
}

impl Color {
    /// Both colors, black first.
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    /// Returns the other color.
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-character glyph used in board renderings.
    pub fn glyph(self) -> char {
        match self {
            Color::Black => 'X',
            Color::White => 'O',
        }
    }
}

/// Direction a player's checkers travel for the whole game.
///
/// Points carry a canonical index that counts up in the clockwise
/// player's own numbering. A clockwise player's point N is therefore
/// index N; a counterclockwise player's point N is index `25 - N`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Numbering agrees with the canonical index.
    Clockwise,
    /// Numbering mirrors the canonical index.
    Counterclockwise,
}

impl Direction {
    /// Returns the other direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::Counterclockwise,
            Direction::Counterclockwise => Direction::Clockwise,
        }
    }

    /// Converts a point number in this direction's own frame to the canonical index.
    pub fn to_canonical(self, own: u8) -> u8 {
        match self {
            Direction::Clockwise => own,
            Direction::Counterclockwise => POINT_COUNT + 1 - own,
        }
    }

    /// Converts a canonical point index into this direction's own frame.
    pub fn from_canonical(self, index: u8) -> u8 {
        // The mapping is its own inverse.
        self.to_canonical(index)
    }
}

// ─────────────────────────────────────────────────────────────
//  Die values & rolls
// ─────────────────────────────────────────────────────────────

/// Face value of one die, always within 1..=6.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct DieValue(pub(crate) u8);

impl DieValue {
    /// Lowest face.
    pub const MIN: u8 = 1;
    /// Highest face.
    pub const MAX: u8 = 6;

    /// Creates a die value, rejecting anything outside 1..=6.
    pub fn new(value: u8) -> Result<Self, GammonError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(GammonError::encoding(format!(
                "die value {} is outside {}..={}",
                value,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Returns the face as a number.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Iterates every face from 1 to 6.
    pub fn all() -> impl Iterator<Item = DieValue> {
        (Self::MIN..=Self::MAX).map(DieValue)
    }
}

impl TryFrom<u8> for DieValue {
    type Error = GammonError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DieValue> for u8 {
    fn from(value: DieValue) -> Self {
        value.0
    }
}

impl std::fmt::Display for DieValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pair of dice as rolled, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roll(DieValue, DieValue);

impl Roll {
    /// Creates a roll from two faces.
    pub fn new(first: DieValue, second: DieValue) -> Self {
        Self(first, second)
    }

    /// Creates a roll from raw numbers.
    pub fn from_values(first: u8, second: u8) -> Result<Self, GammonError> {
        Ok(Self(DieValue::new(first)?, DieValue::new(second)?))
    }

    /// First die.
    pub fn first(&self) -> DieValue {
        self.0
    }

    /// Second die.
    pub fn second(&self) -> DieValue {
        self.1
    }

    /// Whether both dice show the same face.
    pub fn is_double(&self) -> bool {
        self.0 == self.1
    }

    /// Returns the roll with its dice swapped.
    pub fn switched(&self) -> Self {
        Self(self.1, self.0)
    }

    /// Die values the roll entitles the mover to: four for a double, else two.
    pub fn die_values(&self) -> Vec<DieValue> {
        if self.is_double() {
            vec![self.0; 4]
        } else {
            vec![self.0, self.1]
        }
    }

    /// Pips the roll is worth when fully played.
    pub fn pip_total(&self) -> u8 {
        self.die_values().iter().map(|d| d.get()).sum()
    }
}

impl std::fmt::Display for Roll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Pip counts of both colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PipCounts {
    /// Black's pip count.
    pub black: u16,
    /// White's pip count.
    pub white: u16,
}

impl PipCounts {
    /// Returns the count for one color.
    pub fn get(&self, color: Color) -> u16 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }
}
