//! The doubling cube.

use crate::error::{GammonError, IllegalMoveReason};
use crate::types::Color;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

/// A cube face: 2, 4, 8, 16, 32 or 64.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct CubeValue(u8);

impl CubeValue {
    /// Highest face.
    pub const MAX: CubeValue = CubeValue(64);

    /// First face after a take.
    pub fn first() -> Self {
        Self(2)
    }

    /// Face as a number.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Next face up, if any.
    pub fn doubled(self) -> Option<Self> {
        (self < Self::MAX).then(|| Self(self.0 * 2))
    }
}

impl TryFrom<u8> for CubeValue {
    type Error = GammonError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (2..=64).contains(&value) && value.is_power_of_two() {
            Ok(Self(value))
        } else {
            Err(GammonError::encoding(format!("{} is not a cube face", value)))
        }
    }
}

impl From<CubeValue> for u8 {
    fn from(value: CubeValue) -> Self {
        value.0
    }
}

/// State tag of the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CubeStateKind {
    /// Centered, never turned.
    Initialized,
    /// A double is on the table.
    Offered,
    /// Owned at a value.
    Doubled,
    /// At 64; nobody may double again.
    Maxxed,
}

/// Cube state with its state-specific data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "stateKind", rename_all = "kebab-case")]
pub enum CubeState {
    /// Centered, never turned.
    Initialized,
    /// A double is on the table; owner and value are those before the offer.
    #[serde(rename_all = "camelCase")]
    Offered {
        /// Color offering the double.
        offered_by: Color,
        /// Owner before the offer.
        owner: Option<Color>,
        /// Value before the offer.
        value: Option<CubeValue>,
    },
    /// Owned at a value.
    Doubled {
        /// Owner, who alone may redouble.
        owner: Color,
        /// Current value.
        value: CubeValue,
    },
    /// At 64; nobody may double again.
    Maxxed,
}

/// The doubling cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cube {
    id: Uuid,
    state: CubeState,
}

impl Default for Cube {
    fn default() -> Self {
        Self::new()
    }
}

impl Cube {
    /// Centered cube.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: CubeState::Initialized,
        }
    }

    pub(crate) fn restore(id: Uuid, state: CubeState) -> Self {
        Self { id, state }
    }

    /// Cube id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> &CubeState {
        &self.state
    }

    /// State tag.
    pub fn kind(&self) -> CubeStateKind {
        match self.state {
            CubeState::Initialized => CubeStateKind::Initialized,
            CubeState::Offered { .. } => CubeStateKind::Offered,
            CubeState::Doubled { .. } => CubeStateKind::Doubled,
            CubeState::Maxxed => CubeStateKind::Maxxed,
        }
    }

    /// Value in force (before any pending offer).
    pub fn value(&self) -> Option<CubeValue> {
        match self.state {
            CubeState::Initialized => None,
            CubeState::Offered { value, .. } => value,
            CubeState::Doubled { value, .. } => Some(value),
            CubeState::Maxxed => Some(CubeValue::MAX),
        }
    }

    /// Owner in force (before any pending offer).
    pub fn owner(&self) -> Option<Color> {
        match self.state {
            CubeState::Offered { owner, .. } => owner,
            CubeState::Doubled { owner, .. } => Some(owner),
            CubeState::Initialized | CubeState::Maxxed => None,
        }
    }

    /// Color with a pending offer.
    pub fn offered_by(&self) -> Option<Color> {
        match self.state {
            CubeState::Offered { offered_by, .. } => Some(offered_by),
            _ => None,
        }
    }

    /// Points the game is worth at the value in force.
    pub fn stake(&self) -> u8 {
        self.value().map_or(1, CubeValue::get)
    }

    /// Checks that `color` may offer a double.
    ///
    /// The cube may never pass 64. When `enforce_ownership` is set, a cube
    /// owned by the opponent cannot be turned either.
    pub fn can_double(&self, color: Color, enforce_ownership: bool) -> Result<(), GammonError> {
        match self.state {
            CubeState::Maxxed => Err(IllegalMoveReason::CubeMaxxed.into()),
            CubeState::Offered { .. } => Err(GammonError::illegal_transition(
                "cube",
                "offer",
                self.kind(),
                "initialized or doubled",
            )),
            CubeState::Doubled { owner, .. } if enforce_ownership && owner != color => {
                Err(IllegalMoveReason::CubeOwnedByOpponent(owner).into())
            }
            CubeState::Initialized | CubeState::Doubled { .. } => Ok(()),
        }
    }

    /// Puts a double on the table.
    #[instrument(skip(self), fields(state = %self.kind()))]
    pub fn offer(self, by: Color, enforce_ownership: bool) -> Result<Cube, GammonError> {
        self.can_double(by, enforce_ownership)?;
        Ok(Cube {
            state: CubeState::Offered {
                offered_by: by,
                owner: self.owner(),
                value: self.value(),
            },
            ..self
        })
    }

    /// The opponent takes: the cube turns and passes to the taker.
    #[instrument(skip(self), fields(state = %self.kind()))]
    pub fn accept(self) -> Result<Cube, GammonError> {
        let CubeState::Offered {
            offered_by, value, ..
        } = self.state
        else {
            return Err(GammonError::illegal_transition("cube", "accept", self.kind(), "offered"));
        };
        let next = match value {
            None => CubeValue::first(),
            Some(v) => v.doubled().ok_or(IllegalMoveReason::CubeMaxxed)?,
        };
        let state = if next == CubeValue::MAX {
            CubeState::Maxxed
        } else {
            CubeState::Doubled {
                owner: offered_by.opponent(),
                value: next,
            }
        };
        info!(value = next.get(), taker = %offered_by.opponent(), "Double accepted");
        Ok(Cube { state, ..self })
    }

    /// Takes the pending offer back off the table, restoring the prior state.
    pub fn withdraw(self) -> Result<Cube, GammonError> {
        let CubeState::Offered { owner, value, .. } = self.state else {
            return Err(GammonError::illegal_transition("cube", "withdraw", self.kind(), "offered"));
        };
        let state = match (owner, value) {
            (Some(owner), Some(value)) => CubeState::Doubled { owner, value },
            (None, Some(_)) => CubeState::Maxxed,
            _ => CubeState::Initialized,
        };
        Ok(Cube { state, ..self })
    }

    /// Offer and take in one step.
    pub fn double(self, by: Color, enforce_ownership: bool) -> Result<Cube, GammonError> {
        self.offer(by, enforce_ownership)?.accept()
    }
}
