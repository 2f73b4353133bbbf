//! Dice, their state machine, and pluggable randomness.

use crate::error::GammonError;
use crate::types::{Color, DieValue, Roll};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────
//  Randomness sources
// ─────────────────────────────────────────────────────────────

/// Source of die faces.
pub trait DieRoller {
    /// Produces one die face.
    fn roll_die(&mut self) -> DieValue;
}

/// Uniform die rolls backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomRoller<R> {
    rng: R,
}

impl<R: Rng> RandomRoller<R> {
    /// Wraps an existing generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomRoller<StdRng> {
    /// Deterministic roller for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Roller seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> DieRoller for RandomRoller<R> {
    fn roll_die(&mut self) -> DieValue {
        DieValue(self.rng.gen_range(DieValue::MIN..=DieValue::MAX))
    }
}

/// Replays a fixed sequence of faces, wrapping around at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedRoller {
    faces: Vec<DieValue>,
    cursor: usize,
}

impl ScriptedRoller {
    /// Creates a roller from raw faces; the sequence must be non-empty.
    pub fn new(faces: &[u8]) -> Result<Self, GammonError> {
        if faces.is_empty() {
            return Err(GammonError::encoding("scripted roller needs at least one face"));
        }
        let faces = faces
            .iter()
            .map(|f| DieValue::new(*f))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { faces, cursor: 0 })
    }

    /// Faces handed out so far.
    pub fn rolled(&self) -> usize {
        self.cursor
    }
}

impl DieRoller for ScriptedRoller {
    fn roll_die(&mut self) -> DieValue {
        let face = self.faces[self.cursor % self.faces.len()];
        self.cursor += 1;
        face
    }
}

// ─────────────────────────────────────────────────────────────
//  Dice state machine
// ─────────────────────────────────────────────────────────────

/// State tag of a pair of dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DiceStateKind {
    /// Not this player's turn.
    Inactive,
    /// Waiting for the opening roll.
    RollingForStart,
    /// Opening die thrown.
    RolledForStart,
    /// About to roll for a turn.
    Rolling,
    /// Turn roll available.
    Rolled,
}

/// State of a pair of dice with its state-specific data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stateKind", rename_all = "kebab-case")]
pub enum DiceState {
    /// Not this player's turn.
    Inactive,
    /// Waiting for the opening roll.
    RollingForStart,
    /// Opening die thrown; the second die stays blank.
    RolledForStart {
        /// The single opening face.
        value: DieValue,
    },
    /// About to roll for a turn.
    Rolling,
    /// Turn roll available.
    Rolled {
        /// Both faces, in presentation order.
        roll: Roll,
    },
}

impl DiceState {
    /// Returns the state tag.
    pub fn kind(&self) -> DiceStateKind {
        match self {
            DiceState::Inactive => DiceStateKind::Inactive,
            DiceState::RollingForStart => DiceStateKind::RollingForStart,
            DiceState::RolledForStart { .. } => DiceStateKind::RolledForStart,
            DiceState::Rolling => DiceStateKind::Rolling,
            DiceState::Rolled { .. } => DiceStateKind::Rolled,
        }
    }
}

/// One player's pair of dice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    id: Uuid,
    color: Color,
    state: DiceState,
}

impl Dice {
    /// Creates inactive dice for a color.
    pub fn new(color: Color) -> Self {
        Self {
            id: Uuid::new_v4(),
            color,
            state: DiceState::Inactive,
        }
    }

    pub(crate) fn restore(id: Uuid, color: Color, state: DiceState) -> Self {
        Self { id, color, state }
    }

    /// Dice identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owning color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Current state.
    pub fn state(&self) -> &DiceState {
        &self.state
    }

    /// Current turn roll, if rolled.
    pub fn current_roll(&self) -> Option<Roll> {
        match self.state {
            DiceState::Rolled { roll } => Some(roll),
            _ => None,
        }
    }

    /// Opening face, if thrown.
    pub fn roll_for_start_value(&self) -> Option<DieValue> {
        match self.state {
            DiceState::RolledForStart { value } => Some(value),
            _ => None,
        }
    }

    /// Sum of the two faces of the current roll.
    pub fn total(&self) -> Option<u8> {
        self.current_roll()
            .map(|r| r.first().get() + r.second().get())
    }

    /// Whether the current roll is a double.
    pub fn is_double(&self) -> Result<bool, GammonError> {
        self.current_roll()
            .map(|r| r.is_double())
            .ok_or_else(|| self.wrong_state("inspect", "rolled"))
    }

    fn wrong_state(&self, operation: &'static str, expected: &str) -> GammonError {
        GammonError::illegal_transition("dice", operation, self.state.kind(), expected)
    }

    /// Arms the dice for the opening roll, or re-arms them after a tie.
    pub fn to_rolling_for_start(self) -> Result<Self, GammonError> {
        match self.state {
            DiceState::Inactive | DiceState::RollingForStart | DiceState::RolledForStart { .. } => Ok(Self {
                state: DiceState::RollingForStart,
                ..self
            }),
            _ => Err(self.wrong_state("arm for start", "inactive or rolled-for-start")),
        }
    }

    /// Throws the single opening die.
    #[instrument(skip(self, roller), fields(color = %self.color))]
    pub fn roll_for_start<R: DieRoller + ?Sized>(self, roller: &mut R) -> Result<Self, GammonError> {
        if self.state != DiceState::RollingForStart {
            return Err(self.wrong_state("roll for start", "rolling-for-start"));
        }
        let value = roller.roll_die();
        debug!(value = %value, "Rolled for start");
        Ok(Self {
            state: DiceState::RolledForStart { value },
            ..self
        })
    }

    /// Readies the dice for a turn roll.
    pub fn to_rolling(self) -> Result<Self, GammonError> {
        match self.state {
            DiceState::Inactive | DiceState::RolledForStart { .. } | DiceState::Rolling => Ok(Self {
                state: DiceState::Rolling,
                ..self
            }),
            _ => Err(self.wrong_state("ready", "inactive or rolled-for-start")),
        }
    }

    /// Throws both dice for a turn.
    #[instrument(skip(self, roller), fields(color = %self.color))]
    pub fn roll<R: DieRoller + ?Sized>(self, roller: &mut R) -> Result<Self, GammonError> {
        if self.state != DiceState::Rolling {
            return Err(self.wrong_state("roll", "rolling"));
        }
        let roll = Roll::new(roller.roll_die(), roller.roll_die());
        debug!(roll = %roll, "Rolled");
        Ok(Self {
            state: DiceState::Rolled { roll },
            ..self
        })
    }

    /// Swaps the order of the two faces.
    pub fn switch_dice(self) -> Result<Self, GammonError> {
        match self.state {
            DiceState::Rolled { roll } => Ok(Self {
                state: DiceState::Rolled {
                    roll: roll.switched(),
                },
                ..self
            }),
            _ => Err(self.wrong_state("switch", "rolled")),
        }
    }

    /// Puts the dice away at the end of a turn.
    pub fn deactivate(self) -> Self {
        Self {
            state: DiceState::Inactive,
            ..self
        }
    }
}
