//! State shared by every phase of a game.

use crate::board::Board;
use crate::cube::Cube;
use crate::error::GammonError;
use crate::player::{Player, Players};
use crate::types::Color;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_allow_undo() -> bool {
    true
}

/// Rule switches fixed for the lifetime of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Whether moves may be taken back before the turn is confirmed.
    #[serde(default = "default_allow_undo")]
    allow_undo: bool,
    /// Whether only the cube owner may redouble.
    #[serde(default)]
    enforce_cube_ownership: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            allow_undo: default_allow_undo(),
            enforce_cube_ownership: false,
        }
    }
}

impl GameSettings {
    /// Settings with explicit switches.
    pub fn new(allow_undo: bool, enforce_cube_ownership: bool) -> Self {
        Self {
            allow_undo,
            enforce_cube_ownership,
        }
    }
}

/// Board, cube, seats and bookkeeping common to every phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GameCore {
    /// Game id.
    pub(crate) id: Uuid,
    /// Both seats.
    pub(crate) players: Players,
    /// Checker layout.
    pub(crate) board: Board,
    /// Doubling cube.
    pub(crate) cube: Cube,
    /// Rule switches.
    pub(crate) settings: GameSettings,
    /// Completed turns so far.
    pub(crate) turn_number: u32,
    /// Creation time.
    pub(crate) created_at: DateTime<Utc>,
    /// Time of the last transition.
    pub(crate) last_update: DateTime<Utc>,
}

impl GameCore {
    /// Seats players on a board, checking that the board orientation matches.
    pub(crate) fn new(
        players: Players,
        board: Board,
        cube: Cube,
        settings: GameSettings,
    ) -> Result<Self, GammonError> {
        if board.black_direction() != players.get(Color::Black).direction() {
            return Err(GammonError::encoding(
                "board orientation does not match black's direction",
            ));
        }
        let now = Utc::now();
        let mut core = Self {
            id: Uuid::new_v4(),
            players,
            board,
            cube,
            settings,
            turn_number: 0,
            created_at: now,
            last_update: now,
        };
        core.refresh_pip_counts();
        Ok(core)
    }

    /// Player of a color.
    pub fn player(&self, color: Color) -> &Player {
        self.players.get(color)
    }

    pub(crate) fn touch(&mut self) {
        self.last_update = Utc::now();
    }

    pub(crate) fn refresh_pip_counts(&mut self) {
        self.players.refresh_pip_counts(&self.board);
    }
}
