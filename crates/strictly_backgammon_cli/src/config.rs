//! Match configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strictly_backgammon::{Color, Direction, GameSettings, Player};
use tracing::{debug, info, instrument};

/// Configuration for a robot match.
///
/// ```toml
/// seed = 7
/// max_turns = 400
///
/// [black]
/// user_id = "gnubg-lite"
/// direction = "counterclockwise"
///
/// [settings]
/// allow_undo = false
/// enforce_cube_ownership = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Seed for the dice; fresh entropy when absent.
    #[serde(default)]
    seed: Option<u64>,

    /// Turns played before the match is abandoned.
    #[serde(default = "default_max_turns")]
    max_turns: u32,

    /// Black's seat.
    #[serde(default = "default_black_seat")]
    black: SeatConfig,

    /// White's seat.
    #[serde(default = "default_white_seat")]
    white: SeatConfig,

    /// Rule switches.
    #[serde(default)]
    settings: SettingsConfig,
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct SeatConfig {
    /// Account name shown in the history.
    user_id: String,

    /// Direction of travel; black defaults to clockwise, white to the opposite.
    #[serde(default)]
    direction: Option<Direction>,

    /// Whether the seat is played by the driver.
    #[serde(default = "default_is_robot")]
    is_robot: bool,
}

/// Rule switches, mirrored into [`GameSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Whether a robot may take back moves.
    #[serde(default = "default_allow_undo")]
    allow_undo: bool,

    /// Whether only the cube owner may redouble.
    #[serde(default)]
    enforce_cube_ownership: bool,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            allow_undo: default_allow_undo(),
            enforce_cube_ownership: false,
        }
    }
}

fn default_max_turns() -> u32 {
    1000
}

fn default_is_robot() -> bool {
    true
}

fn default_allow_undo() -> bool {
    true
}

fn default_black_seat() -> SeatConfig {
    SeatConfig {
        user_id: "black-robot".to_string(),
        direction: None,
        is_robot: true,
    }
}

fn default_white_seat() -> SeatConfig {
    SeatConfig {
        user_id: "white-robot".to_string(),
        direction: None,
        is_robot: true,
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_turns: default_max_turns(),
            black: default_black_seat(),
            white: default_white_seat(),
            settings: SettingsConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading match config");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(
            black = %config.black.user_id,
            white = %config.white.user_id,
            "Match config loaded"
        );
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::new("max_turns must be at least 1".to_string()));
        }
        let (black, white) = self.directions();
        if black == white {
            return Err(ConfigError::new(format!("both seats travel {}", black)));
        }
        if self.black.user_id == self.white.user_id {
            return Err(ConfigError::new(format!(
                "both seats use the account {}",
                self.black.user_id
            )));
        }
        Ok(())
    }

    /// Overrides the dice seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    /// Overrides the turn limit.
    pub fn with_max_turns(mut self, max_turns: Option<u32>) -> Self {
        if let Some(max_turns) = max_turns {
            self.max_turns = max_turns.max(1);
        }
        self
    }

    /// Directions of black and white, filling in whichever is unset.
    pub fn directions(&self) -> (Direction, Direction) {
        match (self.black.direction, self.white.direction) {
            (Some(black), Some(white)) => (black, white),
            (Some(black), None) => (black, black.opposite()),
            (None, Some(white)) => (white.opposite(), white),
            (None, None) => (Direction::Clockwise, Direction::Counterclockwise),
        }
    }

    /// Players for both seats.
    pub fn players(&self) -> (Player, Player) {
        let (black_direction, white_direction) = self.directions();
        (
            Player::new(
                self.black.user_id.clone(),
                Color::Black,
                black_direction,
                self.black.is_robot,
            ),
            Player::new(
                self.white.user_id.clone(),
                Color::White,
                white_direction,
                self.white.is_robot,
            ),
        )
    }

    /// Engine settings for the match.
    pub fn game_settings(&self) -> GameSettings {
        GameSettings::new(self.settings.allow_undo, self.settings.enforce_cube_ownership)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
