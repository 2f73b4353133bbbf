//! Full game snapshots for history records and reloading.
//!
//! A [`GameStateSnapshot`] holds every field of a game, laid out point by
//! point, so that [`GameStateSnapshot::reconstruct`] yields a game equal to
//! the one captured. Derived fields (pip counts, position id, available and
//! used dice, move number) are written for readers and cross-checked on
//! reconstruction.

use crate::action::MoveKind;
use crate::board::{Board, CheckerContainer, CheckerId, ContainerId};
use crate::contracts::verify;
use crate::cube::{Cube, CubeState, CubeValue};
use crate::dice::{Dice, DiceState, DiceStateKind};
use crate::error::GammonError;
use crate::game::{
    AnyGame, Completed, Doubled, Doubling, Game, GameCore, GameSettings, GameStateKind, Moved,
    Moving, Outcome, PreparingMove, RolledForStart, Rolled, Rolling, RollingForStart,
};
use crate::invariants::{Invariant, MoveCountInvariant};
use crate::play::Play;
use crate::player::{Player, PlayerState, Players};
use crate::position_id::position_id;
use crate::types::{Color, DieValue, Direction, PipCounts, Roll};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One value per color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair<T> {
    /// Black's value.
    pub black: T,
    /// White's value.
    pub white: T,
}

impl<T> ColorPair<T> {
    /// Builds a pair by evaluating `f` for each color.
    pub fn from_fn(mut f: impl FnMut(Color) -> T) -> Self {
        Self {
            black: f(Color::Black),
            white: f(Color::White),
        }
    }

    /// Value of one color.
    pub fn get(&self, color: Color) -> &T {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Parts
// ─────────────────────────────────────────────────────────────

/// One checker in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerSnapshot {
    /// Checker id.
    pub id: CheckerId,
    /// Checker color.
    pub color: Color,
}

/// Checker layout, bottom of each stack first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPositionSnapshot {
    /// Direction black moves in.
    pub black_direction: Direction,
    /// Occupied points keyed by canonical index.
    pub points: BTreeMap<u8, Vec<CheckerSnapshot>>,
    /// Checkers on the bar.
    pub bar: ColorPair<Vec<CheckerSnapshot>>,
    /// Checkers borne off.
    pub off: ColorPair<Vec<CheckerSnapshot>>,
}

fn stack(container: &dyn CheckerContainer) -> Vec<CheckerSnapshot> {
    container
        .checkers()
        .iter()
        .map(|c| CheckerSnapshot {
            id: c.id(),
            color: c.color(),
        })
        .collect()
}

impl BoardPositionSnapshot {
    /// Captures a board.
    pub fn capture(board: &Board) -> Self {
        Self {
            black_direction: board.black_direction(),
            points: board
                .points()
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| (p.index(), stack(p)))
                .collect(),
            bar: ColorPair::from_fn(|c| stack(board.bar(board.direction_of(c)))),
            off: ColorPair::from_fn(|c| stack(board.off(board.direction_of(c)))),
        }
    }

    /// Rebuilds the board.
    pub fn reconstruct(&self) -> Result<Board, GammonError> {
        let mut board = Board::empty(self.black_direction);
        let mut place = |container: ContainerId, checkers: &[CheckerSnapshot]| {
            checkers
                .iter()
                .try_for_each(|c| board.push_checker(c.id, c.color, container))
        };
        for (&index, checkers) in &self.points {
            place(ContainerId::point(index), checkers)?;
        }
        for color in Color::ALL {
            let direction = if color == Color::Black {
                self.black_direction
            } else {
                self.black_direction.opposite()
            };
            place(ContainerId::bar(direction), self.bar.get(color))?;
            place(ContainerId::off(direction), self.off.get(color))?;
        }
        Ok(board)
    }
}

/// One player's dice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DicePlayerSnapshot {
    /// Dice id.
    pub id: Uuid,
    /// Dice state.
    pub state_kind: DiceStateKind,
    /// Turn roll, when rolled.
    pub current_roll: Option<Roll>,
    /// Opening face, when thrown.
    pub roll_for_start: Option<DieValue>,
    /// Dice of the active turn still to be played.
    pub available_moves: Vec<DieValue>,
    /// Dice of the active turn already resolved.
    pub used_moves: Vec<DieValue>,
}

impl DicePlayerSnapshot {
    fn capture(dice: &Dice, play: Option<&Play>) -> Self {
        let play = play.filter(|p| p.color() == dice.color());
        let faces = |resolved: bool| -> Vec<DieValue> {
            play.map(|p| {
                p.moves()
                    .iter()
                    .filter(|m| m.is_resolved() == resolved)
                    .map(|m| m.die_value())
                    .collect()
            })
            .unwrap_or_default()
        };
        Self {
            id: dice.id(),
            state_kind: dice.state().kind(),
            current_roll: dice.current_roll(),
            roll_for_start: dice.roll_for_start_value(),
            available_moves: faces(false),
            used_moves: faces(true),
        }
    }

    fn reconstruct(&self, color: Color) -> Result<Dice, GammonError> {
        let missing = |field: &str| {
            GammonError::encoding(format!("{} dice are {} without {}", color, self.state_kind, field))
        };
        let state = match self.state_kind {
            DiceStateKind::Inactive => DiceState::Inactive,
            DiceStateKind::RollingForStart => DiceState::RollingForStart,
            DiceStateKind::RolledForStart => DiceState::RolledForStart {
                value: self.roll_for_start.ok_or_else(|| missing("rollForStart"))?,
            },
            DiceStateKind::Rolling => DiceState::Rolling,
            DiceStateKind::Rolled => DiceState::Rolled {
                roll: self.current_roll.ok_or_else(|| missing("currentRoll"))?,
            },
        };
        Ok(Dice::restore(self.id, color, state))
    }
}

/// Cube state tag as written to snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CubeSnapshotKind {
    /// Never turned.
    Centered,
    /// Double pending.
    Offered,
    /// Owned at a value.
    Doubled,
    /// At 64.
    Maxed,
}

/// Where the cube sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CubePosition {
    /// Nobody owns it.
    Center,
    /// Black owns it.
    Black,
    /// White owns it.
    White,
}

/// The doubling cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeStateSnapshot {
    /// Cube id.
    pub id: Uuid,
    /// Value in force; 1 while centered.
    pub value: u8,
    /// Owner in force.
    pub owner: Option<Color>,
    /// Cube state.
    pub state_kind: CubeSnapshotKind,
    /// Where the cube sits.
    pub position: CubePosition,
    /// Color with a pending offer.
    pub offered_by: Option<Color>,
}

impl CubeStateSnapshot {
    fn capture(cube: &Cube) -> Self {
        let state_kind = match cube.state() {
            CubeState::Initialized => CubeSnapshotKind::Centered,
            CubeState::Offered { .. } => CubeSnapshotKind::Offered,
            CubeState::Doubled { .. } => CubeSnapshotKind::Doubled,
            CubeState::Maxxed => CubeSnapshotKind::Maxed,
        };
        let position = match cube.owner() {
            None => CubePosition::Center,
            Some(Color::Black) => CubePosition::Black,
            Some(Color::White) => CubePosition::White,
        };
        Self {
            id: cube.id(),
            value: cube.stake(),
            owner: cube.owner(),
            state_kind,
            position,
            offered_by: cube.offered_by(),
        }
    }

    fn reconstruct(&self) -> Result<Cube, GammonError> {
        let value = match self.value {
            1 => None,
            v => Some(CubeValue::try_from(v)?),
        };
        let state = match (self.state_kind, self.owner, value) {
            (CubeSnapshotKind::Centered, None, None) => CubeState::Initialized,
            (CubeSnapshotKind::Offered, owner, value) => CubeState::Offered {
                offered_by: self
                    .offered_by
                    .ok_or_else(|| GammonError::encoding("offered cube without offeredBy"))?,
                owner,
                value,
            },
            (CubeSnapshotKind::Doubled, Some(owner), Some(value)) => {
                CubeState::Doubled { owner, value }
            }
            (CubeSnapshotKind::Maxed, None, Some(CubeValue::MAX)) => CubeState::Maxxed,
            (kind, owner, value) => {
                return Err(GammonError::encoding(format!(
                    "inconsistent cube: {:?} owned by {:?} at {:?}",
                    kind, owner, value
                )));
            }
        };
        Ok(Cube::restore(self.id, state))
    }
}

/// One seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateSnapshot {
    /// Player id.
    pub id: Uuid,
    /// Account.
    pub user_id: String,
    /// Movement direction.
    pub direction: Direction,
    /// Whether a robot plays the seat.
    pub is_robot: bool,
    /// Player state.
    pub state_kind: PlayerState,
    /// Stored pip count.
    pub pip_count: u16,
    /// Face thrown in the opening roll.
    pub roll_for_start_value: Option<DieValue>,
}

impl PlayerStateSnapshot {
    fn capture(player: &Player) -> Self {
        Self {
            id: player.id(),
            user_id: player.user_id().to_string(),
            direction: player.direction(),
            is_robot: player.is_robot(),
            state_kind: player.state(),
            pip_count: player.pip_count(),
            roll_for_start_value: player.roll_for_start_value(),
        }
    }

    fn reconstruct(&self, color: Color, dice: Dice) -> Player {
        Player {
            id: self.id,
            user_id: self.user_id.clone(),
            color,
            direction: self.direction,
            dice,
            pip_count: self.pip_count,
            is_robot: self.is_robot,
            roll_for_start_value: self.roll_for_start_value,
            state: self.state_kind,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Game snapshot
// ─────────────────────────────────────────────────────────────

/// Everything needed to rebuild a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateSnapshot {
    /// Layout version.
    pub version: u32,
    /// Game id.
    pub game_id: Uuid,
    /// Game state.
    pub state_kind: GameStateKind,
    /// Color on roll.
    pub active_color: Option<Color>,
    /// Completed turns.
    pub turn_number: u32,
    /// Checkers moved in the active turn.
    pub move_number: u32,
    /// Checker layout.
    pub board_positions: BoardPositionSnapshot,
    /// Both players' dice.
    pub dice_state: ColorPair<DicePlayerSnapshot>,
    /// Doubling cube.
    pub cube_state: CubeStateSnapshot,
    /// Both seats.
    pub player_states: ColorPair<PlayerStateSnapshot>,
    /// Pip counts from the board.
    pub pip_counts: PipCounts,
    /// GNU position id with the active color on roll.
    pub gnu_position_id: String,
    /// Turn in progress.
    pub active_play: Option<Play>,
    /// Result of a finished game.
    pub outcome: Option<Outcome>,
    /// Rule switches.
    pub settings: GameSettings,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last transition.
    pub last_update: DateTime<Utc>,
}

impl GameStateSnapshot {
    /// Captures every field of `game`.
    #[instrument(skip(game), fields(state = %game.kind()))]
    pub fn capture(game: &AnyGame) -> Self {
        let core = game.core();
        let play = game.active_play();
        let move_number = play.map_or(0, |p| {
            p.resolved_moves()
                .filter(|m| m.kind().is_some_and(|k| k != MoveKind::NoMove))
                .count() as u32
        });
        Self {
            version: SNAPSHOT_VERSION,
            game_id: *core.id(),
            state_kind: game.kind(),
            active_color: game.active_color(),
            turn_number: *core.turn_number(),
            move_number,
            board_positions: BoardPositionSnapshot::capture(core.board()),
            dice_state: ColorPair::from_fn(|c| DicePlayerSnapshot::capture(core.player(c).dice(), play)),
            cube_state: CubeStateSnapshot::capture(core.cube()),
            player_states: ColorPair::from_fn(|c| PlayerStateSnapshot::capture(core.player(c))),
            pip_counts: core.board().pip_counts(),
            gnu_position_id: game.position_id(),
            active_play: play.cloned(),
            outcome: game.outcome().copied(),
            settings: *core.settings(),
            created_at: *core.created_at(),
            last_update: *core.last_update(),
        }
    }

    /// Rebuilds the game, validating the snapshot and every game invariant.
    #[instrument(skip(self), fields(game = %self.game_id, state = %self.state_kind))]
    pub fn reconstruct(&self) -> Result<AnyGame, GammonError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(GammonError::encoding(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }

        let board = self.board_positions.reconstruct()?;
        let player = |color: Color| -> Result<Player, GammonError> {
            let dice = self.dice_state.get(color).reconstruct(color)?;
            Ok(self.player_states.get(color).reconstruct(color, dice))
        };
        let players = Players::new(player(Color::Black)?, player(Color::White)?)?;
        if players.get(Color::Black).direction() != board.black_direction() {
            return Err(GammonError::encoding("board orientation disagrees with black's direction"));
        }
        let core = GameCore {
            id: self.game_id,
            players,
            board,
            cube: self.cube_state.reconstruct()?,
            settings: self.settings,
            turn_number: self.turn_number,
            created_at: self.created_at,
            last_update: self.last_update,
        };
        verify(&core)?;
        if core.board.pip_counts() != self.pip_counts {
            return Err(GammonError::encoding("pip counts disagree with the board"));
        }

        let game = self.assemble(core)?;
        if game.position_id() != self.gnu_position_id {
            return Err(GammonError::encoding("position id disagrees with the board"));
        }
        debug!("Snapshot reconstructed");
        Ok(game)
    }

    fn assemble(&self, core: GameCore) -> Result<AnyGame, GammonError> {
        let active_color = || {
            self.active_color
                .ok_or_else(|| GammonError::encoding(format!("{} snapshot without activeColor", self.state_kind)))
        };
        let play = || -> Result<Play, GammonError> {
            let play = self
                .active_play
                .clone()
                .ok_or_else(|| GammonError::encoding(format!("{} snapshot without activePlay", self.state_kind)))?;
            if Some(play.color()) != self.active_color {
                return Err(GammonError::encoding("active play belongs to the other color"));
            }
            if !MoveCountInvariant::holds(&play) {
                return Err(GammonError::invariant(MoveCountInvariant::description()));
            }
            Ok(play)
        };

        let game = match self.state_kind {
            GameStateKind::RollingForStart => AnyGame::from(Game {
                core,
                phase: RollingForStart,
            }),
            GameStateKind::RolledForStart => AnyGame::from(Game {
                core,
                phase: RolledForStart {
                    active_color: active_color()?,
                },
            }),
            GameStateKind::Rolling => AnyGame::from(Game {
                core,
                phase: Rolling {
                    active_color: active_color()?,
                },
            }),
            GameStateKind::Rolled => AnyGame::from(Game {
                core,
                phase: Rolled {
                    active_color: active_color()?,
                    play: play()?,
                },
            }),
            GameStateKind::PreparingMove => AnyGame::from(Game {
                core,
                phase: PreparingMove {
                    active_color: active_color()?,
                    play: play()?,
                },
            }),
            GameStateKind::Doubling => AnyGame::from(Game {
                core,
                phase: Doubling {
                    active_color: active_color()?,
                    play: play()?,
                },
            }),
            GameStateKind::Doubled => AnyGame::from(Game {
                core,
                phase: Doubled {
                    active_color: active_color()?,
                    play: play()?,
                },
            }),
            GameStateKind::Moving => AnyGame::from(Game {
                core,
                phase: Moving {
                    active_color: active_color()?,
                    play: play()?,
                },
            }),
            GameStateKind::Moved => AnyGame::from(Game {
                core,
                phase: Moved {
                    active_color: active_color()?,
                    play: play()?,
                },
            }),
            GameStateKind::Completed => AnyGame::from(Game {
                core,
                phase: Completed {
                    outcome: self
                        .outcome
                        .ok_or_else(|| GammonError::encoding("completed snapshot without outcome"))?,
                },
            }),
        };
        Ok(game)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, GammonError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses JSON written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self, GammonError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRoller;

    fn start() -> AnyGame {
        Game::new(
            Player::new("black", Color::Black, Direction::Clockwise, false),
            Player::new("white", Color::White, Direction::Counterclockwise, true),
        )
        .unwrap()
        .into()
    }

    #[test]
    fn fresh_game_round_trips() {
        let game = start();
        let snapshot = GameStateSnapshot::capture(&game);
        assert_eq!(snapshot.gnu_position_id, crate::position_id::START_POSITION_ID);
        assert_eq!(snapshot.cube_state.value, 1);
        assert_eq!(snapshot.cube_state.position, CubePosition::Center);
        assert_eq!(snapshot.reconstruct().unwrap(), game);
    }

    #[test]
    fn mid_turn_round_trips_through_json() {
        let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).unwrap();
        let game = start()
            .roll_for_start(&mut roller)
            .unwrap()
            .roll(&mut roller)
            .unwrap()
            .move_checker(ContainerId::point(24), None)
            .unwrap();
        let snapshot = GameStateSnapshot::capture(&game);
        assert_eq!(snapshot.move_number, 1);
        assert_eq!(snapshot.dice_state.black.used_moves.len(), 1);
        assert_eq!(snapshot.dice_state.black.available_moves.len(), 1);

        let json = snapshot.to_json().unwrap();
        let back = GameStateSnapshot::from_json(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.reconstruct().unwrap(), game);
    }

    #[test]
    fn tampered_board_is_rejected() {
        let mut snapshot = GameStateSnapshot::capture(&start());
        snapshot.board_positions.points.remove(&24);
        assert!(snapshot.reconstruct().is_err());
    }

    #[test]
    fn missing_play_is_rejected() {
        let mut roller = ScriptedRoller::new(&[5, 2, 6, 1]).unwrap();
        let game = start()
            .roll_for_start(&mut roller)
            .unwrap()
            .roll(&mut roller)
            .unwrap();
        let mut snapshot = GameStateSnapshot::capture(&game);
        snapshot.active_play = None;
        assert!(matches!(snapshot.reconstruct(), Err(GammonError::Encoding(_))));
    }
}
