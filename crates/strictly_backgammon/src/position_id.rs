//! GNU Backgammon position ids.
//!
//! A position id packs both sides' checker layout into 80 bits. The side
//! not on roll is written first, then the side on roll. Each side walks its
//! own points 1 to 24 and then the bar, writing one `1` per checker and a
//! `0` after each slot. The bits are packed least-significant first into
//! ten bytes and base64-encoded without padding, giving 14 characters.

use crate::board::{Board, CheckerContainer, CheckerId, ContainerId};
use crate::error::GammonError;
use crate::types::{BAR_POSITION, CHECKERS_PER_PLAYER, Color, Direction, POINT_COUNT};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use tracing::instrument;

/// Bytes in a decoded id.
const KEY_BYTES: usize = 10;

/// Slots per side: 24 points and the bar.
const SLOTS: usize = BAR_POSITION as usize;

/// Position id of the standard starting position.
pub const START_POSITION_ID: &str = "4HPwATDgc/ABMA";

/// Checker counts per side, indexed by own point (0 = point 1, 24 = bar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionKey {
    /// Side not on roll.
    pub opponent: [u8; SLOTS],
    /// Side on roll.
    pub on_roll: [u8; SLOTS],
}

impl PositionKey {
    /// Reads the layout of `board` with `on_roll` to move.
    pub fn from_board(board: &Board, on_roll: Color) -> Self {
        Self {
            opponent: side(board, on_roll.opponent()),
            on_roll: side(board, on_roll),
        }
    }

    /// Packs the key into its 14-character id.
    pub fn encode(&self) -> String {
        let mut bytes = [0u8; KEY_BYTES];
        let mut bit = 0usize;
        for slots in [&self.opponent, &self.on_roll] {
            for &count in slots.iter() {
                // Ones are written as set bits; the zero separator is skipped over.
                for _ in 0..count {
                    if let Some(byte) = bytes.get_mut(bit / 8) {
                        *byte |= 1 << (bit % 8);
                    }
                    bit += 1;
                }
                bit += 1;
            }
        }
        STANDARD_NO_PAD.encode(bytes)
    }

    /// Unpacks an id, rejecting anything that is not a valid layout.
    #[instrument]
    pub fn decode(id: &str) -> Result<Self, GammonError> {
        let bytes = STANDARD_NO_PAD.decode(id.trim())?;
        if bytes.len() != KEY_BYTES {
            return Err(GammonError::encoding(format!(
                "position id must decode to {} bytes, got {}",
                KEY_BYTES,
                bytes.len()
            )));
        }
        let mut bits = (0..KEY_BYTES * 8).map(|i| bytes[i / 8] >> (i % 8) & 1 == 1);
        let mut read_side = || -> Result<[u8; SLOTS], GammonError> {
            let mut slots = [0u8; SLOTS];
            for slot in slots.iter_mut() {
                loop {
                    match bits.next() {
                        Some(true) => *slot += 1,
                        Some(false) => break,
                        None => return Err(GammonError::encoding("position id ends mid-layout")),
                    }
                    if *slot > CHECKERS_PER_PLAYER {
                        return Err(GammonError::encoding("too many checkers on one slot"));
                    }
                }
            }
            let total: u16 = slots.iter().map(|&c| u16::from(c)).sum();
            if total > u16::from(CHECKERS_PER_PLAYER) {
                return Err(GammonError::encoding(format!(
                    "position id holds {} checkers for one side",
                    total
                )));
            }
            Ok(slots)
        };
        let opponent = read_side()?;
        let on_roll = read_side()?;
        if bits.any(|b| b) {
            return Err(GammonError::encoding("position id has trailing bits set"));
        }
        let key = Self { opponent, on_roll };
        let contested = (0..POINT_COUNT as usize)
            .any(|i| key.on_roll[i] > 0 && key.opponent[POINT_COUNT as usize - 1 - i] > 0);
        if contested {
            return Err(GammonError::encoding("position id puts both sides on one point"));
        }
        Ok(key)
    }
}

fn side(board: &Board, color: Color) -> [u8; SLOTS] {
    let direction = board.direction_of(color);
    let mut slots = [0u8; SLOTS];
    for (own, slot) in (1..=POINT_COUNT).zip(slots.iter_mut()) {
        *slot = board
            .point_for(direction, own)
            .map_or(0, |p| p.count_of(color) as u8);
    }
    slots[SLOTS - 1] = board.bar(direction).count() as u8;
    slots
}

/// Position id of `board` with `on_roll` to move.
pub fn position_id(board: &Board, on_roll: Color) -> String {
    PositionKey::from_board(board, on_roll).encode()
}

impl Board {
    /// Builds the board described by a position id.
    ///
    /// Checkers missing from the id are placed in their side's off tray.
    /// Ids are assigned black first, each side from the bar down to its
    /// own point 1, so the start id yields the standard board.
    pub fn from_position_id(
        id: &str,
        on_roll: Color,
        black_direction: Direction,
    ) -> Result<Board, GammonError> {
        let key = PositionKey::decode(id)?;
        let mut board = Board::empty(black_direction);
        let mut next_id = 0u8;
        for color in Color::ALL {
            let slots = if color == on_roll { key.on_roll } else { key.opponent };
            let direction = board.direction_of(color);
            let mut containers = vec![(ContainerId::bar(direction), slots[SLOTS - 1])];
            containers.extend(
                (1..=POINT_COUNT)
                    .rev()
                    .map(|own| (ContainerId::point_for(direction, own), slots[usize::from(own) - 1])),
            );
            let on_board: u8 = slots.iter().sum();
            containers.push((ContainerId::off(direction), CHECKERS_PER_PLAYER - on_board));
            for (container, qty) in containers {
                for _ in 0..qty {
                    board.push_checker(CheckerId(next_id), color, container)?;
                    next_id += 1;
                }
            }
        }
        Ok(board)
    }
}
