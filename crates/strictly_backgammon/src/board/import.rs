//! Declarative board construction.

use super::{Board, CheckerContainer, CheckerId, ContainerId, PointPosition, STANDARD_LAYOUT};
use crate::error::GammonError;
use crate::types::{CHECKERS_PER_PLAYER, Color, Direction};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Bar or off tray, as named in an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Holding {
    /// The bar.
    Bar,
    /// The off tray.
    Off,
}

/// Where an import entry places its checkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportPosition {
    /// A point, numbered in both frames.
    Point(PointPosition),
    /// Bar or off tray.
    Holding(Holding),
}

/// How many checkers of which color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct ImportCheckers {
    /// Number of checkers.
    pub qty: u8,
    /// Their color.
    pub color: Color,
}

/// One line of a board import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardImportEntry {
    /// Target position.
    pub position: ImportPosition,
    /// Which bar or tray; defaults to the direction of the checkers' color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Checkers to place.
    pub checkers: ImportCheckers,
}

impl BoardImportEntry {
    /// Checkers on a point by canonical index.
    pub fn point(index: u8, color: Color, qty: u8) -> Self {
        Self {
            position: ImportPosition::Point(PointPosition::from_clockwise(index)),
            direction: None,
            checkers: ImportCheckers::new(qty, color),
        }
    }

    /// Checkers on a point numbered in a direction's own frame.
    pub fn point_for(direction: Direction, own: u8, color: Color, qty: u8) -> Self {
        Self {
            position: ImportPosition::Point(PointPosition::from_own(direction, own)),
            direction: Some(direction),
            checkers: ImportCheckers::new(qty, color),
        }
    }

    /// Checkers waiting on their color's bar.
    pub fn bar(color: Color, qty: u8) -> Self {
        Self {
            position: ImportPosition::Holding(Holding::Bar),
            direction: None,
            checkers: ImportCheckers::new(qty, color),
        }
    }

    /// Checkers already borne off.
    pub fn off(color: Color, qty: u8) -> Self {
        Self {
            position: ImportPosition::Holding(Holding::Off),
            direction: None,
            checkers: ImportCheckers::new(qty, color),
        }
    }

    fn container(&self, color_direction: Direction) -> Result<ContainerId, GammonError> {
        match self.position {
            ImportPosition::Point(position) => {
                position.validate()?;
                Ok(ContainerId::point(position.clockwise))
            }
            ImportPosition::Holding(Holding::Bar) => Ok(ContainerId::bar(
                self.direction.unwrap_or(color_direction),
            )),
            ImportPosition::Holding(Holding::Off) => Ok(ContainerId::off(
                self.direction.unwrap_or(color_direction),
            )),
        }
    }
}

/// The standard starting layout expressed as an import.
pub fn standard_import(black_direction: Direction) -> Vec<BoardImportEntry> {
    Color::ALL
        .iter()
        .flat_map(|&color| {
            let direction = match color {
                Color::Black => black_direction,
                Color::White => black_direction.opposite(),
            };
            STANDARD_LAYOUT
                .iter()
                .map(move |&(own, qty)| BoardImportEntry::point_for(direction, own, color, qty))
        })
        .collect()
}

impl Board {
    /// Builds a board from import entries.
    ///
    /// A color may not exceed 15 checkers and a point may not mix colors.
    /// Checkers a color is short of are placed in its off tray, so a
    /// partial layout describes an endgame.
    #[instrument(skip(entries), fields(entries = entries.len()))]
    pub fn build(
        entries: &[BoardImportEntry],
        black_direction: Direction,
    ) -> Result<Board, GammonError> {
        let mut board = Board::empty(black_direction);
        let mut next_id: u8 = 0;

        for entry in entries {
            let color = entry.checkers.color;
            let container = entry.container(board.direction_of(color))?;
            for _ in 0..entry.checkers.qty {
                if board.checker_count(color) >= usize::from(CHECKERS_PER_PLAYER) {
                    return Err(GammonError::encoding(format!(
                        "import places more than {} {} checkers",
                        CHECKERS_PER_PLAYER, color
                    )));
                }
                board.push_checker(CheckerId(next_id), color, container)?;
                next_id += 1;
            }
        }

        for color in Color::ALL {
            let tray = ContainerId::off(board.direction_of(color));
            let missing = usize::from(CHECKERS_PER_PLAYER) - board.checker_count(color);
            if missing > 0 {
                debug!(color = %color, missing, "Filling off tray with unplaced checkers");
            }
            for _ in 0..missing {
                board.push_checker(CheckerId(next_id), color, tray)?;
                next_id += 1;
            }
        }

        Ok(board)
    }

    /// Exports the board as import entries that rebuild the same layout.
    pub fn to_import(&self) -> Vec<BoardImportEntry> {
        let mut entries = Vec::new();
        for point in self.points() {
            if let Some(color) = point.owner() {
                entries.push(BoardImportEntry {
                    position: ImportPosition::Point(point.position()),
                    direction: None,
                    checkers: ImportCheckers::new(point.count() as u8, color),
                });
            }
        }
        for color in Color::ALL {
            let direction = self.direction_of(color);
            for (holding, count) in [
                (Holding::Bar, self.bar(direction).count_of(color)),
                (Holding::Off, self.off(direction).count_of(color)),
            ] {
                if count > 0 {
                    entries.push(BoardImportEntry {
                        position: ImportPosition::Holding(holding),
                        direction: Some(direction),
                        checkers: ImportCheckers::new(count as u8, color),
                    });
                }
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_import_matches_standard_board() {
        for direction in [Direction::Clockwise, Direction::Counterclockwise] {
            let built = Board::build(&standard_import(direction), direction).unwrap();
            assert_eq!(built, Board::standard(direction));
        }
    }

    #[test]
    fn shortfall_goes_off() {
        let board = Board::build(&[BoardImportEntry::point(1, Color::Black, 1)], Direction::Clockwise)
            .unwrap();
        assert_eq!(board.off_count(Color::Black), 14);
        assert_eq!(board.off_count(Color::White), 15);
        assert_eq!(board.pip_count(Color::Black), 1);
    }

    #[test]
    fn rejects_sixteen_checkers() {
        let err = Board::build(
            &[
                BoardImportEntry::point(1, Color::Black, 10),
                BoardImportEntry::point(2, Color::Black, 6),
            ],
            Direction::Clockwise,
        )
        .unwrap_err();
        assert!(matches!(err, GammonError::Encoding(_)));
    }

    #[test]
    fn rejects_mixed_point() {
        let err = Board::build(
            &[
                BoardImportEntry::point(5, Color::Black, 1),
                BoardImportEntry::point(5, Color::White, 1),
            ],
            Direction::Clockwise,
        )
        .unwrap_err();
        assert!(matches!(err, GammonError::Encoding(_)));
    }

    #[test]
    fn rejects_inconsistent_position() {
        let entry = BoardImportEntry {
            position: ImportPosition::Point(PointPosition {
                clockwise: 3,
                counterclockwise: 3,
            }),
            direction: None,
            checkers: ImportCheckers::new(1, Color::White),
        };
        assert!(Board::build(&[entry], Direction::Clockwise).is_err());
    }

    #[test]
    fn parses_wire_format() {
        let json = r#"[
            {"position": {"clockwise": 24, "counterclockwise": 1}, "checkers": {"qty": 2, "color": "black"}},
            {"position": "bar", "direction": "counterclockwise", "checkers": {"qty": 1, "color": "white"}}
        ]"#;
        let entries: Vec<BoardImportEntry> = serde_json::from_str(json).unwrap();
        let board = Board::build(&entries, Direction::Clockwise).unwrap();
        assert_eq!(board.bar_count(Color::White), 1);
        assert_eq!(board.point(24).unwrap().count_of(Color::Black), 2);
    }

    #[test]
    fn export_rebuilds_same_layout() {
        let board = Board::initialize();
        let rebuilt = Board::build(&board.to_import(), board.black_direction()).unwrap();
        assert_eq!(rebuilt.pip_counts(), board.pip_counts());
        assert_eq!(rebuilt.to_import(), board.to_import());
    }
}
