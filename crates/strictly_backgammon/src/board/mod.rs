//! Board model: points, bars, off trays, and the checkers they hold.
//!
//! Points are stored in canonical order (index 1..=24 as numbered by the
//! clockwise player). Bars and off trays are keyed by direction, since each
//! color keeps one direction for the whole game.

mod ascii;
mod import;

pub use import::{BoardImportEntry, Holding, ImportCheckers, ImportPosition, standard_import};

use crate::action::MoveSkeleton;
use crate::error::{GammonError, IllegalMoveReason};
use crate::rules;
use crate::types::{
    BAR_POSITION, CHECKERS_PER_PLAYER, Color, DieValue, Direction, HOME_BOARD_SIZE, PipCounts,
    POINT_COUNT,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Standard starting layout as (own point, checkers), identical for both colors.
pub const STANDARD_LAYOUT: [(u8, u8); 4] = [(24, 2), (13, 5), (8, 3), (6, 5)];

// ─────────────────────────────────────────────────────────────
//  Identifiers
// ─────────────────────────────────────────────────────────────

/// Identifies a container on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ContainerId {
    /// A point, by canonical index.
    Point {
        /// Canonical index 1..=24.
        index: u8,
    },
    /// The bar holding checkers that move in `direction`.
    Bar {
        /// Direction of the checkers waiting here.
        direction: Direction,
    },
    /// The tray of checkers borne off while moving in `direction`.
    Off {
        /// Direction of the checkers collected here.
        direction: Direction,
    },
}

impl ContainerId {
    /// Point by canonical index.
    pub fn point(index: u8) -> Self {
        Self::Point { index }
    }

    /// Point by its number in a direction's own frame.
    pub fn point_for(direction: Direction, own: u8) -> Self {
        Self::Point {
            index: direction.to_canonical(own),
        }
    }

    /// Bar for a direction.
    pub fn bar(direction: Direction) -> Self {
        Self::Bar { direction }
    }

    /// Off tray for a direction.
    pub fn off(direction: Direction) -> Self {
        Self::Off { direction }
    }

    /// Distance from bearing off for a checker moving in `direction`:
    /// 25 on the bar, 0 once off.
    pub fn own_position(&self, direction: Direction) -> u8 {
        match self {
            ContainerId::Point { index } => direction.from_canonical(*index),
            ContainerId::Bar { .. } => BAR_POSITION,
            ContainerId::Off { .. } => 0,
        }
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerId::Point { index } => write!(f, "point {}", index),
            ContainerId::Bar { direction } => write!(f, "{} bar", direction),
            ContainerId::Off { direction } => write!(f, "{} off", direction),
        }
    }
}

/// Stable identifier of a checker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CheckerId(pub(crate) u8);

impl CheckerId {
    /// Numeric value of the id.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for CheckerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "checker-{:02}", self.0)
    }
}

/// A single checker and the container currently holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checker {
    id: CheckerId,
    color: Color,
    container: ContainerId,
}

impl Checker {
    pub(crate) fn new(id: CheckerId, color: Color, container: ContainerId) -> Self {
        Self {
            id,
            color,
            container,
        }
    }

    /// Checker id.
    pub fn id(&self) -> CheckerId {
        self.id
    }

    /// Checker color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Container holding the checker.
    pub fn container(&self) -> ContainerId {
        self.container
    }
}

// ─────────────────────────────────────────────────────────────
//  Containers
// ─────────────────────────────────────────────────────────────

/// Read-only occupancy queries shared by points, bars and off trays.
pub trait CheckerContainer {
    /// Container id.
    fn id(&self) -> ContainerId;

    /// Checkers in placement order; the last one is on top.
    fn checkers(&self) -> &[Checker];

    /// Number of checkers held.
    fn count(&self) -> usize {
        self.checkers().len()
    }

    /// Number of checkers of one color.
    fn count_of(&self, color: Color) -> usize {
        self.checkers().iter().filter(|c| c.color() == color).count()
    }

    /// Whether the container is empty.
    fn is_empty(&self) -> bool {
        self.checkers().is_empty()
    }

    /// Topmost checker.
    fn top(&self) -> Option<&Checker> {
        self.checkers().last()
    }
}

/// Numbering of a point as seen from each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointPosition {
    /// Number in the clockwise frame.
    pub clockwise: u8,
    /// Number in the counterclockwise frame.
    pub counterclockwise: u8,
}

impl PointPosition {
    /// Position from a canonical index.
    pub fn from_clockwise(index: u8) -> Self {
        Self {
            clockwise: index,
            counterclockwise: POINT_COUNT + 1 - index,
        }
    }

    /// Position from a number in a direction's own frame.
    pub fn from_own(direction: Direction, own: u8) -> Self {
        Self::from_clockwise(direction.to_canonical(own))
    }

    /// Number of this point in a direction's own frame.
    pub fn for_direction(&self, direction: Direction) -> u8 {
        match direction {
            Direction::Clockwise => self.clockwise,
            Direction::Counterclockwise => self.counterclockwise,
        }
    }

    /// Checks that both numbers name the same point.
    pub fn validate(&self) -> Result<(), GammonError> {
        let in_range = (1..=POINT_COUNT).contains(&self.clockwise);
        let sum = u16::from(self.clockwise) + u16::from(self.counterclockwise);
        if in_range && sum == u16::from(POINT_COUNT) + 1 {
            Ok(())
        } else {
            Err(GammonError::encoding(format!(
                "point position {{clockwise: {}, counterclockwise: {}}} is inconsistent",
                self.clockwise, self.counterclockwise
            )))
        }
    }
}

/// One of the 24 points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    position: PointPosition,
    checkers: Vec<Checker>,
}

impl Point {
    fn new(index: u8) -> Self {
        Self {
            position: PointPosition::from_clockwise(index),
            checkers: Vec::new(),
        }
    }

    /// Position in both frames.
    pub fn position(&self) -> PointPosition {
        self.position
    }

    /// Canonical index.
    pub fn index(&self) -> u8 {
        self.position.clockwise
    }

    /// Color occupying the point, if any.
    pub fn owner(&self) -> Option<Color> {
        self.top().map(Checker::color)
    }

    /// Whether a checker of `color` may land here (open, own, or a single opposing blot).
    pub fn is_open_for(&self, color: Color) -> bool {
        self.count_of(color.opponent()) < 2
    }

    /// Whether the point holds exactly one checker of `color`.
    pub fn is_blot_of(&self, color: Color) -> bool {
        self.checkers.len() == 1 && self.owner() == Some(color)
    }
}

impl CheckerContainer for Point {
    fn id(&self) -> ContainerId {
        ContainerId::point(self.index())
    }

    fn checkers(&self) -> &[Checker] {
        &self.checkers
    }
}

/// Holding area for hit checkers moving in one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    direction: Direction,
    checkers: Vec<Checker>,
}

impl CheckerContainer for Bar {
    fn id(&self) -> ContainerId {
        ContainerId::bar(self.direction)
    }

    fn checkers(&self) -> &[Checker] {
        &self.checkers
    }
}

/// Tray of checkers borne off while moving in one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Off {
    direction: Direction,
    checkers: Vec<Checker>,
}

impl CheckerContainer for Off {
    fn id(&self) -> ContainerId {
        ContainerId::off(self.direction)
    }

    fn checkers(&self) -> &[Checker] {
        &self.checkers
    }
}

/// A value for each direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionPair<T> {
    /// Clockwise entry.
    pub clockwise: T,
    /// Counterclockwise entry.
    pub counterclockwise: T,
}

impl<T> DirectionPair<T> {
    /// Entry for a direction.
    pub fn get(&self, direction: Direction) -> &T {
        match direction {
            Direction::Clockwise => &self.clockwise,
            Direction::Counterclockwise => &self.counterclockwise,
        }
    }

    fn get_mut(&mut self, direction: Direction) -> &mut T {
        match direction {
            Direction::Clockwise => &mut self.clockwise,
            Direction::Counterclockwise => &mut self.counterclockwise,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Board
// ─────────────────────────────────────────────────────────────

/// The authoritative checker layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    points: Vec<Point>,
    bar: DirectionPair<Bar>,
    off: DirectionPair<Off>,
    black_direction: Direction,
}

impl Board {
    /// Board with no checkers on it.
    pub(crate) fn empty(black_direction: Direction) -> Self {
        Self {
            points: (1..=POINT_COUNT).map(Point::new).collect(),
            bar: DirectionPair {
                clockwise: Bar {
                    direction: Direction::Clockwise,
                    checkers: Vec::new(),
                },
                counterclockwise: Bar {
                    direction: Direction::Counterclockwise,
                    checkers: Vec::new(),
                },
            },
            off: DirectionPair {
                clockwise: Off {
                    direction: Direction::Clockwise,
                    checkers: Vec::new(),
                },
                counterclockwise: Off {
                    direction: Direction::Counterclockwise,
                    checkers: Vec::new(),
                },
            },
            black_direction,
        }
    }

    /// Standard starting position with black moving clockwise.
    pub fn initialize() -> Self {
        Self::standard(Direction::Clockwise)
    }

    /// Standard starting position for the given orientation.
    #[instrument]
    pub fn standard(black_direction: Direction) -> Self {
        let mut board = Self::empty(black_direction);
        let mut next_id = 0;
        for color in Color::ALL {
            let direction = board.direction_of(color);
            for (own, qty) in STANDARD_LAYOUT {
                let container = ContainerId::point_for(direction, own);
                for _ in 0..qty {
                    board.place(Checker::new(CheckerId(next_id), color, container));
                    next_id += 1;
                }
            }
        }
        board
    }

    /// Random legal position: 15 checkers per color spread over points, bar and off.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, black_direction: Direction) -> Self {
        let mut board = Self::empty(black_direction);
        let mut next_id = 0;
        for color in Color::ALL {
            let direction = board.direction_of(color);
            for _ in 0..CHECKERS_PER_PLAYER {
                let container = loop {
                    let candidate = match rng.gen_range(0..=BAR_POSITION) {
                        0 => ContainerId::off(direction),
                        BAR_POSITION => ContainerId::bar(direction),
                        own => ContainerId::point_for(direction, own),
                    };
                    if board.accepts(candidate, color) {
                        break candidate;
                    }
                };
                board.place(Checker::new(CheckerId(next_id), color, container));
                next_id += 1;
            }
        }
        board
    }

    // ── placement primitives ──────────────────────────────────

    fn slot_mut(&mut self, id: ContainerId) -> Option<&mut Vec<Checker>> {
        match id {
            ContainerId::Point { index } => {
                let slot = usize::from(index).checked_sub(1)?;
                self.points.get_mut(slot).map(|p| &mut p.checkers)
            }
            ContainerId::Bar { direction } => Some(&mut self.bar.get_mut(direction).checkers),
            ContainerId::Off { direction } => Some(&mut self.off.get_mut(direction).checkers),
        }
    }

    /// Whether a checker of `color` may be placed in `id` without mixing colors.
    fn accepts(&self, id: ContainerId, color: Color) -> bool {
        match id {
            ContainerId::Point { .. } => self
                .container(id)
                .is_some_and(|p| p.top().is_none_or(|c| c.color() == color)),
            ContainerId::Bar { direction } | ContainerId::Off { direction } => {
                self.color_moving(direction) == color
            }
        }
    }

    fn place(&mut self, checker: Checker) {
        if let Some(slot) = self.slot_mut(checker.container) {
            slot.push(checker);
        }
    }

    /// Places a new checker, rejecting mixed points and mismatched holdings.
    pub(crate) fn push_checker(
        &mut self,
        id: CheckerId,
        color: Color,
        container: ContainerId,
    ) -> Result<(), GammonError> {
        if self.container(container).is_none() {
            return Err(GammonError::encoding(format!("{} does not exist", container)));
        }
        if !self.accepts(container, color) {
            return Err(GammonError::encoding(format!(
                "{} cannot hold a {} checker",
                container, color
            )));
        }
        self.place(Checker::new(id, color, container));
        Ok(())
    }

    fn take_top(&mut self, id: ContainerId) -> Option<Checker> {
        self.slot_mut(id)?.pop()
    }

    fn put(&mut self, id: ContainerId, mut checker: Checker) -> Result<(), GammonError> {
        checker.container = id;
        let slot = self
            .slot_mut(id)
            .ok_or_else(|| GammonError::invariant(format!("{} does not exist", id)))?;
        slot.push(checker);
        Ok(())
    }

    // ── queries ───────────────────────────────────────────────

    /// All 24 points in canonical order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Point by canonical index.
    pub fn point(&self, index: u8) -> Option<&Point> {
        self.points.get(usize::from(index).checked_sub(1)?)
    }

    /// Point by its number in a direction's own frame.
    pub fn point_for(&self, direction: Direction, own: u8) -> Option<&Point> {
        if (1..=POINT_COUNT).contains(&own) {
            self.point(direction.to_canonical(own))
        } else {
            None
        }
    }

    /// Bar for a direction.
    pub fn bar(&self, direction: Direction) -> &Bar {
        self.bar.get(direction)
    }

    /// Off tray for a direction.
    pub fn off(&self, direction: Direction) -> &Off {
        self.off.get(direction)
    }

    /// Container by id.
    pub fn container(&self, id: ContainerId) -> Option<&dyn CheckerContainer> {
        match id {
            ContainerId::Point { index } => self.point(index).map(|p| p as &dyn CheckerContainer),
            ContainerId::Bar { direction } => Some(self.bar(direction)),
            ContainerId::Off { direction } => Some(self.off(direction)),
        }
    }

    /// Direction black moves in.
    pub fn black_direction(&self) -> Direction {
        self.black_direction
    }

    /// Direction a color moves in.
    pub fn direction_of(&self, color: Color) -> Direction {
        match color {
            Color::Black => self.black_direction,
            Color::White => self.black_direction.opposite(),
        }
    }

    /// Color moving in a direction.
    pub fn color_moving(&self, direction: Direction) -> Color {
        if direction == self.black_direction {
            Color::Black
        } else {
            Color::White
        }
    }

    /// Every checker on the board, bars and off trays included.
    pub fn checkers(&self) -> impl Iterator<Item = &Checker> {
        self.points
            .iter()
            .flat_map(|p| p.checkers.iter())
            .chain(self.bar.clockwise.checkers.iter())
            .chain(self.bar.counterclockwise.checkers.iter())
            .chain(self.off.clockwise.checkers.iter())
            .chain(self.off.counterclockwise.checkers.iter())
    }

    /// Number of checkers of a color anywhere.
    pub fn checker_count(&self, color: Color) -> usize {
        self.checkers().filter(|c| c.color() == color).count()
    }

    /// Checkers of a color waiting on the bar.
    pub fn bar_count(&self, color: Color) -> usize {
        self.bar(self.direction_of(color)).count_of(color)
    }

    /// Checkers of a color already borne off.
    pub fn off_count(&self, color: Color) -> usize {
        self.off(self.direction_of(color)).count_of(color)
    }

    /// Pips a color needs to bear every checker off.
    pub fn pip_count(&self, color: Color) -> u16 {
        let direction = self.direction_of(color);
        self.checkers()
            .filter(|c| c.color() == color)
            .map(|c| u16::from(c.container().own_position(direction)))
            .sum()
    }

    /// Pip counts for both colors.
    pub fn pip_counts(&self) -> PipCounts {
        PipCounts {
            black: self.pip_count(Color::Black),
            white: self.pip_count(Color::White),
        }
    }

    /// The six points a color bears off from, own point 1 first.
    pub fn home_board(&self, color: Color) -> Vec<&Point> {
        let direction = self.direction_of(color);
        (1..=HOME_BOARD_SIZE)
            .filter_map(|own| self.point_for(direction, own))
            .collect()
    }

    /// Whether a color may bear off.
    pub fn can_bear_off(&self, color: Color) -> bool {
        rules::can_bear_off(self, color)
    }

    /// Every legal single-die move for a color.
    pub fn possible_moves(&self, color: Color, die: DieValue) -> Vec<MoveSkeleton> {
        rules::possible_moves(self, color, die)
    }

    // ── mutation ──────────────────────────────────────────────

    /// Moves the top checker of `origin` to `destination`, returning the new board.
    ///
    /// A lone opposing checker at the destination is hit and sent to the bar
    /// its owner re-enters from. Landing on two or more opposing checkers is
    /// refused as an invariant violation: move legality is checked before
    /// the board is touched.
    #[instrument(skip(self), fields(origin = %origin, destination = %destination, direction = %direction))]
    pub fn move_checker(
        &self,
        origin: ContainerId,
        destination: ContainerId,
        direction: Direction,
    ) -> Result<Board, GammonError> {
        let color = self.color_moving(direction);

        let wrong_holding = match origin {
            ContainerId::Off { .. } => true,
            ContainerId::Bar { direction: d } => d != direction,
            ContainerId::Point { .. } => false,
        };
        let holds_mover = self
            .container(origin)
            .and_then(|c| c.top())
            .is_some_and(|c| c.color() == color);
        if wrong_holding || !holds_mover {
            return Err(IllegalMoveReason::NoCheckerAtOrigin(color, origin).into());
        }

        match destination {
            ContainerId::Bar { .. } => {
                return Err(GammonError::invariant(format!(
                    "{} is not a move destination",
                    destination
                )));
            }
            ContainerId::Off { direction: d } if d != direction => {
                return Err(GammonError::invariant(format!(
                    "{} checkers cannot bear off to {}",
                    color, destination
                )));
            }
            ContainerId::Point { .. } => {
                let point = self.container(destination).ok_or_else(|| {
                    GammonError::invariant(format!("{} does not exist", destination))
                })?;
                if point.count_of(color.opponent()) >= 2 {
                    return Err(GammonError::invariant(format!(
                        "refusing to place a {} checker on blocked {}",
                        color, destination
                    )));
                }
            }
            ContainerId::Off { .. } => {}
        }

        let mut next = self.clone();
        let checker = next
            .take_top(origin)
            .ok_or_else(|| GammonError::invariant(format!("{} emptied mid-move", origin)))?;

        let is_hit = next
            .container(destination)
            .is_some_and(|c| c.count_of(color.opponent()) == 1);
        if is_hit {
            if let Some(hit) = next.take_top(destination) {
                debug!(checker = %hit.id(), "Hit sends checker to the bar");
                next.put(ContainerId::bar(direction.opposite()), hit)?;
            }
        }

        next.put(destination, checker)?;
        Ok(next)
    }
}
