//! Seats at the table: per-player state, dice and pip count.

use crate::action::{MoveKind, MoveSkeleton};
use crate::board::{Board, Point};
use crate::dice::{Dice, DieRoller};
use crate::error::GammonError;
use crate::types::{Color, DieValue, Direction, MAX_PIP_COUNT};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Where a player is in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PlayerState {
    /// Waiting for the opponent.
    Inactive,
    /// About to throw the opening die.
    RollingForStart,
    /// Opening die thrown.
    RolledForStart,
    /// About to roll for the turn.
    Rolling,
    /// Turn roll available.
    Rolled,
    /// Has offered the cube this turn.
    Doubled,
    /// Moving checkers.
    Moving,
    /// Every die resolved; waiting to confirm.
    Moved,
    /// Won the game.
    Winner,
}

/// One seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub(crate) id: Uuid,
    pub(crate) user_id: String,
    pub(crate) color: Color,
    pub(crate) direction: Direction,
    pub(crate) dice: Dice,
    pub(crate) pip_count: u16,
    pub(crate) is_robot: bool,
    pub(crate) roll_for_start_value: Option<DieValue>,
    pub(crate) state: PlayerState,
}

impl Player {
    /// Creates an inactive player with fresh dice and the starting pip count.
    pub fn new(user_id: impl Into<String>, color: Color, direction: Direction, is_robot: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            color,
            direction,
            dice: Dice::new(color),
            pip_count: MAX_PIP_COUNT,
            is_robot,
            roll_for_start_value: None,
            state: PlayerState::Inactive,
        }
    }

    /// Player id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Account the seat belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Checker color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Movement direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The player's dice.
    pub fn dice(&self) -> &Dice {
        &self.dice
    }

    /// Pip count as of the last board change.
    pub fn pip_count(&self) -> u16 {
        self.pip_count
    }

    /// Whether a robot controls the seat.
    pub fn is_robot(&self) -> bool {
        self.is_robot
    }

    /// Face thrown in the opening roll.
    pub fn roll_for_start_value(&self) -> Option<DieValue> {
        self.roll_for_start_value
    }

    /// Current state.
    pub fn state(&self) -> PlayerState {
        self.state
    }

    // ── board views ───────────────────────────────────────────

    /// The six points this player bears off from.
    pub fn home_board<'a>(&self, board: &'a Board) -> Vec<&'a Point> {
        board.home_board(self.color)
    }

    /// The opponent's home board.
    pub fn opponent_board<'a>(&self, board: &'a Board) -> Vec<&'a Point> {
        board.home_board(self.color.opponent())
    }

    /// Whether every checker is home.
    pub fn can_bear_off(&self, board: &Board) -> bool {
        board.can_bear_off(self.color)
    }

    /// Whether a checker is waiting on the bar.
    pub fn has_checkers_on_bar(&self, board: &Board) -> bool {
        board.bar_count(self.color) > 0
    }

    pub(crate) fn refresh_pip_count(&mut self, board: &Board) {
        self.pip_count = board.pip_count(self.color);
    }

    /// Picks one move from a non-empty candidate list.
    ///
    /// Bearing off beats re-entering, which beats an ordinary move; ties go
    /// to the larger die, then to the checker farthest from home. The
    /// ordering is total, so the same list always yields the same move.
    pub fn best_move(&self, possible: &[MoveSkeleton]) -> Result<MoveSkeleton, GammonError> {
        let rank = |kind: MoveKind| match kind {
            MoveKind::BearOff => 3,
            MoveKind::Reenter => 2,
            MoveKind::PointToPoint => 1,
            MoveKind::NoMove => 0,
        };
        possible
            .iter()
            .copied()
            .max_by_key(|m| (rank(m.kind()), m.die_value, m.origin.own_position(m.direction)))
            .ok_or_else(|| GammonError::invariant("best_move called with no candidates"))
    }

    // ── transitions ───────────────────────────────────────────

    fn wrong_state(&self, operation: &'static str, expected: &str) -> GammonError {
        GammonError::illegal_transition("player", operation, self.state, expected)
    }

    fn require(&self, allowed: &[PlayerState], operation: &'static str) -> Result<(), GammonError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            let expected = allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or ");
            Err(self.wrong_state(operation, &expected))
        }
    }

    /// Readies the player for the opening roll; also used to re-roll a tie.
    pub fn to_rolling_for_start(self) -> Result<Self, GammonError> {
        self.require(
            &[
                PlayerState::Inactive,
                PlayerState::RollingForStart,
                PlayerState::RolledForStart,
            ],
            "arm for start",
        )?;
        Ok(Self {
            dice: self.dice.clone().to_rolling_for_start()?,
            roll_for_start_value: None,
            state: PlayerState::RollingForStart,
            ..self
        })
    }

    /// Throws the opening die.
    #[instrument(skip(self, roller), fields(color = %self.color))]
    pub fn roll_for_start<R: DieRoller + ?Sized>(self, roller: &mut R) -> Result<Self, GammonError> {
        self.require(&[PlayerState::RollingForStart], "roll for start")?;
        let dice = self.dice.clone().roll_for_start(roller)?;
        Ok(Self {
            roll_for_start_value: dice.roll_for_start_value(),
            dice,
            state: PlayerState::RolledForStart,
            ..self
        })
    }

    /// Stands down after losing the opening roll.
    pub fn sit_out(self) -> Result<Self, GammonError> {
        self.require(&[PlayerState::RolledForStart], "sit out")?;
        Ok(Self {
            dice: self.dice.clone().deactivate(),
            state: PlayerState::Inactive,
            ..self
        })
    }

    /// Takes the turn: ready to roll.
    pub fn to_rolling(self) -> Result<Self, GammonError> {
        self.require(
            &[PlayerState::Inactive, PlayerState::RolledForStart],
            "take the turn",
        )?;
        Ok(Self {
            dice: self.dice.clone().to_rolling()?,
            state: PlayerState::Rolling,
            ..self
        })
    }

    /// Rolls both dice.
    #[instrument(skip(self, roller), fields(color = %self.color))]
    pub fn roll<R: DieRoller + ?Sized>(self, roller: &mut R) -> Result<Self, GammonError> {
        self.require(&[PlayerState::Rolling], "roll")?;
        let dice = self.dice.clone().roll(roller)?;
        debug!(roll = ?dice.current_roll(), "Player rolled");
        Ok(Self {
            dice,
            state: PlayerState::Rolled,
            ..self
        })
    }

    /// Swaps the order of the rolled dice.
    pub fn switch_dice(self) -> Result<Self, GammonError> {
        self.require(&[PlayerState::Rolled], "switch dice")?;
        Ok(Self {
            dice: self.dice.clone().switch_dice()?,
            ..self
        })
    }

    /// Records a cube offer.
    pub fn to_doubled(self) -> Result<Self, GammonError> {
        self.require(&[PlayerState::Rolled], "double")?;
        Ok(Self {
            state: PlayerState::Doubled,
            ..self
        })
    }

    /// Starts moving checkers.
    pub fn to_moving(self) -> Result<Self, GammonError> {
        self.require(
            &[PlayerState::Rolled, PlayerState::Doubled, PlayerState::Moved],
            "start moving",
        )?;
        Ok(Self {
            state: PlayerState::Moving,
            ..self
        })
    }

    /// Finishes moving.
    pub fn to_moved(self) -> Result<Self, GammonError> {
        self.require(&[PlayerState::Moving], "finish moving")?;
        Ok(Self {
            state: PlayerState::Moved,
            ..self
        })
    }

    /// Ends the turn.
    pub fn deactivate(self) -> Self {
        Self {
            dice: self.dice.clone().deactivate(),
            state: PlayerState::Inactive,
            ..self
        }
    }

    /// Marks the player as the winner.
    pub fn to_winner(self) -> Self {
        Self {
            state: PlayerState::Winner,
            ..self
        }
    }
}

/// Both seats, addressed by color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    black: Player,
    white: Player,
}

impl Players {
    /// Seats two players, checking colors and directions.
    pub fn new(black: Player, white: Player) -> Result<Self, GammonError> {
        if black.color != Color::Black || white.color != Color::White {
            return Err(GammonError::encoding("players must be seated black then white"));
        }
        if black.direction == white.direction {
            return Err(GammonError::encoding("players must move in opposite directions"));
        }
        Ok(Self { black, white })
    }

    /// Player of a color.
    pub fn get(&self, color: Color) -> &Player {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }

    fn get_mut(&mut self, color: Color) -> &mut Player {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
        }
    }

    /// Both players, black first.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        [&self.black, &self.white].into_iter()
    }

    /// Player by id.
    pub fn by_id(&self, id: Uuid) -> Option<&Player> {
        self.iter().find(|p| p.id == id)
    }

    /// Applies a consuming transition to one seat.
    pub(crate) fn update<F>(&mut self, color: Color, transition: F) -> Result<(), GammonError>
    where
        F: FnOnce(Player) -> Result<Player, GammonError>,
    {
        let next = transition(self.get(color).clone())?;
        *self.get_mut(color) = next;
        Ok(())
    }

    pub(crate) fn refresh_pip_counts(&mut self, board: &Board) {
        self.black.refresh_pip_count(board);
        self.white.refresh_pip_count(board);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ContainerId;
    use crate::dice::ScriptedRoller;

    fn skeleton(die: u8, origin: ContainerId, destination: ContainerId) -> MoveSkeleton {
        MoveSkeleton::new(DieValue::new(die).unwrap(), Direction::Clockwise, origin, destination)
    }

    #[test]
    fn best_move_prefers_bear_off_then_farthest() {
        let player = Player::new("robot", Color::Black, Direction::Clockwise, true);
        let candidates = [
            skeleton(3, ContainerId::point(6), ContainerId::point(3)),
            skeleton(3, ContainerId::point(3), ContainerId::off(Direction::Clockwise)),
            skeleton(3, ContainerId::point(5), ContainerId::point(2)),
        ];
        let chosen = player.best_move(&candidates).unwrap();
        assert_eq!(chosen.destination, ContainerId::off(Direction::Clockwise));

        let chosen = player.best_move(&[candidates[0], candidates[2]]).unwrap();
        assert_eq!(chosen.origin, ContainerId::point(6));
    }

    #[test]
    fn best_move_on_empty_list_is_a_contract_violation() {
        let player = Player::new("robot", Color::White, Direction::Counterclockwise, true);
        assert!(matches!(
            player.best_move(&[]),
            Err(GammonError::InvariantViolation(_))
        ));
    }

    #[test]
    fn cannot_roll_out_of_turn() {
        let mut roller = ScriptedRoller::new(&[1, 2]).unwrap();
        let player = Player::new("a", Color::Black, Direction::Clockwise, false);
        assert!(player.clone().roll(&mut roller).is_err());
        let rolled = player.to_rolling().unwrap().roll(&mut roller).unwrap();
        assert_eq!(rolled.state(), PlayerState::Rolled);
    }

    #[test]
    fn players_need_opposite_directions() {
        let black = Player::new("a", Color::Black, Direction::Clockwise, false);
        let white = Player::new("b", Color::White, Direction::Clockwise, false);
        assert!(Players::new(black, white).is_err());
    }

    #[test]
    fn home_boards_follow_direction() {
        let board = Board::initialize();
        let white = Player::new("b", Color::White, Direction::Counterclockwise, false);
        assert_eq!(white.home_board(&board)[0].index(), 24);
        assert_eq!(white.opponent_board(&board)[0].index(), 1);
        assert!(!white.can_bear_off(&board));
        assert!(!white.has_checkers_on_bar(&board));
    }
}
