//! Rules of movement for backgammon.
//!
//! Pure functions over a [`Board`](crate::Board): which moves a die allows,
//! when bearing off is permitted, and when a color has won. All distance
//! arithmetic happens in the mover's own frame, where the bar is 25 and
//! bearing off lands on 0.

pub mod bear_off;
pub mod movegen;
pub mod win;

pub use bear_off::{can_bear_off, highest_occupied};
pub use movegen::{blocked_reason, possible_moves};
pub use win::{has_borne_off_all, winner};
