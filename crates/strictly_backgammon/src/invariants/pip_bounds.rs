//! Pip counts stay in range and in step with the board.

use super::Invariant;
use crate::game::GameCore;
use crate::types::{CHECKERS_PER_PLAYER, Color, PIP_COUNT_CEILING};

/// Invariant: each player's stored pip count equals the board's, is at most
/// 15 × 25, and is zero exactly when all fifteen checkers are off.
pub struct PipBoundsInvariant;

impl Invariant<GameCore> for PipBoundsInvariant {
    fn holds(core: &GameCore) -> bool {
        Color::ALL.iter().all(|&color| {
            let stored = core.player(color).pip_count();
            let actual = core.board().pip_count(color);
            let all_off = core.board().off_count(color) == usize::from(CHECKERS_PER_PLAYER);
            stored == actual && stored <= PIP_COUNT_CEILING && (stored == 0) == all_off
        })
    }

    fn description() -> &'static str {
        "Pip counts match the board and stay within bounds"
    }
}
