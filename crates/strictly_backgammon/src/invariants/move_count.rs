//! Move-count law: four moves for a double, two otherwise.

use super::Invariant;
use crate::play::Play;

/// Invariant: a play holds four moves iff its roll is a double, else two,
/// and the moves use the roll's faces.
pub struct MoveCountInvariant;

impl Invariant<Play> for MoveCountInvariant {
    fn holds(play: &Play) -> bool {
        let mut dice: Vec<_> = play.moves().iter().map(|m| m.die_value()).collect();
        let mut faces = play.roll().die_values();
        dice.sort();
        faces.sort();
        let expected_len = if play.roll().is_double() { 4 } else { 2 };
        play.moves().len() == expected_len && dice == faces
    }

    fn description() -> &'static str {
        "A play has four moves for a double and two otherwise"
    }
}
