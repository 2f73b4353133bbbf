//! First-class invariants for the engine.
//!
//! Invariants are logical properties that must hold for every reachable
//! state. Transitions check them as postconditions in debug builds, and
//! snapshot reconstruction checks them always.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together.
///
/// Implemented for tuples of invariants over the same state.
pub trait InvariantSet<S> {
    /// Checks every invariant, collecting all violations.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! invariant_tuple {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

invariant_tuple!(I1);
invariant_tuple!(I1, I2);
invariant_tuple!(I1, I2, I3);
invariant_tuple!(I1, I2, I3, I4);

pub mod checker_conservation;
pub mod move_count;
pub mod pip_bounds;
pub mod point_exclusivity;

pub use checker_conservation::CheckerConservationInvariant;
pub use move_count::MoveCountInvariant;
pub use pip_bounds::PipBoundsInvariant;
pub use point_exclusivity::PointExclusivityInvariant;

/// Invariants every board satisfies.
pub type BoardInvariants = (CheckerConservationInvariant, PointExclusivityInvariant);

/// Invariants every game satisfies.
pub type GameInvariants = (
    CheckerConservationInvariant,
    PointExclusivityInvariant,
    PipBoundsInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn standard_board_satisfies_board_invariants() {
        assert!(BoardInvariants::check_all(&Board::initialize()).is_ok());
    }

    struct Never;

    impl Invariant<Board> for Never {
        fn holds(_: &Board) -> bool {
            false
        }

        fn description() -> &'static str {
            "never holds"
        }
    }

    #[test]
    fn violations_are_collected() {
        let result = <(Never, CheckerConservationInvariant, Never)>::check_all(&Board::initialize());
        let violations = result.unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].description, "never holds");
    }
}
