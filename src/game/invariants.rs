//! Match invariants - sanity checks that detect engine bugs.
//!
//! Agents never touch the authoritative board, so none of these can be
//! triggered by a misbehaving bot. If one fires, the engine itself is wrong
//! and the match cannot continue.

use std::fmt;

use crate::game::board::{CITIES, CITY, MAX_HEIGHT, SUNK};
use crate::game::state::{Match, SURVIVOR_SCORE};

/// Invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all match invariants.
///
/// Returns the violations found, or an empty list if everything holds.
#[must_use]
pub fn check_invariants(state: &Match) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut violation = |message: String| violations.push(InvariantViolation { message });

    for (pos, height) in state.terrain().iter() {
        if !(SUNK..=MAX_HEIGHT).contains(&height) {
            violation(format!("cell {pos} has height {height}, outside {SUNK}..={MAX_HEIGHT}"));
        }
    }

    for (idx, &city) in CITIES.iter().enumerate() {
        let height = state.terrain()[city];
        if height != CITY && height != SUNK {
            violation(format!("city {idx} at {city} has height {height}"));
        }
    }

    let alive = state.alive();
    for (idx, eliminated) in state.eliminated_rounds().iter().enumerate() {
        match (alive[idx], eliminated) {
            (true, Some(round)) => {
                violation(format!("agent {idx} is alive but was eliminated in round {round}"));
            }
            (false, None) => violation(format!("agent {idx} is sunk without an elimination round")),
            (false, Some(round)) if *round >= state.round() => violation(format!(
                "agent {idx} eliminated in round {round}, but only {} rounds were played",
                state.round()
            )),
            _ => {}
        }
    }

    if let Some(scores) = state.scores() {
        for (idx, (&score, eliminated)) in scores.iter().zip(state.eliminated_rounds()).enumerate() {
            let expected = eliminated.unwrap_or(SURVIVOR_SCORE);
            if score != expected {
                violation(format!("agent {idx} scored {score}, expected {expected}"));
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::agent::Agent;
    use crate::game::board::Coord;
    use crate::game::state::MatchConfig;

    fn create_valid_match() -> Match {
        let agents = (0..4)
            .map(|i| Agent::from_fn(format!("P{i}"), "PS", |_, _, _| None))
            .collect();
        Match::new(agents, 0, MatchConfig::default()).unwrap()
    }

    #[test]
    fn test_valid_match_passes() {
        let mut game = create_valid_match();
        assert!(check_invariants(&game).is_empty());
        for _ in 0..10 {
            game.step().unwrap();
        }
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_detects_overstacked_cell() {
        let mut game = create_valid_match();
        game.terrain_mut().set(Coord::new(3, 3), 9);
        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("(3, 3)"));
    }

    #[test]
    fn test_detects_raised_city() {
        let mut game = create_valid_match();
        game.terrain_mut().set(CITIES[1], 2);
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("city 1")));
    }

    #[test]
    fn test_detects_unrecorded_elimination() {
        let mut game = create_valid_match();
        game.terrain_mut().set(CITIES[0], SUNK);
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("without an elimination round")));
    }

    #[test]
    fn test_detects_elimination_in_future() {
        let mut game = create_valid_match();
        game.terrain_mut().set(CITIES[0], SUNK);
        game.eliminated_mut()[0] = Some(0);
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("only 0 rounds")));
    }

    #[test]
    fn test_step_aborts_on_violation() {
        let mut game = create_valid_match();
        game.terrain_mut().set(CITIES[3], 4);
        assert!(game.step().is_err());
        assert!(!game.running());
        assert!(game.step().is_err());
    }
}
