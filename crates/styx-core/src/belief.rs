// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::error::{StyxError, StyxResult};

/// Minimum mass required before a belief counts as "certain".
pub const CERTAINTY_THRESHOLD: f64 = 0.95;

/// Margin a state must win by to be considered dominant.
pub const DOMINANT_MARGIN: f64 = 0.1;

/// Tolerance for the sum invariant.
pub const BELIEF_SUM_EPSILON: f64 = 1e-9;

/// The dominant state of a belief distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeliefState {
    Alive,
    Dead,
    Unknown,
}

impl fmt::Display for BeliefState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeliefState::Alive => write!(f, "ALIVE"),
            BeliefState::Dead => write!(f, "DEAD"),
            BeliefState::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A probability distribution over node liveness.
///
/// Invariant: alive + dead + unknown = 1.0 within [`BELIEF_SUM_EPSILON`].
/// Construction fails otherwise; every `Belief` in circulation satisfies it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Belief {
    alive: Confidence,
    dead: Confidence,
    unknown: Confidence,
}

impl Belief {
    pub fn new(alive: f64, dead: f64, unknown: f64) -> StyxResult<Self> {
        let sum = alive + dead + unknown;
        if !((sum - 1.0).abs() <= BELIEF_SUM_EPSILON) {
            return Err(StyxError::BeliefInvalidSum(sum));
        }
        Ok(Self {
            alive: Confidence::new(alive)?,
            dead: Confidence::new(dead)?,
            unknown: Confidence::new(unknown)?,
        })
    }

    /// Pure uncertainty: (0, 0, 1). The only sanctioned way to express
    /// "I have no information".
    pub fn unknown_belief() -> Self {
        Self {
            alive: Confidence::zero(),
            dead: Confidence::zero(),
            unknown: Confidence::one(),
        }
    }

    /// Absolute certainty of liveness. Use with caution.
    pub fn certainly_alive() -> Self {
        Self {
            alive: Confidence::one(),
            dead: Confidence::zero(),
            unknown: Confidence::zero(),
        }
    }

    /// Absolute certainty of death. Triggers irreversible semantics
    /// downstream; use with caution.
    pub fn certainly_dead() -> Self {
        Self {
            alive: Confidence::zero(),
            dead: Confidence::one(),
            unknown: Confidence::zero(),
        }
    }

    pub fn alive(&self) -> Confidence {
        self.alive
    }

    pub fn dead(&self) -> Confidence {
        self.dead
    }

    pub fn unknown(&self) -> Confidence {
        self.unknown
    }

    pub fn is_certain_alive(&self) -> bool {
        self.alive.value() >= CERTAINTY_THRESHOLD
    }

    pub fn is_certain_dead(&self) -> bool {
        self.dead.value() >= CERTAINTY_THRESHOLD
    }

    /// The state with the highest mass, requiring a [`DOMINANT_MARGIN`]
    /// lead over both others. No clear winner yields `Unknown`.
    pub fn dominant(&self) -> BeliefState {
        let alive = self.alive.value();
        let dead = self.dead.value();
        let unknown = self.unknown.value();

        if alive > dead + DOMINANT_MARGIN && alive > unknown + DOMINANT_MARGIN {
            return BeliefState::Alive;
        }
        if dead > alive + DOMINANT_MARGIN && dead > unknown + DOMINANT_MARGIN {
            return BeliefState::Dead;
        }
        BeliefState::Unknown
    }

    pub fn is_valid(&self) -> bool {
        let sum = self.alive.value() + self.dead.value() + self.unknown.value();
        (sum - 1.0).abs() < BELIEF_SUM_EPSILON
    }

    pub fn approx_eq(&self, other: &Belief) -> bool {
        self.alive.approx_eq(other.alive)
            && self.dead.approx_eq(other.dead)
            && self.unknown.approx_eq(other.unknown)
    }
}

impl fmt::Display for Belief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[A:{:.0}% D:{:.0}% U:{:.0}%] -> {}",
            self.alive.value() * 100.0,
            self.dead.value() * 100.0,
            self.unknown.value() * 100.0,
            self.dominant()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_bad_sum() {
        assert!(matches!(
            Belief::new(0.5, 0.5, 0.5),
            Err(StyxError::BeliefInvalidSum(_))
        ));
        assert!(matches!(
            Belief::new(0.1, 0.1, 0.1),
            Err(StyxError::BeliefInvalidSum(_))
        ));
        assert!(Belief::new(0.3, 0.3, 0.4).is_ok());
    }

    #[test]
    fn rejects_nan_component() {
        assert!(Belief::new(f64::NAN, 0.5, 0.5).is_err());
    }

    #[test]
    fn unknown_belief_is_pure_uncertainty() {
        let b = Belief::unknown_belief();
        assert!(b.alive().is_zero());
        assert!(b.dead().is_zero());
        assert!(b.unknown().is_one());
        assert_eq!(b.dominant(), BeliefState::Unknown);
        assert!(b.is_valid());
    }

    #[test]
    fn dominant_requires_margin() {
        let alive = Belief::new(0.8, 0.1, 0.1).unwrap();
        assert_eq!(alive.dominant(), BeliefState::Alive);

        let dead = Belief::new(0.1, 0.8, 0.1).unwrap();
        assert_eq!(dead.dominant(), BeliefState::Dead);

        // 0.45 does not lead 0.4 by the required 0.1.
        let close = Belief::new(0.45, 0.4, 0.15).unwrap();
        assert_eq!(close.dominant(), BeliefState::Unknown);
    }

    #[test]
    fn certainty_flags() {
        assert!(Belief::new(0.95, 0.02, 0.03).unwrap().is_certain_alive());
        assert!(!Belief::new(0.94, 0.02, 0.04).unwrap().is_certain_alive());
        assert!(Belief::certainly_dead().is_certain_dead());
    }

    proptest! {
        #[test]
        fn constructed_beliefs_satisfy_sum_invariant(
            alive in 0.0f64..=1.0,
            dead in 0.0f64..=1.0,
        ) {
            prop_assume!(alive + dead <= 1.0);
            let unknown = (1.0 - alive - dead).max(0.0);
            let b = Belief::new(alive, dead, unknown).expect("valid distribution");
            prop_assert!(b.is_valid());
            let sum = b.alive().value() + b.dead().value() + b.unknown().value();
            prop_assert!((sum - 1.0).abs() < BELIEF_SUM_EPSILON);
        }
    }
}
