// Single-qubit payload and measurement primitive
//
// Only the Z and X bases are supported, and both have real-valued basis
// vectors, so a real two-component state vector is closed under every
// measurement the game performs.

use std::f64::consts::FRAC_1_SQRT_2;

use crate::pp_error::PpError;
use crate::pp_interface::{Basis, Measure, Measurement, Outcome};
use crate::pp_random::SharedRandom;

/// State of one qubit as amplitudes over |0> and |1>
///
/// Deliberately not `Clone`: a qubit can be moved between ports but never
/// copied, which lets the simulation check conservation.
#[derive(Debug, PartialEq)]
pub struct Qubit {
    amplitudes: [f64; 2],
}

impl Qubit {
    pub fn zero() -> Self {
        Self {
            amplitudes: [1.0, 0.0],
        }
    }

    pub fn one() -> Self {
        Self {
            amplitudes: [0.0, 1.0],
        }
    }

    pub fn plus() -> Self {
        Self {
            amplitudes: [FRAC_1_SQRT_2, FRAC_1_SQRT_2],
        }
    }

    pub fn minus() -> Self {
        Self {
            amplitudes: [FRAC_1_SQRT_2, -FRAC_1_SQRT_2],
        }
    }

    /// Build from unnormalised amplitudes
    pub fn from_amplitudes(zero: f64, one: f64) -> Result<Self, PpError> {
        let norm = (zero * zero + one * one).sqrt();
        if !(norm.is_finite() && norm > 0.0) {
            return Err(PpError::InvalidParameter {
                name: "amplitudes",
                value: norm,
            });
        }
        Ok(Self {
            amplitudes: [zero / norm, one / norm],
        })
    }

    /// `n` fresh qubits in |0>
    pub fn create(n: usize) -> Vec<Self> {
        (0..n).map(|_| Self::zero()).collect()
    }

    pub fn amplitudes(&self) -> [f64; 2] {
        self.amplitudes
    }

    /// Born-rule probability of `outcome` when measured in `basis`
    pub fn probability(&self, basis: Basis, outcome: Outcome) -> f64 {
        let [a0, a1] = self.amplitudes;
        let overlap = match (basis, outcome) {
            (Basis::Z, Outcome::Zero) => a0,
            (Basis::Z, Outcome::One) => a1,
            (Basis::X, Outcome::Zero) => (a0 + a1) * FRAC_1_SQRT_2,
            (Basis::X, Outcome::One) => (a0 - a1) * FRAC_1_SQRT_2,
        };
        (overlap * overlap).clamp(0.0, 1.0)
    }

    fn collapse(&mut self, basis: Basis, outcome: Outcome) {
        *self = match (basis, outcome) {
            (Basis::Z, Outcome::Zero) => Self::zero(),
            (Basis::Z, Outcome::One) => Self::one(),
            (Basis::X, Outcome::Zero) => Self::plus(),
            (Basis::X, Outcome::One) => Self::minus(),
        };
    }
}

/// Projective measurement of a `Qubit`, drawing outcomes from the shared source
pub struct QubitMeasurer {
    rng: SharedRandom,
}

impl QubitMeasurer {
    pub fn new(rng: SharedRandom) -> Self {
        Self { rng }
    }
}

impl Measure<Qubit> for QubitMeasurer {
    fn measure(&mut self, qubit: &mut Qubit, basis: Basis) -> Measurement {
        let p_zero = qubit.probability(basis, Outcome::Zero);
        let outcome = if self.rng.borrow_mut().uniform() < p_zero {
            Outcome::Zero
        } else {
            Outcome::One
        };
        let probability = qubit.probability(basis, outcome);

        qubit.collapse(basis, outcome);

        Measurement {
            outcome,
            probability,
        }
    }
}
