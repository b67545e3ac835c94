// Shared random source
//
// All stochastic draws in a simulation (channel delays, measurement outcomes)
// come from one RandomSource. It is created by whoever drives the simulation
// and handed to models as a SharedRandom; models never create their own.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::pp_error::PpError;

/// Handle to the random source shared by every model in one simulation
///
/// Draws happen in the order the single-threaded engine dispatches events,
/// which keeps a seeded run reproducible.
pub type SharedRandom = Rc<RefCell<RandomSource>>;

/// Seedable PRNG with the sampling operations the models need
pub struct RandomSource {
    rng: StdRng,
    seed: u64,
}

impl RandomSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from OS entropy; the chosen seed is still recorded
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::thread_rng().gen())
    }

    pub fn shared(seed: u64) -> SharedRandom {
        Rc::new(RefCell::new(Self::from_seed(seed)))
    }

    /// Restart the sequence from `seed`
    ///
    /// Independent runs reseed instead of reusing a source, so no entropy
    /// state leaks from one run into the next.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = seed;
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in [0, 1)
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Gaussian draw; a zero standard deviation returns `mean` exactly
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> Result<f64, PpError> {
        let normal = Normal::new(mean, std_dev).map_err(|_| PpError::InvalidParameter {
            name: "std_dev",
            value: std_dev,
        })?;
        Ok(normal.sample(&mut self.rng))
    }
}
