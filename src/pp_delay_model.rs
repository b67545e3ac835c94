// Channel delay models
//
// A delay model turns a channel's properties into a propagation delay [ns].
// Models declare which properties they need; calling one without them is a
// contract violation reported as MissingParameter.

use crate::pp_error::PpError;
use crate::pp_interface::{DelayContext, SimTime, NS_PER_S, SPEED_OF_LIGHT_KM_PER_S};
use crate::pp_random::SharedRandom;

pub const DEFAULT_SPEED_OF_LIGHT_FRACTION: f64 = 0.5;
pub const DEFAULT_STANDARD_DEVIATION: f64 = 0.05;

pub trait DelayModel {
    /// Context properties that must be present on every call
    fn required_properties(&self) -> &[&'static str];

    /// Draw a delay; the context has already been checked
    fn generate_delay(&self, context: &DelayContext) -> Result<SimTime, PpError>;

    /// Check the required properties, then draw a delay [ns]
    fn compute_delay(&self, context: &DelayContext) -> Result<SimTime, PpError> {
        for name in self.required_properties() {
            context.require(name)?;
        }
        self.generate_delay(context)
    }
}

// ============================================================================
// PingPong Delay Model
// ============================================================================

/// Travel at a Gaussian-distributed fraction of the speed of light
///
/// The speed of each transmission is drawn from
/// `Normal(fraction * c, fraction * c * standard_deviation)` and the delay is
/// `1e9 * length / speed` nanoseconds, with `length` in km.
///
/// # Example
/// ```rust
/// use pp_rust::pp_delay_model::{DelayModel, PingPongDelayModel};
/// use pp_rust::pp_interface::DelayContext;
/// use pp_rust::pp_random::RandomSource;
///
/// let rng = RandomSource::shared(42);
/// let model = PingPongDelayModel::with_parameters(1.0, 0.0, rng)?;
///
/// let delay = model.compute_delay(&DelayContext::with_length(1.0))?;
/// assert!((delay - 1e9 / 3e5).abs() < 1e-9);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PingPongDelayModel {
    speed: f64,
    std: f64,
    rng: SharedRandom,
}

impl PingPongDelayModel {
    /// Model with the default fraction (0.5) and deviation (0.05)
    pub fn new(rng: SharedRandom) -> Self {
        Self {
            speed: DEFAULT_SPEED_OF_LIGHT_FRACTION * SPEED_OF_LIGHT_KM_PER_S,
            std: DEFAULT_STANDARD_DEVIATION,
            rng,
        }
    }

    /// # Errors
    /// `InvalidParameter` if the fraction is outside (0, 1] or the deviation
    /// is negative or not finite.
    pub fn with_parameters(
        speed_of_light_fraction: f64,
        standard_deviation: f64,
        rng: SharedRandom,
    ) -> Result<Self, PpError> {
        if !(speed_of_light_fraction > 0.0 && speed_of_light_fraction <= 1.0) {
            return Err(PpError::InvalidParameter {
                name: "speed_of_light_fraction",
                value: speed_of_light_fraction,
            });
        }
        if !(standard_deviation.is_finite() && standard_deviation >= 0.0) {
            return Err(PpError::InvalidParameter {
                name: "standard_deviation",
                value: standard_deviation,
            });
        }

        Ok(Self {
            speed: speed_of_light_fraction * SPEED_OF_LIGHT_KM_PER_S,
            std: standard_deviation,
            rng,
        })
    }

    /// Mean travel speed [km/s]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Standard deviation relative to the mean speed
    pub fn std(&self) -> f64 {
        self.std
    }
}

impl DelayModel for PingPongDelayModel {
    fn required_properties(&self) -> &[&'static str] {
        &["length"]
    }

    fn generate_delay(&self, context: &DelayContext) -> Result<SimTime, PpError> {
        let length = context.require("length")?;
        let speed = self
            .rng
            .borrow_mut()
            .normal(self.speed, self.speed * self.std)?;
        Ok(NS_PER_S * length / speed)
    }
}

// ============================================================================
// Fixed Delay Model
// ============================================================================

/// Constant delay regardless of channel properties
pub struct FixedDelayModel {
    delay: SimTime,
}

impl FixedDelayModel {
    pub fn new(delay: SimTime) -> Result<Self, PpError> {
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(PpError::InvalidParameter {
                name: "delay",
                value: delay,
            });
        }
        Ok(Self { delay })
    }
}

impl DelayModel for FixedDelayModel {
    fn required_properties(&self) -> &[&'static str] {
        &[]
    }

    fn generate_delay(&self, _context: &DelayContext) -> Result<SimTime, PpError> {
        Ok(self.delay)
    }
}
