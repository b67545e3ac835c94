use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::pp_error::PpError;

/// Simulated time in nanoseconds
pub type SimTime = f64;

/// Propagation speed of light in vacuum [km/s]
pub const SPEED_OF_LIGHT_KM_PER_S: f64 = 3e5;

/// Nanoseconds per second
pub const NS_PER_S: f64 = 1e9;

// ============================================================================
// Measurement Bases
// ============================================================================

/// The two measurement bases a player can measure in
///
/// The set is closed: `Z` is the standard basis and `X` the Hadamard basis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Basis {
    Z,
    X,
}

impl Basis {
    /// Pretty-print labels for outcome 0 and outcome 1
    pub const fn labels(self) -> [&'static str; 2] {
        match self {
            Basis::Z => ["|0>", "|1>"],
            Basis::X => ["|+>", "|->"],
        }
    }

    pub const fn label(self, outcome: Outcome) -> &'static str {
        self.labels()[outcome.index()]
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Z => write!(f, "Z"),
            Basis::X => write!(f, "X"),
        }
    }
}

impl FromStr for Basis {
    type Err = PpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Z" => Ok(Basis::Z),
            "X" => Ok(Basis::X),
            other => Err(PpError::InvalidBasis {
                value: other.to_string(),
            }),
        }
    }
}

/// Two-valued measurement result
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Zero,
    One,
}

impl Outcome {
    pub const fn index(self) -> usize {
        match self {
            Outcome::Zero => 0,
            Outcome::One => 1,
        }
    }
}

/// Outcome of a single measurement together with its probability
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Measurement {
    pub outcome: Outcome,
    pub probability: f64,
}

// ============================================================================
// Ports and Messages
// ============================================================================

/// Unit of transmission on a port
///
/// A well-formed PingPong message carries exactly one item; anything else is
/// a protocol violation on the receiving side.
#[derive(Clone, Debug, PartialEq)]
pub struct Message<P> {
    pub items: Vec<P>,
}

impl<P> Message<P> {
    pub fn new(items: Vec<P>) -> Self {
        Self { items }
    }

    pub fn single(item: P) -> Self {
        Self { items: vec![item] }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Bidirectional endpoint a protocol is attached to
///
/// The port is owned by whatever network the host engine builds; a protocol
/// only borrows it for the duration of one dispatch.
pub trait Port<P> {
    fn name(&self) -> &str;

    /// True when at least one inbound message is waiting
    fn has_input(&self) -> bool;

    /// Consume the oldest inbound message
    fn rx_input(&mut self) -> Option<Message<P>>;

    /// Queue an item for transmission; delivery timing is up to the host
    fn tx_output(&mut self, item: P);
}

/// Measurement primitive supplied by the host
///
/// May collapse the payload's internal state.
pub trait Measure<P> {
    fn measure(&mut self, payload: &mut P, basis: Basis) -> Measurement;
}

/// Read-only view of the host's simulated clock
pub trait Clock {
    fn now(&self) -> SimTime;
}

// ============================================================================
// Observations
// ============================================================================

/// One measurement made by one player, recorded once per cycle
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub time: SimTime,
    pub participant: String,
    pub label: &'static str,
    pub probability: f64,
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:5.1}: {} measured {} with probability {:.2}",
            self.time, self.participant, self.label, self.probability
        )
    }
}

/// Consumer of observations emitted by protocols
pub trait ObservationSink {
    fn record(&mut self, observation: &Observation);
}

// ============================================================================
// Protocols
// ============================================================================

/// Reactive process driven by the host's dispatcher
///
/// The host calls `on_port_input` whenever an arrival has been delivered to
/// the port this protocol is attached to. Returning from it is the
/// suspension point: the protocol is awaiting the next arrival.
pub trait NodeProtocol<P> {
    fn name(&self) -> &str;

    fn start(&mut self, port: &mut dyn Port<P>) -> Result<(), PpError>;

    fn on_port_input(&mut self, clock: &dyn Clock, port: &mut dyn Port<P>) -> Result<(), PpError>;

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

// ============================================================================
// Delay Context
// ============================================================================

/// Named numeric properties handed to a delay model per invocation
///
/// Channels carry their `length` [km] here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DelayContext {
    properties: IndexMap<String, f64>,
}

impl DelayContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_length(length: f64) -> Self {
        Self::new().with("length", length)
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.properties.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.properties.get(name).copied()
    }

    /// Look up a property a model cannot work without
    pub fn require(&self, name: &'static str) -> Result<f64, PpError> {
        self.get(name).ok_or(PpError::MissingParameter { name })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_labels() {
        assert_eq!(Basis::Z.label(Outcome::Zero), "|0>");
        assert_eq!(Basis::Z.label(Outcome::One), "|1>");
        assert_eq!(Basis::X.label(Outcome::Zero), "|+>");
        assert_eq!(Basis::X.label(Outcome::One), "|->");
    }

    #[test]
    fn test_basis_from_str() {
        assert_eq!("Z".parse::<Basis>(), Ok(Basis::Z));
        assert_eq!("X".parse::<Basis>(), Ok(Basis::X));
        for raw in ["z", "x", " X ", ""] {
            assert_eq!(
                raw.parse::<Basis>(),
                Err(PpError::InvalidBasis {
                    value: raw.to_string()
                })
            );
        }
        assert_eq!(
            "Y".parse::<Basis>(),
            Err(PpError::InvalidBasis {
                value: "Y".to_string()
            })
        );
    }

    #[test]
    fn test_observation_format() {
        let observation = Observation {
            time: 3.0,
            participant: "TestNode".to_string(),
            label: "|0>",
            probability: 1.0,
        };
        assert_eq!(
            observation.to_string(),
            "  3.0: TestNode measured |0> with probability 1.00"
        );

        let observation = Observation {
            time: 127.94,
            participant: "Pong".to_string(),
            label: "|->",
            probability: 0.4999999999999999,
        };
        assert_eq!(
            observation.to_string(),
            "127.9: Pong measured |-> with probability 0.50"
        );
    }

    #[test]
    fn test_delay_context() {
        let context = DelayContext::with_length(2.5).with("loss", 0.1);
        assert_eq!(context.get("length"), Some(2.5));
        assert_eq!(context.require("length"), Ok(2.5));
        assert_eq!(
            DelayContext::new().require("length"),
            Err(PpError::MissingParameter { name: "length" })
        );
        let names: Vec<&str> = context.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["length", "loss"]);
    }
}
