// Error taxonomy for the PingPong game
//
// Every variant is a contract violation by a caller or by the host engine,
// never a transient condition, so nothing in this crate retries.

use std::fmt;

use crate::pp_interface::SimTime;

/// Errors surfaced by delay models, protocols and the simulation host
#[derive(Debug, Clone, PartialEq)]
pub enum PpError {
    /// A delay model was invoked without a property it requires
    MissingParameter { name: &'static str },

    /// An arrival carried a number of items other than exactly one
    ProtocolViolation { participant: String, items: usize },

    /// A basis name outside the two supported bases
    InvalidBasis { value: String },

    /// A construction parameter outside its valid range
    InvalidParameter { name: &'static str, value: f64 },

    /// A channel produced a delay the event queue cannot schedule
    InvalidDelay { channel: String, delay: SimTime },

    /// Node index not present in the simulation
    UnknownNode { node: usize },

    /// Port name not present on the node
    UnknownPort { node: String, port: String },

    /// Protocol index not present in the simulation
    UnknownProtocol { protocol: usize },

    /// Scenario configuration could not be parsed or validated
    Config { reason: String },
}

impl fmt::Display for PpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParameter { name } => write!(f, "missing required parameter '{}'", name),
            Self::ProtocolViolation { participant, items } => write!(
                f,
                "protocol violation on {}: expected exactly one item, got {}",
                participant, items
            ),
            Self::InvalidBasis { value } => {
                write!(f, "invalid basis '{}' (expected Z or X)", value)
            }
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid value {} for parameter '{}'", value, name)
            }
            Self::InvalidDelay { channel, delay } => {
                write!(f, "channel {} produced unusable delay {}", channel, delay)
            }
            Self::UnknownNode { node } => write!(f, "unknown node #{}", node),
            Self::UnknownPort { node, port } => write!(f, "node {} has no port '{}'", node, port),
            Self::UnknownProtocol { protocol } => write!(f, "unknown protocol #{}", protocol),
            Self::Config { reason } => write!(f, "configuration error: {}", reason),
        }
    }
}

impl std::error::Error for PpError {}

impl From<serde_yaml::Error> for PpError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PpError::MissingParameter { name: "length" };
        assert_eq!(err.to_string(), "missing required parameter 'length'");

        let err = PpError::ProtocolViolation {
            participant: "Pong".to_string(),
            items: 2,
        };
        assert_eq!(
            err.to_string(),
            "protocol violation on Pong: expected exactly one item, got 2"
        );
    }

    #[test]
    fn test_yaml_error_becomes_config_error() {
        let err = serde_yaml::from_str::<Vec<u32>>("not: [a list").unwrap_err();
        assert!(matches!(PpError::from(err), PpError::Config { .. }));
    }
}
