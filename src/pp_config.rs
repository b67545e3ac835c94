// Game Configuration
//
// Plain structs with defaults that reproduce the classic table-tennis game,
// loadable from a YAML scenario file. Omitted fields keep their defaults.

use serde::Deserialize;

use crate::pp_delay_model::{DEFAULT_SPEED_OF_LIGHT_FRACTION, DEFAULT_STANDARD_DEVIATION};
use crate::pp_error::PpError;
use crate::pp_interface::{Basis, SimTime};

// ============================================================================
// Main Configuration
// ============================================================================

/// Full description of one PingPong game
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub meta: ScenarioMeta,

    /// Random seed; drawn from entropy when absent
    pub seed: Option<u64>,

    /// Length of the connection between the players (km)
    pub distance_km: f64,

    /// Mean travel speed as a fraction of the speed of light
    pub speed_of_light_fraction: f64,

    /// Spread of the travel speed relative to its mean
    pub standard_deviation: f64,

    /// Simulated time to run for (ns)
    pub duration_ns: SimTime,

    pub players: Vec<PlayerConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    pub name: String,

    /// Exactly "Z" or "X"
    #[serde(deserialize_with = "deserialize_basis")]
    pub basis: Basis,

    /// Whether this player holds the qubit at the start
    #[serde(default)]
    pub serve: bool,
}

impl PlayerConfig {
    pub fn new(name: &str, basis: Basis, serve: bool) -> Self {
        Self {
            name: name.to_string(),
            basis,
            serve,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            meta: ScenarioMeta::default(),
            seed: None,
            // Regulation table length
            distance_km: 2.74 / 1000.0,
            speed_of_light_fraction: DEFAULT_SPEED_OF_LIGHT_FRACTION,
            standard_deviation: DEFAULT_STANDARD_DEVIATION,
            duration_ns: 91.0,
            players: vec![
                PlayerConfig::new("Ping", Basis::Z, true),
                PlayerConfig::new("Pong", Basis::X, false),
            ],
        }
    }
}

fn deserialize_basis<'de, D>(deserializer: D) -> Result<Basis, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl GameConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PpError> {
        let config: GameConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the game builder relies on
    pub fn validate(&self) -> Result<(), PpError> {
        if self.players.len() != 2 {
            return Err(PpError::Config {
                reason: format!("expected 2 players, got {}", self.players.len()),
            });
        }
        if self.players[0].name == self.players[1].name {
            return Err(PpError::Config {
                reason: format!("duplicate player name '{}'", self.players[0].name),
            });
        }
        let serving = self.players.iter().filter(|p| p.serve).count();
        if serving != 1 {
            return Err(PpError::Config {
                reason: format!("expected exactly 1 serving player, got {}", serving),
            });
        }

        if !(self.distance_km.is_finite() && self.distance_km >= 0.0) {
            return Err(PpError::InvalidParameter {
                name: "distance_km",
                value: self.distance_km,
            });
        }
        if !(self.duration_ns.is_finite() && self.duration_ns >= 0.0) {
            return Err(PpError::InvalidParameter {
                name: "duration_ns",
                value: self.duration_ns,
            });
        }
        // speed_of_light_fraction and standard_deviation are checked by the delay model
        Ok(())
    }
}
