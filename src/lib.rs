//! # pp_rust - Quantum PingPong
//!
//! Two players pass a single qubit back and forth over a noisy channel. Each
//! player measures the qubit in its own basis every time it arrives, records
//! what it saw and sends it back.
//!
//! ## Core Components
//!
//! - **PingPongDelayModel**: channel delay drawn from a Gaussian travel speed
//! - **PingPongProtocol**: the per-player receive, measure, send loop
//! - **Simulation**: a small discrete-event host that wires ports together
//! - **PingPongGame**: builds a two-player game from a `GameConfig`
//!
//! The protocol only talks to the host through the `Port`, `Clock` and
//! `Measure` traits, so it can be driven by any event engine that provides
//! them.
//!
//! ```no_run
//! use pp_rust::{GameConfig, PingPongGame};
//!
//! let config = GameConfig {
//!     seed: Some(42),
//!     ..GameConfig::default()
//! };
//! let mut game = PingPongGame::from_config(config)?;
//! let result = game.run()?;
//! print!("{}", result.transcript());
//! # Ok::<(), pp_rust::PpError>(())
//! ```

// Core game modules
pub mod pp_error;
pub mod pp_interface;
pub mod pp_delay_model;
pub mod pp_protocol;
pub mod pp_qubit;
pub mod pp_random;

// Host side
pub mod pp_memory_port;
pub mod pp_simulation;
pub mod pp_sinks;

// Configuration and game setup
pub mod pp_config;
pub mod pp_game;

// Re-export commonly used types
pub use pp_config::{GameConfig, PlayerConfig, ScenarioMeta};
pub use pp_delay_model::{DelayModel, FixedDelayModel, PingPongDelayModel};
pub use pp_error::PpError;
pub use pp_game::{GameResult, PingPongGame};
pub use pp_interface::{
    Basis, Clock, DelayContext, Measure, Message, NodeProtocol, Observation, ObservationSink,
    Outcome, Port, SimTime,
};
pub use pp_protocol::PingPongProtocol;
pub use pp_qubit::{Qubit, QubitMeasurer};
pub use pp_random::{RandomSource, SharedRandom};
pub use pp_simulation::{DirectConnection, QuantumChannel, SimStats, Simulation};
pub use pp_sinks::{LogSink, NoOpSink, RecordingSink};
