// PingPong Game - the classic two-player example
//
// Ping serves a |0> qubit over a table-length connection and measures in Z,
// Pong measures in X. Prints every measurement as it happens, then a summary.
//
// Usage:
//   cargo run --example pingpong_game [SEED]

use std::env;

use log::{info, LevelFilter};
use pp_rust::{GameConfig, Observation, ObservationSink, PingPongGame};
use simple_logger::SimpleLogger;

/// Prints observations to stdout as they are recorded
#[derive(Clone)]
struct StdoutSink;

impl ObservationSink for StdoutSink {
    fn record(&mut self, observation: &Observation) {
        println!("{}", observation);
    }
}

fn main() {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).env().init() {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let seed = env::args().nth(1).map(|s| {
        s.parse::<u64>().unwrap_or_else(|e| {
            eprintln!("Invalid seed '{}': {}", s, e);
            std::process::exit(1);
        })
    });

    let config = GameConfig {
        seed,
        ..GameConfig::default()
    };
    info!("starting");

    let result = PingPongGame::with_sink(config, StdoutSink)
        .and_then(|mut game| game.run())
        .unwrap_or_else(|e| {
            eprintln!("Game failed: {}", e);
            std::process::exit(1);
        });

    println!();
    println!("{}", result.stats);
    println!(
        "  Ping: {} measurement(s), Pong: {} measurement(s)",
        result.observations_by("Ping").count(),
        result.observations_by("Pong").count()
    );
    println!("  seed used: {}", result.seed_used);
}
