// Scenario Runner - Load and play PingPong scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/pingpong.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/pingpong.yaml --seed 0x2a

use std::env;
use std::fs;
use std::path::Path;

use log::LevelFilter;
use pp_rust::{GameConfig, GameResult, PingPongGame};
use simple_logger::SimpleLogger;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/pingpong.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/pingpong.yaml --seed 0x2a", args[0]);
        std::process::exit(1);
    }

    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Warn).env().init() {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let path = Path::new(&args[1]);

    // Parse optional seed; overrides the one in the file
    let seed: Option<u64> = if args.len() >= 4 && args[2] == "--seed" {
        Some(parse_seed(&args[3]))
    } else {
        None
    };

    if path.is_file() {
        run_scenario_file(path, seed);
    } else if path.is_dir() {
        run_scenario_directory(path, seed);
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    }
}

fn run_scenario_directory(dir: &Path, seed: Option<u64>) {
    let mut scenarios = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        std::process::exit(1);
    }

    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        run_scenario_file(scenario_path, seed);
    }

    println!("\nAll scenarios complete.");
}

fn run_scenario_file(path: &Path, seed: Option<u64>) {
    println!("Loading scenario from: {}", path.display());

    let yaml_content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path.display(), e);
        std::process::exit(1);
    });

    let mut config = GameConfig::from_yaml_str(&yaml_content).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path.display(), e);
        std::process::exit(1);
    });
    if seed.is_some() {
        config.seed = seed;
    }

    let title = config
        .meta
        .name
        .clone()
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "PingPong".to_string());
    println!("\n=== {} ===\n", title);
    if let Some(ref desc) = config.meta.description {
        println!("{}\n", desc);
    }

    println!("Configuration:");
    println!("  Distance: {} km", config.distance_km);
    println!(
        "  Speed: {:.0}% of c (std {:.0}%)",
        config.speed_of_light_fraction * 100.0,
        config.standard_deviation * 100.0
    );
    println!("  Duration: {} ns", config.duration_ns);
    for player in &config.players {
        println!(
            "  Player {}: basis {}{}",
            player.name,
            player.basis,
            if player.serve { " (serves)" } else { "" }
        );
    }
    println!();

    let result = PingPongGame::from_config(config)
        .and_then(|mut game| game.run())
        .unwrap_or_else(|e| {
            eprintln!("Scenario failed: {}", e);
            std::process::exit(1);
        });

    print_summary(&result);
}

fn print_summary(result: &GameResult) {
    print!("{}", result.transcript());
    println!();
    println!("{}", result.stats);
    println!("  seed used: {:#x}", result.seed_used);
}

fn parse_seed(raw: &str) -> u64 {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse::<u64>(),
    };
    parsed.unwrap_or_else(|e| {
        eprintln!("Invalid seed '{}': {}", raw, e);
        std::process::exit(1);
    })
}
