//! Headless Skirmish Runner
//!
//! Runs the squad controller in a generated arena and outputs a JSON report
//! for tuning controller weights.

use std::path::PathBuf;

use clap::Parser;
use grush_crusher::ai::SquadCommander;
use grush_crusher::core::{load_config, BotConfig, Result};
use grush_crusher::sim::{Arena, ArenaConfig};
use serde::Serialize;

/// Headless Skirmish Runner - one squad against the clock
#[derive(Parser, Debug)]
#[command(name = "skirmish_runner")]
#[command(about = "Run the squad controller in a generated arena and report gold delivered")]
struct Args {
    /// Controller config TOML (defaults to built-in values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Board side length
    #[arg(long, default_value_t = 16)]
    size: usize,

    /// Announced player count (1-4)
    #[arg(long, default_value_t = 2)]
    players: usize,

    /// Squad size
    #[arg(long, default_value_t = 4)]
    agents: usize,

    /// Number of gold deposits
    #[arg(long, default_value_t = 10)]
    gold: usize,

    /// Chance of a wall per cell
    #[arg(long, default_value_t = 0.12)]
    walls: f64,

    /// Ticks to run
    #[arg(long, default_value_t = 300)]
    ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Log filter for stderr diagnostics
    #[arg(long, default_value = "grush_crusher=warn")]
    log: String,
}

/// JSON output structure
#[derive(Serialize)]
struct SkirmishReport {
    seed: u64,
    size: usize,
    agents: usize,
    ticks: u64,
    gold_delivered: u32,
    gold_remaining: u32,
    explored_fraction: f32,
    failed_ticks: u64,
    command_counts: std::collections::BTreeMap<String, u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(args.log.as_str())
        .with_writer(std::io::stderr)
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => BotConfig::default(),
    };

    let arena_config = ArenaConfig {
        size: args.size,
        players: args.players,
        agents: args.agents,
        wall_density: args.walls,
        gold_deposits: args.gold,
        ..ArenaConfig::default()
    };
    let mut arena = Arena::generate(arena_config, seed)?;
    let mut commander = SquadCommander::with_seed(arena.setup(args.ticks), config, seed)?;

    let stats = arena.run(&mut commander, args.ticks);

    let report = SkirmishReport {
        seed,
        size: args.size,
        agents: args.agents,
        ticks: stats.ticks,
        gold_delivered: stats.gold_delivered,
        gold_remaining: stats.gold_remaining,
        explored_fraction: 1.0 - commander.map().fog_fraction(),
        failed_ticks: stats.failed_ticks,
        command_counts: stats.command_counts,
    };

    match args.format.as_str() {
        "text" => {
            println!("Skirmish Result");
            println!("===============");
            println!("Gold delivered: {}", report.gold_delivered);
            println!("Gold remaining: {}", report.gold_remaining);
            println!("Explored: {:.1}%", report.explored_fraction * 100.0);
            println!("Failed ticks: {}", report.failed_ticks);
            for (command, count) in &report.command_counts {
                println!("  {:<5} {}", command, count);
            }
            println!();
            println!("Seed: {}", report.seed);
        }
        format => {
            if format != "json" {
                eprintln!("Unknown format '{}', defaulting to json", format);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
