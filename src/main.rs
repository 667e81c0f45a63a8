//! Grush Crusher - Entry Point
//!
//! Speaks the line protocol on stdin/stdout: announces the bot name, reads
//! the game setup, then answers every tick with one command per agent.
//! Diagnostics go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use grush_crusher::ai::{SquadAI, SquadCommander};
use grush_crusher::core::{load_config, BotConfig, BotError, Command, Result};
use grush_crusher::protocol::{write_commands, write_name, ProtocolReader};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "grush-crusher")]
#[command(about = "Squad controller for the fog-of-war gold game")]
struct Args {
    /// Controller config TOML (defaults to built-in values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed, overrides the config
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter for stderr diagnostics
    #[arg(long, default_value = "grush_crusher=info")]
    log: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(args.log.as_str())
        .with_writer(io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => BotConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut reader = ProtocolReader::new(stdin.lock());

    write_name(&mut out)?;
    let setup = reader.read_setup()?;
    info!(
        "Grush Crusher starting: {}x{} board, {} players, base at {}",
        setup.size, setup.size, setup.player_count, setup.my_base
    );

    let mut commander = SquadCommander::new(setup, config)?;
    play(&mut reader, &mut out, &mut commander)?;

    info!("input closed after {} ticks", commander.tick());
    Ok(())
}

/// Tick loop; only I/O failures end it early
fn play<R, W, A>(reader: &mut ProtocolReader<R>, out: &mut W, ai: &mut A) -> Result<()>
where
    R: io::BufRead,
    W: Write,
    A: SquadAI,
{
    loop {
        let agents = match reader.read_tick() {
            Ok(Some(agents)) => agents,
            Ok(None) => return Ok(()),
            Err(e @ BotError::IoError(_)) => return Err(e),
            Err(e) => {
                warn!("skipping malformed tick: {}", e);
                continue;
            }
        };

        let count = agents.len();
        ai.update(agents);
        let commands = match ai.decide() {
            Ok(commands) => commands,
            Err(e) => {
                // keep the server in step with a harmless order per agent
                error!("decision failed: {}", e);
                vec![Command::Mine; count]
            }
        };
        write_commands(out, &commands)?;
    }
}
