//! racebot - autonomous racing bot
//!
//! Connects to a race server, joins a race and drives the car until the
//! server closes the connection.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use racebot::{BotError, JoinMode, connect, join_command, load_config, run};
use racebot_engine::RaceEngine;
use racebot_protocol::BotId;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "racebot")]
#[command(about = "Autonomous racing bot for the newline-delimited JSON race server")]
#[command(version)]
#[command(long_about = "
racebot connects to a race server over TCP, joins a race and answers every
position update with a throttle, lane switch or turbo command.

Without --track the server assigns a race; with --track a specific track
is requested via joinRace.
")]
struct Cli {
    /// Race server host name or address
    host: String,

    /// Race server port
    port: u16,

    /// Bot name shown by the server
    name: String,

    /// Bot key issued by the server
    key: String,

    /// Request a specific track
    #[arg(long)]
    track: Option<String>,

    /// Number of cars in the requested race
    #[arg(long, default_value_t = 1, requires = "track")]
    car_count: u32,

    /// Password of the requested race
    #[arg(long, requires = "track")]
    password: Option<String>,

    /// YAML file overriding engine parameters
    #[arg(long, env = "RACEBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn join_mode(&self) -> JoinMode {
        match &self.track {
            None => JoinMode::Quick,
            Some(track_name) => JoinMode::Track {
                track_name: track_name.clone(),
                password: self.password.clone(),
                car_count: self.car_count,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("racebot={log_level},racebot_engine={log_level},racebot_protocol={log_level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match race(&cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let code = e.downcast_ref::<BotError>().map_or(1, BotError::exit_code);
            eprintln!("Error: {e:#}");
            std::process::exit(code);
        }
    }
}

async fn race(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let mut engine = RaceEngine::new(config);
    let join = join_command(
        BotId {
            name: cli.name.clone(),
            key: cli.key.clone(),
        },
        &cli.join_mode(),
    );

    let stream = connect(&cli.host, cli.port).await?;
    let (read_half, mut write_half) = stream.into_split();
    let stats = run(BufReader::new(read_half), &mut write_half, &join, &mut engine).await?;
    info!(
        races = stats.races_finished,
        sent = stats.sent,
        "Session finished"
    );
    Ok(())
}
