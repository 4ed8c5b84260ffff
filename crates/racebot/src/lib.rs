//! racebot - autonomous racing bot client
//!
//! Library half of the `racebot` binary: config loading and the connection
//! loop that feeds the [`racebot_engine::RaceEngine`].

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod connection;
pub mod error;

pub use config::{load_config, parse_config};
pub use connection::{JoinMode, SessionStats, connect, join_command, run};
pub use error::BotError;
