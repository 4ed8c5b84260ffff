//! Error types for the racebot client

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server closed the connection after {received} messages")]
    ConnectionClosed { received: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] racebot_engine::ConfigError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] racebot_protocol::ProtocolError),
}

impl BotError {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigRead { .. } | Self::ConfigParse { .. } | Self::InvalidConfiguration(_) => 2,
            Self::Connect { .. } => 3,
            Self::ConnectionClosed { .. } | Self::Io(_) | Self::Protocol(_) => 1,
        }
    }
}
