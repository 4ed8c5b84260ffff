//! Wire protocol for the race simulation server.
//!
//! The server speaks newline-delimited JSON. Every frame has the shape
//! `{"msgType": string, "data": <payload>}` with optional `gameId` and
//! `gameTick` fields. This crate decodes inbound frames into
//! [`InboundMessage`] values and encodes outbound [`Command`]s.
//!
//! # Inbound messages
//!
//! | msgType          | Payload                |
//! |------------------|------------------------|
//! | `join`           | echo of the join data  |
//! | `yourCar`        | [`CarId`]              |
//! | `gameInit`       | [`GameInit`]           |
//! | `gameStart`      | none                   |
//! | `carPositions`   | `Vec<`[`CarPosition`]`>` |
//! | `crash`, `spawn` | [`CarId`]              |
//! | `lapFinished`    | [`LapFinished`]        |
//! | `turboAvailable` | [`TurboAvailable`]     |
//! | `gameEnd`        | results (ignored)      |
//! | `error`          | message string         |
//!
//! Any other `msgType` decodes to [`InboundMessage::Unknown`].
//!
//! # Usage
//!
//! ```rust
//! use racebot_protocol::{decode_line, encode_line, Command, InboundMessage};
//!
//! let inbound = decode_line(r#"{"msgType":"yourCar","data":{"name":"Bot","color":"red"}}"#)?;
//! assert!(matches!(inbound.message, InboundMessage::YourCar(ref id) if id.color == "red"));
//!
//! let line = encode_line(&Command::Throttle(0.5))?;
//! assert_eq!(line, "{\"msgType\":\"throttle\",\"data\":0.5}\n");
//! # Ok::<(), racebot_protocol::ProtocolError>(())
//! ```

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod inbound;
pub mod outbound;
pub mod types;

pub use error::ProtocolError;
pub use inbound::{Inbound, InboundMessage, RawFrame, decode_line};
pub use outbound::{BotId, Command, Empty, JoinRace, LaneDirection, encode_line};
pub use types::{
    CarData, CarDimensions, CarId, CarPosition, GameInit, LaneData, LanePosition, LapFinished,
    LapTime, PieceData, PiecePosition, RaceData, RaceSession, TrackData, TurboAvailable,
};

/// A specialized `Result` type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
