//! Inbound frame decoding.
//!
//! Decoding is two-staged: the line is first parsed into a [`RawFrame`]
//! (type tag plus untyped payload), then the payload is deserialized into the
//! type matching the tag. This keeps unknown message types decodable and lets
//! payload errors name the message they came from.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::types::{CarId, CarPosition, GameInit, LapFinished, TurboAvailable};

/// Untyped frame: `{"msgType", "data", "gameId"?, "gameTick"?}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFrame {
    pub msg_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub game_tick: Option<u64>,
}

/// A decoded server message.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    Join,
    YourCar(CarId),
    GameInit(Box<GameInit>),
    GameStart,
    CarPositions(Vec<CarPosition>),
    Crash(CarId),
    Spawn(CarId),
    GameEnd,
    Error(String),
    LapFinished(LapFinished),
    TurboAvailable(TurboAvailable),
    /// Message type this client does not interpret.
    Unknown(String),
}

impl InboundMessage {
    /// Wire name of the message type.
    pub fn msg_type(&self) -> &str {
        match self {
            Self::Join => "join",
            Self::YourCar(_) => "yourCar",
            Self::GameInit(_) => "gameInit",
            Self::GameStart => "gameStart",
            Self::CarPositions(_) => "carPositions",
            Self::Crash(_) => "crash",
            Self::Spawn(_) => "spawn",
            Self::GameEnd => "gameEnd",
            Self::Error(_) => "error",
            Self::LapFinished(_) => "lapFinished",
            Self::TurboAvailable(_) => "turboAvailable",
            Self::Unknown(msg_type) => msg_type,
        }
    }
}

/// A decoded message together with the frame metadata.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub message: InboundMessage,
    pub game_tick: Option<u64>,
}

impl TryFrom<RawFrame> for Inbound {
    type Error = ProtocolError;

    fn try_from(frame: RawFrame) -> Result<Self, Self::Error> {
        let RawFrame {
            msg_type,
            data,
            game_tick,
            ..
        } = frame;

        let message = match msg_type.as_str() {
            "join" => InboundMessage::Join,
            "yourCar" => InboundMessage::YourCar(payload(&msg_type, data)?),
            "gameInit" => InboundMessage::GameInit(Box::new(payload(&msg_type, data)?)),
            "gameStart" => InboundMessage::GameStart,
            "carPositions" => InboundMessage::CarPositions(payload(&msg_type, data)?),
            "crash" => InboundMessage::Crash(payload(&msg_type, data)?),
            "spawn" => InboundMessage::Spawn(payload(&msg_type, data)?),
            "gameEnd" => InboundMessage::GameEnd,
            "error" => InboundMessage::Error(match data {
                Value::String(text) => text,
                other => other.to_string(),
            }),
            "lapFinished" => InboundMessage::LapFinished(payload(&msg_type, data)?),
            "turboAvailable" => InboundMessage::TurboAvailable(payload(&msg_type, data)?),
            _ => InboundMessage::Unknown(msg_type),
        };

        Ok(Self { message, game_tick })
    }
}

fn payload<T: DeserializeOwned>(msg_type: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::Payload {
        msg_type: msg_type.to_string(),
        source,
    })
}

/// Decodes one line of the stream (without its trailing newline).
pub fn decode_line(line: &str) -> Result<Inbound, ProtocolError> {
    let frame: RawFrame = serde_json::from_str(line.trim())?;
    Inbound::try_from(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_decode_game_start_with_null_data() -> TestResult {
        let inbound = decode_line(r#"{"msgType":"gameStart","data":null,"gameTick":0}"#)?;
        assert!(matches!(inbound.message, InboundMessage::GameStart));
        assert_eq!(inbound.game_tick, Some(0));
        Ok(())
    }

    #[test]
    fn test_decode_unknown_type_keeps_name() -> TestResult {
        let inbound = decode_line(r#"{"msgType":"turboStart","data":{"name":"x","color":"y"}}"#)?;
        assert_eq!(inbound.message.msg_type(), "turboStart");
        assert!(matches!(inbound.message, InboundMessage::Unknown(_)));
        Ok(())
    }

    #[test]
    fn test_decode_error_non_string_payload() -> TestResult {
        let inbound = decode_line(r#"{"msgType":"error","data":{"reason":"bad"}}"#)?;
        match inbound.message {
            InboundMessage::Error(text) => assert!(text.contains("bad")),
            other => return Err(format!("unexpected message {other:?}").into()),
        }
        Ok(())
    }

    #[test]
    fn test_payload_error_names_type() -> TestResult {
        let err = decode_line(r#"{"msgType":"crash","data":42}"#)
            .err()
            .ok_or("expected payload error")?;
        assert_eq!(err.msg_type(), Some("crash"));
        Ok(())
    }

    #[test]
    fn test_frame_without_msg_type_is_rejected() {
        assert!(decode_line(r#"{"data":{}}"#).is_err());
    }
}
