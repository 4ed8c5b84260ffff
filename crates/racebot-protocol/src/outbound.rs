//! Outbound commands.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Credentials identifying the bot to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotId {
    pub name: String,
    pub key: String,
}

/// Payload of `joinRace`, used to pick a specific track or car count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRace {
    pub bot_id: BotId,
    pub track_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub car_count: u32,
}

/// Side to move towards at the next switch piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneDirection {
    Left,
    Right,
}

/// Empty object payload, serialized as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Empty {}

/// A command the bot sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "msgType", content = "data", rename_all = "camelCase")]
pub enum Command {
    Join(BotId),
    JoinRace(JoinRace),
    /// Throttle level in `[0.0, 1.0]`.
    Throttle(f64),
    SwitchLane(LaneDirection),
    /// Activates a held turbo. The payload is free text shown by the server.
    Turbo(String),
    /// Keep-alive.
    Ping(Empty),
}

impl Command {
    /// Keep-alive command.
    pub fn ping() -> Self {
        Self::Ping(Empty {})
    }

    /// Throttle command with the level clamped to `[0.0, 1.0]`.
    ///
    /// Non-finite levels collapse to `0.0`.
    pub fn throttle(level: f64) -> Self {
        if level.is_finite() {
            Self::Throttle(level.clamp(0.0, 1.0))
        } else {
            Self::Throttle(0.0)
        }
    }

    /// Wire name of the command.
    pub fn msg_type(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::JoinRace(_) => "joinRace",
            Self::Throttle(_) => "throttle",
            Self::SwitchLane(_) => "switchLane",
            Self::Turbo(_) => "turbo",
            Self::Ping(_) => "ping",
        }
    }
}

/// Encodes a command as one newline-terminated line.
pub fn encode_line(command: &Command) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(command)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_ping_has_empty_object_payload() -> TestResult {
        let value = serde_json::to_value(Command::ping())?;
        assert_eq!(value, json!({"msgType": "ping", "data": {}}));
        Ok(())
    }

    #[test]
    fn test_switch_lane_payload() -> TestResult {
        let value = serde_json::to_value(Command::SwitchLane(LaneDirection::Left))?;
        assert_eq!(value, json!({"msgType": "switchLane", "data": "Left"}));
        Ok(())
    }

    #[test]
    fn test_join_race_omits_missing_password() -> TestResult {
        let command = Command::JoinRace(JoinRace {
            bot_id: BotId {
                name: "bot".to_string(),
                key: "secret".to_string(),
            },
            track_name: "keimola".to_string(),
            password: None,
            car_count: 1,
        });
        let value = serde_json::to_value(command)?;
        assert_eq!(
            value,
            json!({
                "msgType": "joinRace",
                "data": {
                    "botId": {"name": "bot", "key": "secret"},
                    "trackName": "keimola",
                    "carCount": 1
                }
            })
        );
        Ok(())
    }

    #[test]
    fn test_throttle_is_clamped() {
        assert_eq!(Command::throttle(1.7), Command::Throttle(1.0));
        assert_eq!(Command::throttle(-0.2), Command::Throttle(0.0));
        assert_eq!(Command::throttle(f64::NAN), Command::Throttle(0.0));
    }

    #[test]
    fn test_encode_line_is_newline_terminated() -> TestResult {
        let line = encode_line(&Command::Turbo("go".to_string()))?;
        assert_eq!(line, "{\"msgType\":\"turbo\",\"data\":\"go\"}\n");
        Ok(())
    }
}
