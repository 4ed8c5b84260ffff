//! Payload types carried by inbound messages.
//!
//! Field names follow the server's camelCase JSON; unknown fields are ignored
//! so newer server versions keep decoding.

use serde::{Deserialize, Serialize};

/// Identity of a car on the grid. The colour is unique per race.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarId {
    pub name: String,
    pub color: String,
}

/// Payload of `gameInit`.
#[derive(Debug, Clone, Deserialize)]
pub struct GameInit {
    pub race: RaceData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceData {
    pub track: TrackData,
    #[serde(default)]
    pub cars: Vec<CarData>,
    #[serde(default)]
    pub race_session: RaceSession,
}

/// Raw track geometry as transmitted by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub pieces: Vec<PieceData>,
    pub lanes: Vec<LaneData>,
}

/// One track piece. Straights carry `length`; turns carry `radius` and `angle`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PieceData {
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default)]
    pub switch: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneData {
    pub index: usize,
    pub distance_from_center: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarData {
    pub id: CarId,
    pub dimensions: CarDimensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDimensions {
    pub length: f64,
    pub width: f64,
    pub guide_flag_position: f64,
}

/// Race or qualifying session parameters. Qualifying sessions carry
/// `durationMs` instead of a lap count.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceSession {
    #[serde(default)]
    pub laps: Option<u32>,
    #[serde(default)]
    pub max_lap_time_ms: Option<u64>,
    #[serde(default)]
    pub quick_race: Option<bool>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// One entry of a `carPositions` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPosition {
    pub id: CarId,
    pub angle: f64,
    pub piece_position: PiecePosition,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiecePosition {
    pub piece_index: usize,
    pub in_piece_distance: f64,
    pub lane: LanePosition,
    #[serde(default)]
    pub lap: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanePosition {
    pub start_lane_index: usize,
    pub end_lane_index: usize,
}

/// Payload of `lapFinished`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapFinished {
    pub car: CarId,
    pub lap_time: LapTime,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LapTime {
    pub lap: i64,
    #[serde(default)]
    pub ticks: u64,
    #[serde(default)]
    pub millis: u64,
}

/// Payload of `turboAvailable`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurboAvailable {
    #[serde(default)]
    pub turbo_duration_milliseconds: f64,
    #[serde(default)]
    pub turbo_duration_ticks: u64,
    #[serde(default = "default_turbo_factor")]
    pub turbo_factor: f64,
}

fn default_turbo_factor() -> f64 {
    1.0
}
