//! Decision engine for the racing bot.
//!
//! The engine consumes decoded server messages one at a time and answers each
//! `carPositions` tick with exactly one [`Command`](racebot_protocol::Command).
//!
//! # Layers
//!
//! | module         | role                                                  |
//! |----------------|-------------------------------------------------------|
//! | [`track`]      | lanes, pieces, per-lane lengths and radii             |
//! | [`kinematics`] | velocity and drift reconstructed from positions       |
//! | [`calibration`]| one-shot measurement of the traction constant         |
//! | [`cornering`]  | lookahead, corner-entry speed, braking distance       |
//! | [`switching`]  | lane choice ahead of switch pieces                    |
//! | [`turbo`]      | activation piece and trigger                          |
//! | [`adaptive`]   | per-piece speed modifiers learned from crashes / laps |
//! | [`decision`]   | the ordered stage chain run every tick                |
//! | [`engine`]     | message routing and race lifecycle                    |
//!
//! # Example
//!
//! ```
//! use racebot_engine::{EngineConfig, RaceEngine};
//! use racebot_protocol::{Command, decode_line};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = RaceEngine::new(EngineConfig::default());
//! let start = decode_line(r#"{"msgType":"gameStart","data":null}"#)?;
//! assert_eq!(engine.handle(&start.message), Some(Command::ping()));
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod adaptive;
pub mod calibration;
pub mod config;
pub mod cornering;
pub mod decision;
pub mod engine;
pub mod error;
pub mod kinematics;
pub mod switching;
pub mod track;
pub mod turbo;

pub use adaptive::{AdaptiveCornerModel, LearningState};
pub use calibration::TractionCalibration;
pub use config::{DriftStatsPolicy, EngineConfig};
pub use cornering::{UpcomingTurn, braking_distance, corner_entry_speed, find_upcoming_turn};
pub use decision::{DECISION_CHAIN, Decision, Planners, TickContext, decide};
pub use engine::{RaceEngine, RaceState};
pub use error::{ConfigError, EngineError, EngineResult, TrackError};
pub use kinematics::{KinematicSample, KinematicsEstimator, Position, tail_swing};
pub use switching::{LaneSwitchPlanner, SwitchPlan, TurnCounts};
pub use track::{Lane, Piece, PieceShape, Track, Turn, TurnDirection};
pub use turbo::{TurboPlanner, plan_activation};
