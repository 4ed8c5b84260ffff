//! Per-tick decision chain.
//!
//! Each `carPositions` tick runs the stages below in order; the first stage
//! that returns a command wins. A stage that fails is logged and skipped, so
//! a bad lookup degrades to the next stage instead of dropping the tick.
//!
//! | # | stage        | fires when                                   |
//! |---|--------------|----------------------------------------------|
//! | 1 | calibration  | traction not calibrated yet                  |
//! | 2 | turbo        | on the activation piece with a turbo held    |
//! | 3 | lane_switch  | a switch decision is due and a side wins     |
//! | 4 | stalled      | the car is standing still                    |
//! | 5 | cornering    | braking needed, or driving on a straight     |
//! | 6 | drift        | mid-corner with traction known               |
//!
//! When nothing fires the tick is answered with a keep-alive `ping`.

use racebot_protocol::Command;
use tracing::warn;

use crate::adaptive::LearningState;
use crate::calibration::calibration_stage;
use crate::config::EngineConfig;
use crate::cornering::{cornering_stage, drift_fallback_stage};
use crate::error::EngineResult;
use crate::kinematics::{KinematicSample, Position};
use crate::switching::{LaneSwitchPlanner, lane_switch_stage};
use crate::track::Track;
use crate::turbo::{TurboPlanner, turbo_stage};

/// Read-only inputs of one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub config: &'a EngineConfig,
    pub track: &'a Track,
    pub position: &'a Position,
    pub sample: &'a KinematicSample,
    pub learning: &'a LearningState,
}

/// Planner state the stages may update.
#[derive(Debug, Default)]
pub struct Planners {
    pub switch: LaneSwitchPlanner,
    pub turbo: TurboPlanner,
}

impl Planners {
    pub fn new(track: &Track) -> Self {
        Self {
            switch: LaneSwitchPlanner::new(),
            turbo: TurboPlanner::new(track),
        }
    }
}

pub type Stage = fn(&TickContext<'_>, &mut Planners) -> EngineResult<Option<Command>>;

/// Stage names and functions in priority order.
pub const DECISION_CHAIN: &[(&str, Stage)] = &[
    ("calibration", calibration_stage),
    ("turbo", turbo_stage),
    ("lane_switch", lane_switch_stage),
    ("stalled", stalled_stage),
    ("cornering", cornering_stage),
    ("drift", drift_fallback_stage),
];

/// Name reported when no stage fired.
pub const KEEP_ALIVE: &str = "keep_alive";

/// The command chosen for a tick and the stage that chose it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub command: Command,
    pub stage: &'static str,
}

/// A car that is not moving gets full throttle.
pub fn stalled_stage(ctx: &TickContext<'_>, _planners: &mut Planners) -> EngineResult<Option<Command>> {
    if ctx.sample.v.abs() <= f64::EPSILON {
        Ok(Some(Command::throttle(1.0)))
    } else {
        Ok(None)
    }
}

/// Runs the chain and always produces exactly one command.
pub fn decide(ctx: &TickContext<'_>, planners: &mut Planners) -> Decision {
    for &(stage, run) in DECISION_CHAIN {
        match run(ctx, planners) {
            Ok(Some(command)) => return Decision { command, stage },
            Ok(None) => {}
            Err(error) => {
                warn!(stage, %error, piece = ctx.position.piece_index, "Decision stage failed, skipping");
            }
        }
    }
    Decision {
        command: Command::ping(),
        stage: KEEP_ALIVE,
    }
}
