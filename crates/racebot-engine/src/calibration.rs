//! Traction calibration.
//!
//! The traction constant relating corner radius to the highest safe speed
//! (`v_max = sqrt(traction * radius)`) depends on the track surface and is
//! not transmitted. It is measured once, on the first tick the car drifts
//! inside a turn, from the speed it carried into that tick.

use racebot_protocol::Command;
use tracing::{info, warn};

use crate::cornering::{braking_distance, find_upcoming_turn};
use crate::decision::{Planners, TickContext};
use crate::error::EngineResult;
use crate::kinematics::{KinematicSample, Position};
use crate::track::Track;

/// Scale between calibration throttle and the target entry speed used
/// while uncalibrated.
const CALIBRATION_SPEED_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TractionCalibration {
    constant: Option<f64>,
}

impl TractionCalibration {
    pub fn constant(&self) -> Option<f64> {
        self.constant
    }

    pub fn is_calibrated(&self) -> bool {
        self.constant.is_some()
    }

    /// Measures the traction constant if this tick qualifies.
    ///
    /// Returns the constant on the tick it gets calibrated, `None` otherwise.
    /// Once calibrated, further observations are ignored.
    pub fn observe(
        &mut self,
        track: &Track,
        position: &Position,
        sample: &KinematicSample,
        safety_factor: f64,
    ) -> Option<f64> {
        if self.constant.is_some() || position.angle.abs() <= f64::EPSILON {
            return None;
        }
        let radius = match track.corner_radius(position.piece_index, position.start_lane) {
            Ok(Some(radius)) => radius,
            Ok(None) => return None,
            Err(error) => {
                warn!(%error, "Cannot calibrate traction on this tick");
                return None;
            }
        };
        let velocity = sample.previous_velocity();
        if velocity.is_nan() || velocity <= 0.0 {
            return None;
        }

        let constant = velocity * velocity / radius * safety_factor;
        info!(
            traction = constant,
            velocity,
            radius,
            piece = position.piece_index,
            "Traction calibrated"
        );
        self.constant = Some(constant);
        self.constant
    }
}

/// Owns every tick until traction is calibrated.
///
/// Full throttle through turns to provoke drift; on straights a fixed
/// throttle with a conservative brake point ahead of the next turn.
pub fn calibration_stage(ctx: &TickContext<'_>, planners: &mut Planners) -> EngineResult<Option<Command>> {
    if ctx.learning.traction.is_calibrated() {
        return Ok(None);
    }
    let position = ctx.position;
    let throttle = ctx.config.calibration_throttle;

    let on_turn = ctx
        .track
        .piece(position.piece_index)
        .is_ok_and(|piece| piece.is_turn());
    if on_turn {
        return Ok(Some(Command::throttle(1.0)));
    }

    let upcoming = find_upcoming_turn(
        ctx.track,
        position,
        planners.switch.plan(),
        ctx.config.lookahead_pieces,
    )
    .unwrap_or_else(|error| {
        warn!(%error, "Lookahead failed during calibration");
        None
    });

    if let Some(turn) = upcoming {
        let target = throttle * CALIBRATION_SPEED_SCALE;
        if braking_distance(ctx.sample.v, target, ctx.config.deceleration_rate) >= turn.distance {
            return Ok(Some(Command::throttle(0.0)));
        }
    }
    Ok(Some(Command::throttle(throttle)))
}
