//! Cornering and braking controller.
//!
//! Looks ahead for the next turn, derives the speed at which it can be
//! entered, and brakes once the simulated braking distance reaches the
//! distance left to the turn.
//!
//! # Model
//!
//! - Corner-entry speed: `sqrt(traction * radius) * modifier`
//! - Coasting: speed decays by `deceleration_rate` per tick
//!
//! Both are empirical; the constants come from [`EngineConfig`](crate::EngineConfig).

use racebot_protocol::Command;

use crate::decision::{Planners, TickContext};
use crate::error::{EngineResult, TrackError};
use crate::kinematics::Position;
use crate::switching::SwitchPlan;
use crate::track::Track;

/// Upper bound on simulated coasting ticks.
const MAX_BRAKING_TICKS: usize = 100_000;

/// Distance travelled while coasting from `current` down to `target` speed.
///
/// Returns `0.0` when already at or below the target and `-1.0` when the
/// target is not positive (the speed never needs to be shed).
pub fn braking_distance(current: f64, target: f64, deceleration_rate: f64) -> f64 {
    if target.is_nan() || target <= 0.0 {
        return -1.0;
    }
    if !current.is_finite() || current <= target {
        return 0.0;
    }

    let retain = (1.0 - deceleration_rate).clamp(0.0, 1.0 - f64::EPSILON);
    let mut speed = current;
    let mut distance = 0.0;
    for _ in 0..MAX_BRAKING_TICKS {
        if speed <= target {
            break;
        }
        distance += speed;
        speed *= retain;
    }
    distance
}

/// Highest speed a turn of `radius` can be entered at.
pub fn corner_entry_speed(traction: f64, radius: f64, modifier: f64) -> f64 {
    (traction * radius).max(0.0).sqrt() * modifier
}

/// The next turn within the lookahead window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpcomingTurn {
    pub piece_index: usize,
    /// Lane the car will be in when entering the turn.
    pub lane: usize,
    /// Track distance from the car to the start of the turn.
    pub distance: f64,
}

/// Scans at most `lookahead` pieces past the current one for a turn.
///
/// The current piece is measured in the lane the car is driving now; from a
/// planned switch piece onwards the planned lane is used.
pub fn find_upcoming_turn(
    track: &Track,
    position: &Position,
    plan: Option<&SwitchPlan>,
    lookahead: usize,
) -> Result<Option<UpcomingTurn>, TrackError> {
    let here = track.length(position.piece_index, position.start_lane)?;
    let mut distance = (here - position.in_piece_distance).max(0.0);
    let mut lane = position.end_lane;

    for step in 1..=lookahead.min(track.piece_count()) {
        let index = track.next_index(position.piece_index, step);
        if let Some(plan) = plan.filter(|plan| plan.switch_piece == index) {
            lane = plan.chosen_lane;
        }
        if track.piece(index)?.is_turn() {
            return Ok(Some(UpcomingTurn {
                piece_index: index,
                lane,
                distance,
            }));
        }
        distance += track.length(index, lane)?;
    }
    Ok(None)
}

/// Entry speed of `piece` in `lane`, scaled by its learned modifier.
///
/// `None` when traction is not calibrated yet or the piece is not a turn.
pub fn entry_speed_for(
    ctx: &TickContext<'_>,
    piece: usize,
    lane: usize,
) -> Result<Option<f64>, TrackError> {
    let Some(traction) = ctx.learning.traction.constant() else {
        return Ok(None);
    };
    let Some(radius) = ctx.track.corner_radius(piece, lane)? else {
        return Ok(None);
    };
    Ok(Some(corner_entry_speed(
        traction,
        radius,
        ctx.learning.corners.modifier(piece),
    )))
}

/// Brakes for the next turn, or accelerates on straights.
///
/// Inside a turn with no braking needed the stage yields to the drift fallback.
pub fn cornering_stage(ctx: &TickContext<'_>, planners: &mut Planners) -> EngineResult<Option<Command>> {
    if !ctx.learning.traction.is_calibrated() {
        return Ok(None);
    }
    let position = ctx.position;
    let on_turn = ctx.track.piece(position.piece_index)?.is_turn();

    let upcoming = find_upcoming_turn(
        ctx.track,
        position,
        planners.switch.plan(),
        ctx.config.lookahead_pieces,
    )?;

    if let Some(turn) = upcoming {
        if let Some(target) = entry_speed_for(ctx, turn.piece_index, turn.lane)? {
            let braking = braking_distance(ctx.sample.v, target, ctx.config.deceleration_rate);
            if braking >= turn.distance {
                return Ok(Some(Command::throttle(0.0)));
            }
        }
    }

    if on_turn {
        Ok(None)
    } else {
        Ok(Some(Command::throttle(1.0)))
    }
}

/// Mid-corner cruise control proportional to the current turn's entry speed.
pub fn drift_fallback_stage(ctx: &TickContext<'_>, _planners: &mut Planners) -> EngineResult<Option<Command>> {
    let position = ctx.position;
    let Some(speed) = entry_speed_for(ctx, position.piece_index, position.start_lane)? else {
        return Ok(None);
    };
    Ok(Some(Command::throttle(
        (speed / ctx.config.drift_fallback_divisor).min(1.0),
    )))
}
