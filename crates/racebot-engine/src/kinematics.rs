//! Kinematics estimator.
//!
//! Derives velocity, acceleration, drift and drift rates from consecutive
//! position samples of the controlled car. The server only reports where the
//! car is, so speed has to be reconstructed from track distance travelled
//! between ticks.

use racebot_protocol::{CarDimensions, CarPosition};
use tracing::debug;

use crate::track::Track;

/// Position of a car on the track for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lap: i64,
    pub piece_index: usize,
    pub in_piece_distance: f64,
    pub start_lane: usize,
    pub end_lane: usize,
    /// Signed drift angle in degrees.
    pub angle: f64,
}

impl Position {
    /// Whether a lane change is in flight.
    pub fn is_switching(&self) -> bool {
        self.start_lane != self.end_lane
    }
}

impl From<&CarPosition> for Position {
    fn from(car: &CarPosition) -> Self {
        let piece = &car.piece_position;
        Self {
            lap: piece.lap,
            piece_index: piece.piece_index,
            in_piece_distance: piece.in_piece_distance,
            start_lane: piece.lane.start_lane_index,
            end_lane: piece.lane.end_lane_index,
            angle: car.angle,
        }
    }
}

/// Derived motion state for one tick.
///
/// `v` is track distance per tick, `t` the drift angle. `dv`, `dt` and `ddt`
/// are first and second differences against the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicSample {
    pub v: f64,
    pub dv: f64,
    pub t: f64,
    pub dt: f64,
    pub ddt: f64,
}

impl KinematicSample {
    /// Velocity of the tick before this one.
    pub fn previous_velocity(&self) -> f64 {
        self.v - self.dv
    }
}

/// Per-race estimator state.
#[derive(Debug, Default)]
pub struct KinematicsEstimator {
    previous: Option<(Position, KinematicSample)>,
    history: Vec<KinematicSample>,
}

impl KinematicsEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the next position and returns the derived sample.
    ///
    /// The first sample after construction or [`reset`](Self::reset) has only
    /// the drift angle set.
    pub fn update(&mut self, track: &Track, position: Position) -> KinematicSample {
        let sample = match self.previous {
            None => KinematicSample {
                t: position.angle,
                ..KinematicSample::default()
            },
            Some((prev_pos, prev)) => {
                let t = position.angle;
                let dt = t - prev.t;
                let v = if prev_pos.piece_index == position.piece_index {
                    position.in_piece_distance - prev_pos.in_piece_distance
                } else if prev_pos.is_switching() {
                    prev.v
                } else {
                    match track.length(prev_pos.piece_index, prev_pos.start_lane) {
                        Ok(length) => {
                            length - prev_pos.in_piece_distance + position.in_piece_distance
                        }
                        Err(error) => {
                            debug!(%error, "Cannot measure piece crossing, keeping velocity");
                            prev.v
                        }
                    }
                };
                KinematicSample {
                    v,
                    dv: v - prev.v,
                    t,
                    dt,
                    ddt: dt - prev.dt,
                }
            }
        };

        self.previous = Some((position, sample));
        self.history.push(sample);
        sample
    }

    pub fn last(&self) -> Option<&KinematicSample> {
        self.history.last()
    }

    pub fn previous_position(&self) -> Option<&Position> {
        self.previous.as_ref().map(|(position, _)| position)
    }

    /// All samples of the current race, oldest first.
    pub fn history(&self) -> &[KinematicSample] {
        &self.history
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.history.clear();
    }
}

/// Lateral displacement of the car's tail for a drift angle.
///
/// The car pivots around its guide flag, so the tail swings by the distance
/// behind the flag times the sine of the drift.
pub fn tail_swing(dimensions: &CarDimensions, angle: f64) -> f64 {
    (dimensions.length - dimensions.guide_flag_position) * angle.to_radians().sin()
}
