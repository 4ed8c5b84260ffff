//! Track geometry model.
//!
//! A [`Track`] is a circular sequence of [`Piece`]s plus the set of [`Lane`]s.
//! Turn pieces precompute their length and effective radius for every lane
//! at construction, so per-tick lookups are plain indexing.
//!
//! # Sign convention
//!
//! Positive turn angles turn right. Lane offsets grow to the right of the
//! centreline. The effective radius of lane `L` on a turn is
//! `radius - sign(angle) * offset[L]`, so inner lanes get the smaller radius.

use std::f64::consts::PI;

use racebot_protocol::{LaneDirection, PieceData, TrackData};
use tracing::warn;

use crate::error::TrackError;

/// A lane parallel to the track centreline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lane {
    pub index: usize,
    /// Signed distance from the centreline; positive is to the right.
    pub center_offset: f64,
}

/// Direction of a turn piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnDirection {
    Left,
    Right,
}

/// Turn geometry with per-lane values precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    radius: f64,
    angle: f64,
    lane_lengths: Vec<f64>,
    lane_radii: Vec<f64>,
}

impl Turn {
    fn new(radius: f64, angle: f64, lanes: &[Lane]) -> Self {
        let sweep = (PI * angle / 180.0).abs();
        let mut lane_lengths = Vec::with_capacity(lanes.len());
        let mut lane_radii = Vec::with_capacity(lanes.len());

        for lane in lanes {
            let effective = radius - angle.signum() * lane.center_offset;
            lane_lengths.push((sweep * effective).abs());
            if effective > 0.0 {
                lane_radii.push(effective);
            } else {
                warn!(
                    radius,
                    angle,
                    lane = lane.index,
                    "Non-positive effective radius, falling back to nominal radius"
                );
                lane_radii.push(radius);
            }
        }

        Self {
            radius,
            angle,
            lane_lengths,
            lane_radii,
        }
    }

    /// Nominal (centreline) radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Signed sweep angle in degrees.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn direction(&self) -> TurnDirection {
        if self.angle > 0.0 {
            TurnDirection::Right
        } else {
            TurnDirection::Left
        }
    }
}

/// Shape of a piece.
#[derive(Debug, Clone, PartialEq)]
pub enum PieceShape {
    Straight { length: f64 },
    Turn(Turn),
}

/// One segment of the track.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    shape: PieceShape,
    has_switch: bool,
    max_observed_drift: f64,
}

impl Piece {
    fn from_data(index: usize, data: &PieceData, lanes: &[Lane]) -> Result<Self, TrackError> {
        let invalid = |reason: &str| TrackError::InvalidPiece {
            index,
            reason: reason.to_string(),
        };

        let shape = match (data.radius, data.angle, data.length) {
            (Some(radius), Some(angle), _) => {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(invalid("turn radius must be positive"));
                }
                if !angle.is_finite() || angle == 0.0 {
                    return Err(invalid("turn angle must be non-zero"));
                }
                PieceShape::Turn(Turn::new(radius, angle, lanes))
            }
            (_, _, Some(length)) => {
                if !(length.is_finite() && length >= 0.0) {
                    return Err(invalid("straight length must be non-negative"));
                }
                PieceShape::Straight { length }
            }
            _ => return Err(invalid("neither a straight nor a turn")),
        };

        Ok(Self {
            shape,
            has_switch: data.switch,
            max_observed_drift: 0.0,
        })
    }

    pub fn shape(&self) -> &PieceShape {
        &self.shape
    }

    pub fn is_turn(&self) -> bool {
        matches!(self.shape, PieceShape::Turn(_))
    }

    pub fn turn(&self) -> Option<&Turn> {
        match &self.shape {
            PieceShape::Turn(turn) => Some(turn),
            PieceShape::Straight { .. } => None,
        }
    }

    /// Signed turn angle; `0.0` for straights.
    pub fn angle(&self) -> f64 {
        self.turn().map_or(0.0, Turn::angle)
    }

    pub fn has_switch(&self) -> bool {
        self.has_switch
    }

    /// Length of this piece when driven in `lane`.
    pub fn length(&self, lane: usize) -> Option<f64> {
        match &self.shape {
            PieceShape::Straight { length } => Some(*length),
            PieceShape::Turn(turn) => turn.lane_lengths.get(lane).copied(),
        }
    }

    /// Effective radius for `lane`. `None` for straights or unknown lanes.
    pub fn corner_radius(&self, lane: usize) -> Option<f64> {
        self.turn()
            .and_then(|turn| turn.lane_radii.get(lane).copied())
    }

    /// Largest absolute drift angle recorded on this piece.
    pub fn max_observed_drift(&self) -> f64 {
        self.max_observed_drift
    }

    fn record_drift(&mut self, angle: f64) {
        let drift = angle.abs();
        if drift.is_finite() && drift > self.max_observed_drift {
            self.max_observed_drift = drift;
        }
    }
}

/// A circular race track.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    id: String,
    name: String,
    lanes: Vec<Lane>,
    pieces: Vec<Piece>,
}

impl Track {
    /// Builds the track from a `gameInit` payload.
    ///
    /// Lanes are reordered by index; indices must cover `0..lanes.len()`.
    pub fn from_data(data: &TrackData) -> Result<Self, TrackError> {
        if data.pieces.is_empty() {
            return Err(TrackError::NoPieces);
        }
        if data.lanes.is_empty() {
            return Err(TrackError::NoLanes);
        }

        let count = data.lanes.len();
        let mut slots: Vec<Option<Lane>> = vec![None; count];
        for lane in &data.lanes {
            let slot = slots
                .get_mut(lane.index)
                .filter(|slot| slot.is_none())
                .ok_or(TrackError::InvalidLaneIndex {
                    index: lane.index,
                    count,
                })?;
            *slot = Some(Lane {
                index: lane.index,
                center_offset: lane.distance_from_center,
            });
        }
        let lanes: Vec<Lane> = slots.into_iter().flatten().collect();

        let pieces = data
            .pieces
            .iter()
            .enumerate()
            .map(|(index, piece)| Piece::from_data(index, piece, &lanes))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: data.id.clone(),
            name: data.name.clone(),
            lanes,
            pieces,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn piece(&self, index: usize) -> Result<&Piece, TrackError> {
        self.pieces.get(index).ok_or(TrackError::PieceOutOfRange {
            index,
            count: self.pieces.len(),
        })
    }

    pub fn lane(&self, lane: usize) -> Result<&Lane, TrackError> {
        self.lanes.get(lane).ok_or(TrackError::LaneOutOfRange {
            lane,
            count: self.lanes.len(),
        })
    }

    /// Length of `piece` in `lane`.
    pub fn length(&self, piece: usize, lane: usize) -> Result<f64, TrackError> {
        self.lane(lane)?;
        self.piece(piece)?
            .length(lane)
            .ok_or(TrackError::LaneOutOfRange {
                lane,
                count: self.lanes.len(),
            })
    }

    /// Effective corner radius of `piece` in `lane`; `None` for straights.
    pub fn corner_radius(&self, piece: usize, lane: usize) -> Result<Option<f64>, TrackError> {
        self.lane(lane)?;
        Ok(self.piece(piece)?.corner_radius(lane))
    }

    /// Index `steps` pieces after `index`, wrapping around the lap.
    pub fn next_index(&self, index: usize, steps: usize) -> usize {
        index.wrapping_add(steps) % self.pieces.len()
    }

    /// Index `steps` pieces before `index`, wrapping around the lap.
    pub fn prev_index(&self, index: usize, steps: usize) -> usize {
        let count = self.pieces.len();
        (index % count + count - steps % count) % count
    }

    /// Neighbouring lane of `lane` on the given side, ordered by centre offset.
    pub fn lane_towards(&self, lane: usize, direction: LaneDirection) -> Option<usize> {
        let offset = self.lanes.get(lane)?.center_offset;
        let candidates = self.lanes.iter().filter(|other| other.index != lane);
        match direction {
            LaneDirection::Right => candidates
                .filter(|other| other.center_offset > offset)
                .min_by(|a, b| a.center_offset.total_cmp(&b.center_offset)),
            LaneDirection::Left => candidates
                .filter(|other| other.center_offset < offset)
                .max_by(|a, b| a.center_offset.total_cmp(&b.center_offset)),
        }
        .map(|other| other.index)
    }

    /// Updates the running maximum drift of `piece`.
    pub fn record_drift(&mut self, piece: usize, angle: f64) -> Result<(), TrackError> {
        let count = self.pieces.len();
        self.pieces
            .get_mut(piece)
            .ok_or(TrackError::PieceOutOfRange {
                index: piece,
                count,
            })?
            .record_drift(angle);
        Ok(())
    }

    /// Clears all drift statistics.
    pub fn reset_drift(&mut self) {
        for piece in &mut self.pieces {
            piece.max_observed_drift = 0.0;
        }
    }

    /// Copies drift statistics from `previous` when it describes the same track.
    ///
    /// Returns whether anything was copied.
    pub fn inherit_drift(&mut self, previous: &Track) -> bool {
        if previous.id != self.id || previous.pieces.len() != self.pieces.len() {
            return false;
        }
        for (piece, old) in self.pieces.iter_mut().zip(&previous.pieces) {
            piece.max_observed_drift = old.max_observed_drift;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use racebot_protocol::LaneData;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn straight(length: f64) -> PieceData {
        PieceData {
            length: Some(length),
            ..PieceData::default()
        }
    }

    fn turn(radius: f64, angle: f64) -> PieceData {
        PieceData {
            radius: Some(radius),
            angle: Some(angle),
            ..PieceData::default()
        }
    }

    fn track(pieces: Vec<PieceData>, offsets: &[f64]) -> Result<Track, TrackError> {
        Track::from_data(&TrackData {
            id: "test".to_string(),
            name: "Test".to_string(),
            pieces,
            lanes: offsets
                .iter()
                .enumerate()
                .map(|(index, &distance_from_center)| LaneData {
                    index,
                    distance_from_center,
                })
                .collect(),
        })
    }

    #[test]
    fn test_quarter_turn_length_on_centreline() -> TestResult {
        let track = track(vec![turn(100.0, 90.0)], &[0.0])?;
        assert_relative_eq!(track.length(0, 0)?, 157.079_632_679, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_right_turn_inner_lane_is_shorter() -> TestResult {
        let track = track(vec![turn(100.0, 90.0)], &[-10.0, 10.0])?;
        // Left lane is outside on a right turn.
        assert_relative_eq!(track.corner_radius(0, 0)?.ok_or("radius")?, 110.0);
        assert_relative_eq!(track.corner_radius(0, 1)?.ok_or("radius")?, 90.0);
        assert!(track.length(0, 1)? < track.length(0, 0)?);
        Ok(())
    }

    #[test]
    fn test_left_turn_mirrors_lanes() -> TestResult {
        let track = track(vec![turn(100.0, -45.0)], &[-10.0, 10.0])?;
        assert_relative_eq!(track.corner_radius(0, 0)?.ok_or("radius")?, 90.0);
        assert_relative_eq!(track.corner_radius(0, 1)?.ok_or("radius")?, 110.0);
        assert_relative_eq!(track.length(0, 0)?, PI / 4.0 * 90.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_degenerate_radius_falls_back_to_nominal() -> TestResult {
        let track = track(vec![turn(20.0, 90.0)], &[0.0, 30.0])?;
        assert_relative_eq!(track.corner_radius(0, 1)?.ok_or("radius")?, 20.0);
        assert!(track.length(0, 1)? >= 0.0);
        Ok(())
    }

    #[test]
    fn test_straight_is_lane_invariant() -> TestResult {
        let track = track(vec![straight(100.0)], &[-20.0, 0.0, 20.0])?;
        for lane in 0..3 {
            assert_relative_eq!(track.length(0, lane)?, 100.0);
            assert!(track.corner_radius(0, lane)?.is_none());
        }
        Ok(())
    }

    #[test]
    fn test_out_of_range_lookups() -> TestResult {
        let track = track(vec![straight(100.0)], &[0.0])?;
        assert_eq!(
            track.length(3, 0),
            Err(TrackError::PieceOutOfRange { index: 3, count: 1 })
        );
        assert_eq!(
            track.length(0, 2),
            Err(TrackError::LaneOutOfRange { lane: 2, count: 1 })
        );
        Ok(())
    }

    #[test]
    fn test_invalid_pieces_rejected() {
        assert!(matches!(
            track(vec![turn(0.0, 45.0)], &[0.0]),
            Err(TrackError::InvalidPiece { index: 0, .. })
        ));
        assert!(matches!(
            track(vec![straight(10.0), straight(-1.0)], &[0.0]),
            Err(TrackError::InvalidPiece { index: 1, .. })
        ));
        assert!(matches!(
            track(vec![PieceData::default()], &[0.0]),
            Err(TrackError::InvalidPiece { .. })
        ));
        assert_eq!(track(vec![], &[0.0]), Err(TrackError::NoPieces));
        assert_eq!(track(vec![straight(1.0)], &[]), Err(TrackError::NoLanes));
    }

    #[test]
    fn test_duplicate_lane_index_rejected() {
        let result = Track::from_data(&TrackData {
            id: "dup".to_string(),
            name: String::new(),
            pieces: vec![straight(10.0)],
            lanes: vec![
                LaneData {
                    index: 0,
                    distance_from_center: -10.0,
                },
                LaneData {
                    index: 0,
                    distance_from_center: 10.0,
                },
            ],
        });
        assert_eq!(
            result,
            Err(TrackError::InvalidLaneIndex { index: 0, count: 2 })
        );
    }

    #[test]
    fn test_circular_indices() -> TestResult {
        let track = track(vec![straight(1.0); 5], &[0.0])?;
        assert_eq!(track.next_index(4, 1), 0);
        assert_eq!(track.next_index(3, 7), 0);
        assert_eq!(track.prev_index(0, 1), 4);
        assert_eq!(track.prev_index(1, 2), 4);
        assert_eq!(track.prev_index(2, 2), 0);
        Ok(())
    }

    #[test]
    fn test_lane_towards_uses_offsets() -> TestResult {
        let track = track(vec![straight(1.0)], &[10.0, -10.0, 0.0])?;
        assert_eq!(track.lane_towards(2, LaneDirection::Right), Some(0));
        assert_eq!(track.lane_towards(2, LaneDirection::Left), Some(1));
        assert_eq!(track.lane_towards(0, LaneDirection::Right), None);
        assert_eq!(track.lane_towards(1, LaneDirection::Left), None);
        Ok(())
    }

    #[test]
    fn test_drift_statistics() -> TestResult {
        let mut first = track(vec![turn(50.0, 45.0), straight(10.0)], &[0.0])?;
        first.record_drift(0, -12.5)?;
        first.record_drift(0, 4.0)?;
        assert_relative_eq!(first.piece(0)?.max_observed_drift(), 12.5);

        let mut second = track(vec![turn(50.0, 45.0), straight(10.0)], &[0.0])?;
        assert!(second.inherit_drift(&first));
        assert_relative_eq!(second.piece(0)?.max_observed_drift(), 12.5);

        second.reset_drift();
        assert_relative_eq!(second.piece(0)?.max_observed_drift(), 0.0);
        assert!(second.record_drift(9, 1.0).is_err());
        Ok(())
    }
}
