//! Lane switch planner.
//!
//! Before each switch piece the planner counts the turns between that switch
//! and the following one. When one direction dominates, the car moves one
//! lane towards the inside of those turns, where the path is shorter.

use racebot_protocol::{Command, LaneDirection};
use tracing::debug;

use crate::decision::{Planners, TickContext};
use crate::error::{EngineResult, TrackError};
use crate::kinematics::Position;
use crate::track::{Track, TurnDirection};

/// Decision taken for an upcoming switch piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchPlan {
    pub switch_piece: usize,
    /// Lane the car should be in after the switch piece.
    pub chosen_lane: usize,
}

/// Turns counted by direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnCounts {
    pub left: usize,
    pub right: usize,
}

impl TurnCounts {
    /// Side to move towards, or `None` on a tie.
    pub fn preferred(&self) -> Option<LaneDirection> {
        match self.right.cmp(&self.left) {
            std::cmp::Ordering::Greater => Some(LaneDirection::Right),
            std::cmp::Ordering::Less => Some(LaneDirection::Left),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// First switch piece strictly after `from`, wrapping at most one lap.
pub fn next_switch(track: &Track, from: usize) -> Option<usize> {
    (1..=track.piece_count())
        .map(|step| track.next_index(from, step))
        .find(|&index| track.pieces().get(index).is_some_and(|piece| piece.has_switch()))
}

/// Counts turns after `switch_piece` up to the next switch piece or one lap.
pub fn count_turns(track: &Track, switch_piece: usize) -> TurnCounts {
    let mut counts = TurnCounts::default();
    for step in 1..track.piece_count() {
        let Some(piece) = track.pieces().get(track.next_index(switch_piece, step)) else {
            break;
        };
        if piece.has_switch() {
            break;
        }
        match piece.turn().map(|turn| turn.direction()) {
            Some(TurnDirection::Right) => counts.right += 1,
            Some(TurnDirection::Left) => counts.left += 1,
            None => {}
        }
    }
    counts
}

#[derive(Debug, Default)]
pub struct LaneSwitchPlanner {
    plan: Option<SwitchPlan>,
    /// Piece the car was on at the previous tick.
    last_piece: Option<usize>,
}

impl LaneSwitchPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self) -> Option<&SwitchPlan> {
        self.plan.as_ref()
    }

    pub fn reset(&mut self) {
        self.plan = None;
        self.last_piece = None;
    }

    /// Follows the car onto `piece`, dropping the plan once its switch piece is reached.
    ///
    /// Pieces skipped between two ticks count as reached.
    pub fn advance(&mut self, track: &Track, piece: usize) {
        let previous = self.last_piece.replace(piece);
        let (Some(plan), Some(previous)) = (self.plan, previous) else {
            return;
        };
        let count = track.piece_count();
        if previous == piece || count == 0 {
            return;
        }
        let travelled = (piece + count - previous) % count;
        let to_switch = match (plan.switch_piece + count - previous) % count {
            0 => count,
            steps => steps,
        };
        if to_switch <= travelled {
            debug!(switch_piece = plan.switch_piece, piece, "Lane switch plan consumed");
            self.plan = None;
        }
    }

    /// Whether a fresh decision is due on this tick.
    ///
    /// Requires that no plan is pending and that the car is past the middle of its piece.
    pub fn should_evaluate(&self, track: &Track, position: &Position) -> Result<bool, TrackError> {
        if self.plan.is_some() {
            return Ok(false);
        }
        let length = track.length(position.piece_index, position.start_lane)?;
        Ok(position.in_piece_distance > length / 2.0)
    }

    /// Plans the next switch and returns the direction to request, if any.
    ///
    /// While a lane change is in flight the plan starts from the lane being entered.
    pub fn evaluate(
        &mut self,
        track: &Track,
        position: &Position,
    ) -> Result<Option<LaneDirection>, TrackError> {
        self.advance(track, position.piece_index);
        if !self.should_evaluate(track, position)? {
            return Ok(None);
        }
        let Some(switch_piece) = next_switch(track, position.piece_index) else {
            return Ok(None);
        };

        let counts = count_turns(track, switch_piece);
        let lane = position.end_lane;
        let request = counts
            .preferred()
            .and_then(|direction| Some((direction, track.lane_towards(lane, direction)?)));

        debug!(
            switch_piece,
            left = counts.left,
            right = counts.right,
            switching = position.is_switching(),
            ?request,
            "Lane switch evaluated"
        );

        match request {
            Some((direction, chosen_lane)) => {
                self.plan = Some(SwitchPlan {
                    switch_piece,
                    chosen_lane,
                });
                Ok(Some(direction))
            }
            None => {
                self.plan = Some(SwitchPlan {
                    switch_piece,
                    chosen_lane: lane,
                });
                Ok(None)
            }
        }
    }
}

/// Requests a lane change ahead of the next switch piece.
pub fn lane_switch_stage(ctx: &TickContext<'_>, planners: &mut Planners) -> EngineResult<Option<Command>> {
    Ok(planners
        .switch
        .evaluate(ctx.track, ctx.position)?
        .map(Command::SwitchLane))
}

#[cfg(test)]
mod tests {
    use super::*;
    use racebot_protocol::{LaneData, PieceData, TrackData};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn straight(switch: bool) -> PieceData {
        PieceData {
            length: Some(100.0),
            switch,
            ..PieceData::default()
        }
    }

    fn turn(angle: f64) -> PieceData {
        PieceData {
            radius: Some(100.0),
            angle: Some(angle),
            ..PieceData::default()
        }
    }

    fn track_of(pieces: Vec<PieceData>, offsets: &[f64]) -> Result<Track, TrackError> {
        Track::from_data(&TrackData {
            id: "switches".to_string(),
            name: String::new(),
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

    fn at(piece_index: usize, in_piece_distance: f64, lane: usize) -> Position {
        Position {
            lap: 0,
            piece_index,
            in_piece_distance,
            start_lane: lane,
            end_lane: lane,
            angle: 0.0,
        }
    }

    /// Switch at 1, then three right turns and one left before the switch at 6.
    fn right_heavy() -> Result<Track, TrackError> {
        track_of(
            vec![
                straight(false),
                straight(true),
                turn(45.0),
                turn(45.0),
                turn(-45.0),
                turn(45.0),
                straight(true),
                straight(false),
            ],
            &[-10.0, 10.0],
        )
    }

    #[test]
    fn test_counts_turns_between_switches() -> TestResult {
        let track = right_heavy()?;
        assert_eq!(next_switch(&track, 0), Some(1));
        assert_eq!(count_turns(&track, 1), TurnCounts { left: 1, right: 3 });
        assert_eq!(count_turns(&track, 6), TurnCounts::default());
        Ok(())
    }

    #[test]
    fn test_requests_right_when_right_turns_dominate() -> TestResult {
        let track = right_heavy()?;
        let mut planner = LaneSwitchPlanner::new();
        assert_eq!(planner.evaluate(&track, &at(0, 60.0, 0))?, Some(LaneDirection::Right));
        assert_eq!(
            planner.plan(),
            Some(&SwitchPlan {
                switch_piece: 1,
                chosen_lane: 1
            })
        );
        Ok(())
    }

    #[test]
    fn test_no_request_from_rightmost_lane() -> TestResult {
        let track = right_heavy()?;
        let mut planner = LaneSwitchPlanner::new();
        assert_eq!(planner.evaluate(&track, &at(0, 60.0, 1))?, None);
        assert_eq!(planner.plan().map(|plan| plan.chosen_lane), Some(1));
        Ok(())
    }

    #[test]
    fn test_tie_keeps_lane() -> TestResult {
        let track = track_of(
            vec![straight(true), turn(30.0), turn(-30.0), straight(false)],
            &[-10.0, 10.0],
        )?;
        let mut planner = LaneSwitchPlanner::new();
        assert_eq!(planner.evaluate(&track, &at(3, 90.0, 0))?, None);
        Ok(())
    }

    #[test]
    fn test_waits_for_piece_midpoint() -> TestResult {
        let track = right_heavy()?;
        let mut planner = LaneSwitchPlanner::new();
        assert_eq!(planner.evaluate(&track, &at(0, 40.0, 0))?, None);
        assert!(planner.plan().is_none());
        Ok(())
    }

    #[test]
    fn test_pending_plan_suppresses_reevaluation() -> TestResult {
        let track = right_heavy()?;
        let mut planner = LaneSwitchPlanner::new();
        planner.evaluate(&track, &at(0, 60.0, 0))?;
        // Still before the switch piece: nothing new is requested.
        assert_eq!(planner.evaluate(&track, &at(0, 80.0, 0))?, None);
        assert!(!planner.should_evaluate(&track, &at(0, 80.0, 0))?);
        // Reaching the switch piece consumes the plan.
        assert_eq!(planner.evaluate(&track, &at(1, 10.0, 1))?, None);
        assert!(planner.plan().is_none());
        planner.evaluate(&track, &at(1, 60.0, 1))?;
        assert_eq!(planner.plan().map(|plan| plan.switch_piece), Some(6));
        Ok(())
    }

    fn switching_at(piece_index: usize, in_piece_distance: f64, from: usize, to: usize) -> Position {
        Position {
            start_lane: from,
            end_lane: to,
            ..at(piece_index, in_piece_distance, from)
        }
    }

    /// Two right turns after the switch at 1, three left turns after the switch at 4.
    fn alternating() -> Result<Track, TrackError> {
        track_of(
            vec![
                straight(false),
                straight(true),
                turn(45.0),
                turn(45.0),
                straight(true),
                turn(-45.0),
                turn(-45.0),
                turn(-45.0),
                straight(false),
            ],
            &[-10.0, 10.0],
        )
    }

    #[test]
    fn test_next_switch_planned_after_lane_change() -> TestResult {
        let track = alternating()?;
        let mut planner = LaneSwitchPlanner::new();
        let mut requests = Vec::new();
        // Drive pieces 0..=3 at ten units per tick, changing lane 0 -> 1 on piece 1.
        for piece in 0..4 {
            for step in 0..10_u32 {
                let distance = f64::from(step) * 10.0;
                let position = match piece {
                    0 => at(piece, distance, 0),
                    1 => switching_at(piece, distance, 0, 1),
                    _ => at(piece, distance, 1),
                };
                if let Some(direction) = planner.evaluate(&track, &position)? {
                    requests.push((piece, direction));
                }
            }
        }
        assert_eq!(
            requests,
            vec![(0, LaneDirection::Right), (1, LaneDirection::Left)]
        );
        assert_eq!(
            planner.plan(),
            Some(&SwitchPlan {
                switch_piece: 4,
                chosen_lane: 0
            })
        );
        Ok(())
    }

    #[test]
    fn test_short_switch_piece_releases_plan() -> TestResult {
        let short_switch = PieceData {
            length: Some(8.0),
            switch: true,
            ..PieceData::default()
        };
        let pieces = vec![
            straight(false),
            short_switch,
            turn(45.0),
            straight(false),
            straight(true),
            turn(-45.0),
            turn(-45.0),
            straight(false),
        ];
        let track = track_of(pieces, &[-10.0, 10.0])?;

        let mut planner = LaneSwitchPlanner::new();
        assert_eq!(planner.evaluate(&track, &at(0, 95.0, 0))?, Some(LaneDirection::Right));
        // Piece 1 is jumped over entirely between two ticks.
        assert_eq!(planner.evaluate(&track, &at(2, 5.0, 1))?, None);
        assert!(planner.plan().is_none());
        assert_eq!(planner.evaluate(&track, &at(2, 60.0, 1))?, Some(LaneDirection::Left));
        assert_eq!(planner.plan().map(|plan| plan.switch_piece), Some(4));
        Ok(())
    }

    #[test]
    fn test_single_switch_plan_expires_each_lap() -> TestResult {
        let track = track_of(
            vec![straight(true), turn(45.0), turn(45.0), straight(false)],
            &[-10.0, 10.0],
        )?;
        let mut planner = LaneSwitchPlanner::new();
        assert_eq!(planner.evaluate(&track, &at(0, 60.0, 0))?, Some(LaneDirection::Right));
        for piece in 1..4 {
            planner.evaluate(&track, &at(piece, 60.0, 1))?;
            assert_eq!(planner.plan().map(|plan| plan.switch_piece), Some(0));
        }
        planner.evaluate(&track, &at(0, 10.0, 1))?;
        assert!(planner.plan().is_none());
        Ok(())
    }

    #[test]
    fn test_track_without_switches() -> TestResult {
        let track = track_of(vec![straight(false), turn(45.0)], &[-10.0, 10.0])?;
        let mut planner = LaneSwitchPlanner::new();
        assert_eq!(planner.evaluate(&track, &at(0, 90.0, 0))?, None);
        assert!(planner.plan().is_none());
        Ok(())
    }
}
