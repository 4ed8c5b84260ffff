//! Turbo planner.
//!
//! A turbo is best spent at the start of the longest run of straights. The
//! activation piece is computed once per race; the trigger fires at most
//! once per availability window granted by the server.

use racebot_protocol::{Command, TurboAvailable};
use tracing::info;

use crate::decision::{Planners, TickContext};
use crate::error::EngineResult;
use crate::track::Track;

/// Free-text payload of the turbo command.
pub const TURBO_MESSAGE: &str = "Full send";

/// Start of the longest run of non-turn pieces that directly follows a turn.
///
/// Ties keep the earliest run. `None` for tracks without turns.
pub fn plan_activation(track: &Track) -> Option<usize> {
    let pieces = track.pieces();
    let count = pieces.len();
    let is_turn = |index: usize| pieces.get(index).is_some_and(|piece| piece.is_turn());

    let mut best: Option<(usize, usize)> = None;
    for index in 0..count {
        let start = track.next_index(index, 1);
        if !is_turn(index) || is_turn(start) {
            continue;
        }
        let run = (0..count)
            .take_while(|&step| !is_turn(track.next_index(start, step)))
            .count();
        if best.is_none_or(|(_, longest)| run > longest) {
            best = Some((start, run));
        }
    }
    best.map(|(start, _)| start)
}

#[derive(Debug, Default)]
pub struct TurboPlanner {
    activation_piece: Option<usize>,
    available: Option<TurboAvailable>,
}

impl TurboPlanner {
    pub fn new(track: &Track) -> Self {
        let activation_piece = plan_activation(track);
        info!(?activation_piece, "Turbo activation planned");
        Self {
            activation_piece,
            available: None,
        }
    }

    pub fn activation_piece(&self) -> Option<usize> {
        self.activation_piece
    }

    pub fn is_available(&self) -> bool {
        self.available.is_some()
    }

    /// Records a turbo granted by the server.
    pub fn grant(&mut self, turbo: TurboAvailable) {
        self.available = Some(turbo);
    }

    /// Drops a held turbo without using it.
    pub fn revoke(&mut self) {
        self.available = None;
    }

    /// Fires the turbo when the car is on the activation piece.
    pub fn try_activate(&mut self, piece: usize) -> Option<Command> {
        if self.activation_piece != Some(piece) {
            return None;
        }
        let turbo = self.available.take()?;
        info!(
            piece,
            factor = turbo.turbo_factor,
            ticks = turbo.turbo_duration_ticks,
            "Turbo activated"
        );
        Some(Command::Turbo(TURBO_MESSAGE.to_string()))
    }
}

pub fn turbo_stage(ctx: &TickContext<'_>, planners: &mut Planners) -> EngineResult<Option<Command>> {
    Ok(planners.turbo.try_activate(ctx.position.piece_index))
}
