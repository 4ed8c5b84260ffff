//! Adaptive corner model.
//!
//! Learns a speed multiplier per piece from sparse feedback: crashes shrink
//! the modifiers of the pieces leading into the crash, clean laps grow the
//! modifiers of turns that were driven with little drift.

use tracing::{debug, info};

use crate::calibration::TractionCalibration;
use crate::config::EngineConfig;
use crate::track::Track;

/// Per-piece speed modifiers, all starting at `1.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptiveCornerModel {
    modifiers: Vec<f64>,
}

impl AdaptiveCornerModel {
    pub fn new(piece_count: usize) -> Self {
        Self {
            modifiers: vec![1.0; piece_count],
        }
    }

    /// Modifier of `piece`; `1.0` for pieces the model does not know.
    pub fn modifier(&self, piece: usize) -> f64 {
        self.modifiers.get(piece).copied().unwrap_or(1.0)
    }

    pub fn modifiers(&self) -> &[f64] {
        &self.modifiers
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Penalises the crash piece and its predecessors.
    pub fn on_crash(&mut self, piece: usize, config: &EngineConfig) {
        let count = self.modifiers.len();
        if count == 0 {
            return;
        }
        for back in 0..config.crash_penalty_span.min(count) {
            let index = (piece % count + count - back) % count;
            if let Some(modifier) = self.modifiers.get_mut(index) {
                *modifier *= config.crash_penalty;
                debug!(piece = index, modifier = *modifier, "Crash penalty applied");
            }
        }
    }

    /// Reviews every turn after a completed lap and grows modifiers where
    /// the observed drift left headroom. Returns the number of turns adjusted.
    pub fn on_lap_completed(&mut self, track: &Track, config: &EngineConfig) -> usize {
        let limit = config.safe_drift_limit();
        let span = config.lap_review_span.max(1);
        let mut adjusted = 0;

        for (index, piece) in track.pieces().iter().enumerate() {
            if !piece.is_turn() {
                continue;
            }
            let observed = (0..span)
                .filter_map(|ahead| track.piece(track.next_index(index, ahead)).ok())
                .map(|p| p.max_observed_drift())
                .fold(0.0_f64, f64::max);

            let factor = if observed < config.small_drift_threshold {
                config.safe_lap_boost
            } else if observed < limit {
                1.0 - (observed / limit).ln() / config.drift_damping
            } else {
                continue;
            };

            if let Some(modifier) = self.modifiers.get_mut(index) {
                *modifier *= factor;
                adjusted += 1;
                debug!(piece = index, observed, modifier = *modifier, "Corner modifier grown");
            }
        }
        adjusted
    }
}

/// Learning state that outlives a single race on the same track.
#[derive(Debug, Default)]
pub struct LearningState {
    track_id: Option<String>,
    pub traction: TractionCalibration,
    pub corners: AdaptiveCornerModel,
}

impl LearningState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the track the state was learned on.
    pub fn track_id(&self) -> Option<&str> {
        self.track_id.as_deref()
    }

    /// Keeps the learned state when `track` matches the previous one and
    /// starts over otherwise. Returns whether the state was reset.
    pub fn prepare_for(&mut self, track: &Track) -> bool {
        let same = self.track_id.as_deref() == Some(track.id())
            && self.corners.len() == track.piece_count();
        if same {
            return false;
        }
        info!(track = track.id(), "Starting corner model for new track");
        self.track_id = Some(track.id().to_string());
        self.traction = TractionCalibration::default();
        self.corners = AdaptiveCornerModel::new(track.piece_count());
        true
    }
}
