//! Engine tuning parameters.
//!
//! Every empirically tuned constant of the controller lives here so it can be
//! overridden from a config file. Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What happens to per-piece drift statistics at lap boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatsPolicy {
    /// Statistics keep a running maximum for as long as the track is unchanged.
    #[default]
    Accumulate,
    /// Statistics are cleared after every lap review.
    ResetEachLap,
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scales the measured traction constant.
    pub traction_safety_factor: f64,
    /// Fraction of speed lost per tick when coasting.
    pub deceleration_rate: f64,
    /// Throttle used on straights before traction is calibrated.
    pub calibration_throttle: f64,
    /// Number of pieces scanned ahead for the next turn.
    pub lookahead_pieces: usize,
    /// Modifier multiplier applied on a crash.
    pub crash_penalty: f64,
    /// Pieces penalised on a crash: the crash piece and its predecessors.
    pub crash_penalty_span: usize,
    /// Pieces reviewed per turn at lap completion: the turn and its successors.
    pub lap_review_span: usize,
    /// Drift (degrees) below which a turn is considered easy.
    pub small_drift_threshold: f64,
    /// Drift (degrees) at which the car is assumed to lose control.
    pub max_drift_angle: f64,
    /// Fraction of `max_drift_angle` still treated as safe.
    pub drift_margin: f64,
    /// Modifier multiplier for easy turns.
    pub safe_lap_boost: f64,
    /// Damping divisor for the logarithmic modifier growth.
    pub drift_damping: f64,
    /// Divisor turning corner-entry speed into a mid-corner throttle.
    pub drift_fallback_divisor: f64,
    pub drift_stats_policy: DriftStatsPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            traction_safety_factor: 0.9,
            deceleration_rate: 0.02,
            calibration_throttle: 0.6,
            lookahead_pieces: 10,
            crash_penalty: 0.9,
            crash_penalty_span: 3,
            lap_review_span: 3,
            small_drift_threshold: 10.0,
            max_drift_angle: 60.0,
            drift_margin: 0.9,
            safe_lap_boost: 1.1,
            drift_damping: 16.0,
            drift_fallback_divisor: 10.0,
            drift_stats_policy: DriftStatsPolicy::Accumulate,
        }
    }
}

fn check(
    field: &'static str,
    value: f64,
    range: &'static str,
    valid: impl Fn(f64) -> bool,
) -> Result<(), ConfigError> {
    if value.is_finite() && valid(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            range,
        })
    }
}

impl EngineConfig {
    /// Checks every parameter against its admissible range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |v: f64| v > 0.0 && v <= 1.0;
        let positive = |v: f64| v > 0.0;

        check("traction_safety_factor", self.traction_safety_factor, "(0, 1]", unit)?;
        check("deceleration_rate", self.deceleration_rate, "(0, 1)", |v| {
            v > 0.0 && v < 1.0
        })?;
        check("calibration_throttle", self.calibration_throttle, "(0, 1]", unit)?;
        check("crash_penalty", self.crash_penalty, "(0, 1]", unit)?;
        check("small_drift_threshold", self.small_drift_threshold, "> 0", positive)?;
        check("max_drift_angle", self.max_drift_angle, "> 0", positive)?;
        check("drift_margin", self.drift_margin, "(0, 1]", unit)?;
        check("safe_lap_boost", self.safe_lap_boost, ">= 1", |v| v >= 1.0)?;
        check("drift_damping", self.drift_damping, "> 0", positive)?;
        check("drift_fallback_divisor", self.drift_fallback_divisor, "> 0", positive)?;

        if self.lookahead_pieces == 0 {
            return Err(ConfigError::EmptyLookahead);
        }
        Ok(())
    }

    /// Drift angle above which a turn gets no further speed-up.
    pub fn safe_drift_limit(&self) -> f64 {
        self.drift_margin * self.max_drift_angle
    }
}
