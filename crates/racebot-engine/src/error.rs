//! Engine error types.

use thiserror::Error;

/// Track construction and lookup errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("Track has no pieces")]
    NoPieces,

    #[error("Track has no lanes")]
    NoLanes,

    #[error("Lane indices must be 0..{count} without gaps, found index {index}")]
    InvalidLaneIndex { index: usize, count: usize },

    #[error("Piece {index} is invalid: {reason}")]
    InvalidPiece { index: usize, reason: String },

    #[error("Piece index {index} out of range (track has {count} pieces)")]
    PieceOutOfRange { index: usize, count: usize },

    #[error("Lane index {lane} out of range (track has {count} lanes)")]
    LaneOutOfRange { lane: usize, count: usize },
}

/// Engine configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} value {value} is out of range {range}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("lookahead_pieces must be at least 1")]
    EmptyLookahead,
}

/// Errors a decision stage can raise. A failing stage is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Track error: {0}")]
    Track(#[from] TrackError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A specialized `Result` type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
