// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the timeline core.

use thiserror::Error;

use crate::arrangement::TrackId;
use crate::automation::{LaneId, NodeId};
use crate::clip::ClipId;
use crate::position::Position;

/// Failures reported by the timeline core.
///
/// Every variant describes a specific reason; recovery (clamping, ignoring,
/// notifying the user) is left to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    /// Measure/beat/fraction input that cannot be normalized
    #[error("invalid position {measure}.{beat}.{fraction}")]
    InvalidPosition { measure: u32, beat: u32, fraction: u32 },

    /// Arithmetic that would move before 1.1.0
    #[error("position is below the timeline start")]
    BelowTimelineStart,

    /// Arithmetic that would move past the last representable measure
    #[error("position is beyond the last representable measure ({max_measures})")]
    AboveMaxMeasures { max_measures: u32 },

    /// Split requested outside the open interval of the clip
    #[error("split position {at} is not strictly inside clip {clip}")]
    SplitOutOfRange { clip: ClipId, at: Position },

    /// Malformed audio bytes
    #[error("failed to decode audio: {0}")]
    DecodeFailure(String),

    /// Sample data could not be serialized
    #[error("failed to encode audio: {0}")]
    EncodeFailure(String),

    /// A background decode or analysis task did not complete
    #[error("background task failed: {0}")]
    BackgroundTask(String),

    /// Tempo, time signature or scale outside the valid range
    #[error("invalid clock settings: {0}")]
    InvalidClock(String),

    /// Clip fields that break the start/end/loop/limit ordering
    #[error("invalid clip {clip}: {reason}")]
    InvalidClip { clip: ClipId, reason: String },

    /// Automation lane whose minimum exceeds its maximum
    #[error("invalid automation range [{min}, {max}]")]
    InvalidLaneRange { min: f64, max: f64 },

    /// An automation node already sits at this position
    #[error("automation node already exists at {0}")]
    DuplicateNodePosition(Position),

    /// An automation node with this id already exists in the lane
    #[error("duplicate automation node id {0}")]
    DuplicateNodeId(NodeId),

    #[error("clip {0} not found")]
    ClipNotFound(ClipId),

    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    /// Two stored tracks share an id
    #[error("duplicate track id {0}")]
    DuplicateTrackId(TrackId),

    #[error("automation lane {0} not found")]
    LaneNotFound(LaneId),

    #[error("automation node {0} not found")]
    NodeNotFound(NodeId),
}

/// Result alias used throughout the core
pub type Result<T> = std::result::Result<T, TimelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TimelineError::InvalidPosition {
            measure: 0,
            beat: 1,
            fraction: 0,
        };
        assert_eq!(err.to_string(), "invalid position 0.1.0");

        let err = TimelineError::AboveMaxMeasures { max_measures: 1000 };
        assert!(err.to_string().contains("1000"));

        let err = TimelineError::SplitOutOfRange {
            clip: ClipId(7),
            at: Position::START,
        };
        assert_eq!(
            err.to_string(),
            "split position 1.1.000 is not strictly inside clip 7"
        );
    }
}
