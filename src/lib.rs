// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beatline - timeline core for a DAW editor.
//!
//! Converts between musical positions, pixels and seconds under an explicit
//! clock snapshot, and provides the clip, automation and waveform engines
//! built on top of it. All engine operations take values and return new
//! values; nothing is mutated behind the caller's back.

pub mod arrangement;
pub mod automation;
pub mod clip;
pub mod config;
pub mod error;
pub mod position;
pub mod timing;
pub mod waveform;

pub use arrangement::{Arrangement, ClipEdge, Track, TrackId};
pub use automation::{AutomationLane, AutomationNode, Envelope, LaneId, NodeId};
pub use clip::{Clip, ClipAudio, ClipId, ClipKind, SampleBuffer};
pub use error::{Result, TimelineError};
pub use position::{Position, SnapGridSizeOption, SnapMode, Span};
pub use timing::{TimeSignature, TimelineClock};
pub use waveform::{Bucket, LodSet};
