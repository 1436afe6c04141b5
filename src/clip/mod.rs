// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clip engine.
//!
//! Clips are plain values: every edit returns a new clip and leaves the
//! input untouched. This module provides:
//! - The clip model and its ordering invariants
//! - Translation, splitting and clamping
//! - Overlap resolution for a track's clip list
//! - Consolidation of looped audio into one sample buffer

pub mod audio;
pub mod consolidate;
pub mod edit;
pub mod overlap;

pub use audio::{ClipAudio, SampleBuffer, WAV_MIME};
pub use consolidate::{consolidate, consolidate_clip, repetition_spans};
pub use edit::{clamp_to_timeline_end, split_clip, translate_clip, trim_end, trim_start};
pub use overlap::{has_overlaps, resolve_overlaps};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};
use crate::position::Position;
use crate::timing::TimeSignature;

/// Handle identifying a clip within an arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content type of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClipKind {
    /// Recorded or imported audio
    #[default]
    Audio,
    /// MIDI notes
    Midi,
    /// Step sequencer pattern
    Sequencer,
}

/// A region on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    /// First position of the clip
    pub start: Position,
    /// End of the first repetition
    pub end: Position,
    /// Earliest position the start may be trimmed back to
    #[serde(default)]
    pub start_limit: Option<Position>,
    /// Latest position the end may be extended to
    #[serde(default)]
    pub end_limit: Option<Position>,
    /// End of the looped region (repeats start..end)
    #[serde(default)]
    pub loop_end: Option<Position>,
    #[serde(default)]
    pub muted: bool,
    pub kind: ClipKind,
    #[serde(default)]
    pub audio: Option<ClipAudio>,
}

impl Clip {
    /// Create a validated clip without loop, limits or audio
    pub fn new(
        id: ClipId,
        name: impl Into<String>,
        kind: ClipKind,
        start: Position,
        end: Position,
    ) -> Result<Self> {
        let clip = Self {
            id,
            name: name.into(),
            start,
            end,
            start_limit: None,
            end_limit: None,
            loop_end: None,
            muted: false,
            kind,
            audio: None,
        };
        clip.validate()?;
        Ok(clip)
    }

    /// Set the loop end, re-validating the clip
    pub fn with_loop_end(mut self, loop_end: Position) -> Result<Self> {
        self.loop_end = Some(loop_end);
        self.validate()?;
        Ok(self)
    }

    /// Set the soft trim limits, re-validating the clip
    pub fn with_limits(
        mut self,
        start_limit: Option<Position>,
        end_limit: Option<Position>,
    ) -> Result<Self> {
        self.start_limit = start_limit;
        self.end_limit = end_limit;
        self.validate()?;
        Ok(self)
    }

    /// Attach an audio payload
    pub fn with_audio(mut self, audio: ClipAudio) -> Self {
        self.audio = Some(audio);
        self
    }

    /// End of the region the clip occupies, including its loop
    pub fn effective_end(&self) -> Position {
        self.loop_end.unwrap_or(self.end)
    }

    /// Whether the clip repeats past its first repetition
    pub fn is_looped(&self) -> bool {
        self.loop_end.is_some()
    }

    /// Copy with every position carried into range for `sig`
    pub fn normalize(&self, sig: TimeSignature) -> Clip {
        let normalize = |pos: Position| pos.normalize(sig);
        Clip {
            start: normalize(self.start),
            end: normalize(self.end),
            start_limit: self.start_limit.map(normalize),
            end_limit: self.end_limit.map(normalize),
            loop_end: self.loop_end.map(normalize),
            ..self.clone()
        }
    }

    /// Whether the occupied regions of two clips intersect
    pub fn overlaps(&self, other: &Clip) -> bool {
        self.start < other.effective_end() && other.start < self.effective_end()
    }

    /// Check the start/end/loop/limit ordering
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| TimelineError::InvalidClip {
            clip: self.id,
            reason: reason.to_string(),
        };

        if self.start >= self.end {
            return Err(invalid("start must be before end"));
        }
        if let Some(loop_end) = self.loop_end {
            if loop_end <= self.end {
                return Err(invalid("loop end must be after end"));
            }
        }
        if let Some(limit) = self.start_limit {
            if limit > self.start {
                return Err(invalid("start limit must not be after start"));
            }
        }
        if let Some(limit) = self.end_limit {
            if limit < self.end {
                return Err(invalid("end limit must not be before end"));
            }
        }
        if let Some(ref audio) = self.audio {
            if audio.length_ticks == 0 {
                return Err(invalid("audio region must not be empty"));
            }
        }
        Ok(())
    }
}
