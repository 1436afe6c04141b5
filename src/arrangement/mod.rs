// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Arrangement: the clock plus every track.
//!
//! This module provides:
//! - Tracks: non-overlapping clip lists and automation lanes
//! - Id allocation for tracks, clips, lanes and nodes
//! - Clock changes that re-time every track

pub mod track;

pub use track::{ClipEdge, Track, TrackId};

use track::TrackData;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::automation::{LaneId, NodeId};
use crate::clip::{Clip, ClipId};
use crate::error::{Result, TimelineError};
use crate::position::Position;
use crate::timing::TimelineClock;

/// Clock snapshot and tracks of one project
///
/// Loading goes through the same checks as editing: the clock is
/// validated, each track is restored under it, and the id counter is
/// moved past every id already in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArrangementData")]
pub struct Arrangement {
    clock: TimelineClock,
    tracks: Vec<Track>,
    next_id: u64,
}

#[derive(Deserialize)]
struct ArrangementData {
    clock: TimelineClock,
    #[serde(default)]
    tracks: Vec<TrackData>,
    #[serde(default = "first_id")]
    next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl TryFrom<ArrangementData> for Arrangement {
    type Error = TimelineError;

    fn try_from(data: ArrangementData) -> Result<Self> {
        let mut tracks: Vec<Track> = Vec::with_capacity(data.tracks.len());
        for stored in data.tracks {
            let track = stored.restore(&data.clock)?;
            if tracks.iter().any(|t| t.id() == track.id()) {
                return Err(TimelineError::DuplicateTrackId(track.id()));
            }
            tracks.push(track);
        }

        let highest = tracks.iter().map(highest_id).max().unwrap_or(0);
        if data.next_id <= highest {
            warn!("Stored id counter {} is already in use, moving it to {}", data.next_id, highest + 1);
        }
        Ok(Self {
            clock: data.clock,
            tracks,
            next_id: data.next_id.max(highest + 1),
        })
    }
}

fn highest_id(track: &Track) -> u64 {
    let clips = track.clips().iter().map(|c| c.id.0);
    let lanes = track.lanes().iter().flat_map(|lane| {
        std::iter::once(lane.id.0).chain(lane.nodes().iter().map(|n| n.id.0))
    });
    clips.chain(lanes).fold(track.id().0, u64::max)
}

impl Arrangement {
    /// Create an empty arrangement
    pub fn new(clock: TimelineClock) -> Self {
        Self {
            clock,
            tracks: Vec::new(),
            next_id: 1,
        }
    }

    /// Get the current clock
    pub fn clock(&self) -> &TimelineClock {
        &self.clock
    }

    /// Replace the clock, re-timing every track
    ///
    /// Audio clips keep their wall-clock seconds; MIDI and sequencer clips
    /// and automation keep their beats.
    pub fn set_clock(&mut self, clock: TimelineClock) {
        if clock == self.clock {
            return;
        }
        info!(
            "Clock change: {} BPM {} -> {} BPM {}",
            self.clock.tempo(),
            self.clock.time_signature(),
            clock.tempo(),
            clock.time_signature()
        );
        let old = self.clock;
        for track in &mut self.tracks {
            track.retime(&old, &clock);
        }
        self.clock = clock;
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Allocate a fresh clip id
    pub fn next_clip_id(&mut self) -> ClipId {
        ClipId(self.allocate())
    }

    /// Allocate a fresh lane id
    pub fn next_lane_id(&mut self) -> LaneId {
        LaneId(self.allocate())
    }

    /// Allocate a fresh node id
    pub fn next_node_id(&mut self) -> NodeId {
        NodeId(self.allocate())
    }

    /// Add an empty track
    pub fn add_track(&mut self, name: impl Into<String>) -> TrackId {
        let id = TrackId(self.allocate());
        self.tracks.push(Track::new(id, name));
        id
    }

    /// Remove a track, returning it
    pub fn remove_track(&mut self, id: TrackId) -> Result<Track> {
        let index = self
            .tracks
            .iter()
            .position(|t| t.id() == id)
            .ok_or(TimelineError::TrackNotFound(id))?;
        Ok(self.tracks.remove(index))
    }

    /// Get all tracks
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Get track by id
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    /// Get mutable track by id
    pub fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or(TimelineError::TrackNotFound(id))
    }

    /// Place a clip on a track
    pub fn insert_clip(&mut self, track: TrackId, clip: Clip) -> Result<()> {
        let clock = self.clock;
        self.track_mut(track)?.insert_clip(clip, &clock)
    }

    /// Move a clip within its track
    pub fn move_clip(&mut self, track: TrackId, clip: ClipId, new_start: Position) -> Result<()> {
        let clock = self.clock;
        self.track_mut(track)?.move_clip(clip, new_start, &clock)
    }

    /// Split a clip, returning the id of the right part
    pub fn split_clip(&mut self, track: TrackId, clip: ClipId, at: Position) -> Result<ClipId> {
        let clock = self.clock;
        let right_id = self.next_clip_id();
        self.track_mut(track)?.split_clip(clip, at, right_id, &clock)?;
        Ok(right_id)
    }

    /// Duplicate a clip after itself, returning the copy's id
    pub fn duplicate_clip(&mut self, track: TrackId, clip: ClipId) -> Result<ClipId> {
        let clock = self.clock;
        let new_id = self.next_clip_id();
        self.track_mut(track)?.duplicate_clip(clip, new_id, &clock)?;
        Ok(new_id)
    }
}

impl Default for Arrangement {
    fn default() -> Self {
        Self::new(TimelineClock::default())
    }
}
