// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tracks: a clip list kept free of overlaps plus automation lanes.
//!
//! Clips are addressed by `ClipId` and replaced whole on every edit. Each
//! structural edit ends with overlap resolution, with the edited clip
//! winning any conflict.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::automation::{AutomationLane, LaneId};
use crate::clip::{
    clamp_to_timeline_end, consolidate_clip, resolve_overlaps, split_clip, translate_clip, Clip,
    ClipId, ClipKind,
};
use crate::error::{Result, TimelineError};
use crate::position::{timeline_end, Position};
use crate::timing::{retime_position, retime_ticks, Pin, TimelineClock};

/// Handle identifying a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clip boundary targeted by a resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipEdge {
    /// Left edge; the audio stays where it is on the timeline
    Start,
    /// End of the first repetition
    End,
    /// End of the loop region; at or before `end` removes the loop
    LoopEnd,
}

/// A track in the arrangement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    id: TrackId,
    name: String,
    /// Sorted by start, never overlapping
    clips: Vec<Clip>,
    lanes: Vec<AutomationLane>,
    pub muted: bool,
}

impl Track {
    /// Create an empty track
    pub fn new(id: TrackId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            clips: Vec::new(),
            lanes: Vec::new(),
            muted: false,
        }
    }

    /// Get track id
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Get track name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set track name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Get all clips, sorted by start
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Get clip by id
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    fn index_of(&self, id: ClipId) -> Result<usize> {
        self.clips
            .iter()
            .position(|c| c.id == id)
            .ok_or(TimelineError::ClipNotFound(id))
    }

    /// Replace a clip and re-establish the overlap invariant around it
    fn commit(&mut self, index: usize, clip: Clip, clock: &TimelineClock) -> Result<()> {
        clip.validate()?;
        let clip = clamp_to_timeline_end(&clip, timeline_end(clock.time_signature()), clock)?;
        let id = clip.id;
        self.clips[index] = clip;
        self.clips = resolve_overlaps(&self.clips, Some(id), clock);
        Ok(())
    }

    /// Place a new clip, trimming whatever it lands on
    pub fn insert_clip(&mut self, clip: Clip, clock: &TimelineClock) -> Result<()> {
        if self.clip(clip.id).is_some() {
            return Err(TimelineError::InvalidClip {
                clip: clip.id,
                reason: format!("id already used on track {}", self.id),
            });
        }
        clip.validate()?;
        let clip = clamp_to_timeline_end(&clip, timeline_end(clock.time_signature()), clock)?;
        debug!("Inserting clip {} on track {} at {}", clip.id, self.id, clip.start);

        let id = clip.id;
        self.clips.push(clip);
        self.clips = resolve_overlaps(&self.clips, Some(id), clock);
        Ok(())
    }

    /// Move a clip so it starts at `new_start`
    pub fn move_clip(&mut self, id: ClipId, new_start: Position, clock: &TimelineClock) -> Result<()> {
        let index = self.index_of(id)?;
        let moved = translate_clip(&self.clips[index], new_start, clock);
        self.commit(index, moved, clock)
    }

    /// Drag one edge of a clip, honoring its soft limits
    pub fn resize_clip(
        &mut self,
        id: ClipId,
        edge: ClipEdge,
        pos: Position,
        clock: &TimelineClock,
    ) -> Result<()> {
        let index = self.index_of(id)?;
        let mut clip = self.clips[index].clone();

        match edge {
            ClipEdge::Start => {
                let sig = clock.time_signature();
                let start = clip.start_limit.map_or(pos, |limit| pos.max(limit));
                let moved_by = start.to_ticks(sig) as i64 - clip.start.to_ticks(sig) as i64;
                if let Some(ref mut audio) = clip.audio {
                    audio.offset_ticks -= moved_by;
                }
                clip.start = start;
            }
            ClipEdge::End => {
                let end = clip.end_limit.map_or(pos, |limit| pos.min(limit));
                if clip.loop_end.is_some_and(|loop_end| loop_end <= end) {
                    clip.loop_end = None;
                }
                clip.end = end;
            }
            ClipEdge::LoopEnd => {
                clip.loop_end = (pos > clip.end).then_some(pos);
            }
        }

        self.commit(index, clip, clock)
    }

    /// Copy a clip to the position right after its occupied region
    pub fn duplicate_clip(&mut self, id: ClipId, new_id: ClipId, clock: &TimelineClock) -> Result<()> {
        let original = self.clip(id).ok_or(TimelineError::ClipNotFound(id))?;
        let copy = Clip {
            id: new_id,
            ..translate_clip(original, original.effective_end(), clock)
        };
        self.insert_clip(copy, clock)
    }

    /// Cut a clip in two; the right part takes `right_id`
    pub fn split_clip(
        &mut self,
        id: ClipId,
        at: Position,
        right_id: ClipId,
        clock: &TimelineClock,
    ) -> Result<()> {
        if self.clip(right_id).is_some() {
            return Err(TimelineError::InvalidClip {
                clip: right_id,
                reason: format!("id already used on track {}", self.id),
            });
        }
        let index = self.index_of(id)?;
        let (left, right) = split_clip(&self.clips[index], at, right_id, clock)?;
        self.clips[index] = left;
        self.clips.insert(index + 1, right);
        Ok(())
    }

    /// Remove a clip, returning it
    pub fn remove_clip(&mut self, id: ClipId) -> Result<Clip> {
        let index = self.index_of(id)?;
        Ok(self.clips.remove(index))
    }

    /// Flatten a looped audio clip into one buffer
    ///
    /// Decodes the audio first if needed. Returns `false` and leaves the
    /// track untouched when the clip has nothing to consolidate.
    pub fn consolidate_clip(&mut self, id: ClipId, clock: &TimelineClock) -> Result<bool> {
        let index = self.index_of(id)?;
        let mut clip = self.clips[index].clone();
        if let Some(audio) = clip.audio.take() {
            clip.audio = Some(audio.with_decoded()?);
        }

        match consolidate_clip(&clip, clock)? {
            Some(flat) => {
                self.clips[index] = flat;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Get all automation lanes
    pub fn lanes(&self) -> &[AutomationLane] {
        &self.lanes
    }

    /// Get lane by id
    pub fn lane(&self, id: LaneId) -> Option<&AutomationLane> {
        self.lanes.iter().find(|l| l.id == id)
    }

    /// Get mutable lane by id
    pub fn lane_mut(&mut self, id: LaneId) -> Result<&mut AutomationLane> {
        self.lanes
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(TimelineError::LaneNotFound(id))
    }

    /// Add a lane, replacing any lane with the same id
    pub fn add_lane(&mut self, lane: AutomationLane) {
        match self.lanes.iter_mut().find(|l| l.id == lane.id) {
            Some(existing) => *existing = lane,
            None => self.lanes.push(lane),
        }
    }

    /// Remove a lane, returning it
    pub fn remove_lane(&mut self, id: LaneId) -> Result<AutomationLane> {
        let index = self
            .lanes
            .iter()
            .position(|l| l.id == id)
            .ok_or(TimelineError::LaneNotFound(id))?;
        Ok(self.lanes.remove(index))
    }

    /// Re-express every clip and node under a new clock
    ///
    /// Audio clips stay on the same seconds; MIDI and sequencer clips and
    /// automation nodes stay on the same beats. Clips that no longer fit
    /// the timeline are cut or dropped.
    pub(crate) fn retime(&mut self, old: &TimelineClock, new: &TimelineClock) {
        let (old_sig, new_sig) = (old.time_signature(), new.time_signature());
        let end = timeline_end(new_sig);

        let mut clips = Vec::with_capacity(self.clips.len());
        for clip in &self.clips {
            let pin = match clip.kind {
                ClipKind::Audio => Pin::WallClock,
                ClipKind::Midi | ClipKind::Sequencer => Pin::Musical,
            };
            let retimed = retime_clip(clip, old, new, pin);
            match retimed
                .validate()
                .and_then(|_| clamp_to_timeline_end(&retimed, end, new))
            {
                Ok(clip) => clips.push(clip),
                Err(e) => warn!("Dropped clip {} on track {} while retiming: {}", clip.id, self.id, e),
            }
        }
        self.clips = resolve_overlaps(&clips, None, new);

        for lane in &mut self.lanes {
            lane.map_positions(|pos| pos.renormalize(old_sig, new_sig));
        }
    }
}

fn retime_clip(clip: &Clip, old: &TimelineClock, new: &TimelineClock, pin: Pin) -> Clip {
    let retime = |pos: Position| retime_position(pos, old, new, pin);
    let mut retimed = Clip {
        start: retime(clip.start),
        end: retime(clip.end),
        start_limit: clip.start_limit.map(retime),
        end_limit: clip.end_limit.map(retime),
        loop_end: clip.loop_end.map(retime),
        ..clip.clone()
    };
    if let Some(ref mut audio) = retimed.audio {
        let from = clip.start.to_ticks(old.time_signature()) as i64 + audio.offset_ticks;
        let to = from + audio.length_ticks as i64;
        let (from, to) = (retime_ticks(from, old, new, pin), retime_ticks(to, old, new, pin));
        audio.offset_ticks = from - retimed.start.to_ticks(new.time_signature()) as i64;
        audio.length_ticks = (to - from).max(0) as u64;
    }
    retimed
}

/// Stored form of a track, checked and repaired by [`TrackData::restore`]
#[derive(Debug, Deserialize)]
pub(crate) struct TrackData {
    id: TrackId,
    name: String,
    #[serde(default)]
    clips: Vec<Clip>,
    #[serde(default)]
    lanes: Vec<AutomationLane>,
    #[serde(default)]
    muted: bool,
}

impl TrackData {
    /// Rebuild a track under `clock`
    ///
    /// Positions are normalized to the clock's signature and every clip is
    /// validated and cut to the timeline end. Overlapping clips are resolved
    /// the same way as after a bulk edit, so the loaded track never holds
    /// overlaps even if the stored one did.
    pub(crate) fn restore(self, clock: &TimelineClock) -> Result<Track> {
        let sig = clock.time_signature();
        let end = timeline_end(sig);

        let mut clips: Vec<Clip> = Vec::with_capacity(self.clips.len());
        for clip in self.clips {
            if clips.iter().any(|c| c.id == clip.id) {
                return Err(TimelineError::InvalidClip {
                    clip: clip.id,
                    reason: format!("id already used on track {}", self.id),
                });
            }
            let clip = clip.normalize(sig);
            clip.validate()?;
            clips.push(clamp_to_timeline_end(&clip, end, clock)?);
        }

        let mut track = Track::new(self.id, self.name);
        track.muted = self.muted;
        track.clips = resolve_overlaps(&clips, None, clock);
        for mut lane in self.lanes {
            lane.map_positions(|pos| pos.normalize(sig));
            if track.lane(lane.id).is_some() {
                warn!("Track {} stores lane {} twice, keeping the last", track.id, lane.id);
            }
            track.add_lane(lane);
        }
        Ok(track)
    }
}
