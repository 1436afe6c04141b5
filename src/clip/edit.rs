// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clip edits: translation, splitting and trimming.
//!
//! Every function takes a clip by reference and returns new clips.

use super::{Clip, ClipAudio, ClipId};
use crate::error::{Result, TimelineError};
use crate::position::{max_measures, Position};
use crate::timing::{TimeSignature, TimelineClock};

fn shift_by_pixels(pos: Position, delta_px: f64, clock: &TimelineClock) -> Position {
    Position::from_pixel_offset(pos.to_pixel_offset(clock) + delta_px, clock)
}

fn shift_by_ticks(pos: Position, ticks: u64, sig: TimeSignature) -> Position {
    Position::from_ticks(pos.to_ticks(sig) + ticks, sig)
}

/// Move a clip so it starts at `new_start`
///
/// End, loop end and soft limits keep their pixel distance from the clip
/// start; a limit that would land before the timeline start is clamped to
/// it. The audio is placed relative to the clip start, so it moves along
/// unchanged.
pub fn translate_clip(clip: &Clip, new_start: Position, clock: &TimelineClock) -> Clip {
    let delta_px = clock.pixel_width(clip.start, new_start);
    let shift = |pos: Position| shift_by_pixels(pos, delta_px, clock);

    Clip {
        start: new_start,
        end: shift(clip.end),
        start_limit: clip.start_limit.map(shift),
        end_limit: clip.end_limit.map(shift),
        loop_end: clip.loop_end.map(shift),
        ..clip.clone()
    }
}

/// Cut a clip in two at `at`
///
/// The cut must fall strictly inside the occupied region. The left clip
/// keeps the id; the right clip takes `right_id`. When the cut falls in
/// the loop region the left clip loops up to the cut, and the right clip's
/// first repetition is the remainder of the repetition being cut, so its
/// audio and limits move forward by the whole repetitions skipped.
pub fn split_clip(
    clip: &Clip,
    at: Position,
    right_id: ClipId,
    clock: &TimelineClock,
) -> Result<(Clip, Clip)> {
    let effective_end = clip.effective_end();
    if at <= clip.start || at >= effective_end {
        return Err(TimelineError::SplitOutOfRange { clip: clip.id, at });
    }

    let sig = clock.time_signature();
    let start = clip.start.to_ticks(sig);
    let end = clip.end.to_ticks(sig);
    let cut = at.to_ticks(sig);
    let effective = effective_end.to_ticks(sig);
    let repetition = end - start;

    let left = if at <= clip.end {
        Clip {
            end: at,
            loop_end: None,
            ..clip.clone()
        }
    } else {
        Clip {
            loop_end: Some(at),
            ..clip.clone()
        }
    };

    let skipped = (cut - start) / repetition;
    let shift = skipped * repetition;
    let right_end = (start + (skipped + 1) * repetition).min(effective);
    let moved = |pos: Position| shift_by_ticks(pos, shift, sig);

    let right = Clip {
        id: right_id,
        start: at,
        end: Position::from_ticks(right_end, sig),
        loop_end: (effective > right_end).then_some(effective_end),
        start_limit: clip.start_limit.map(moved),
        end_limit: clip.end_limit.map(moved),
        audio: clip.audio.as_ref().map(|audio| ClipAudio {
            offset_ticks: audio.offset_ticks + (start + shift) as i64 - cut as i64,
            ..audio.clone()
        }),
        ..clip.clone()
    };

    Ok((left, right))
}

/// Cut a clip so its occupied region ends no later than `max_pos`
///
/// A clip already inside the bound comes back unchanged. A clip starting
/// at or past the bound cannot be kept at all.
pub fn clamp_to_timeline_end(clip: &Clip, max_pos: Position, clock: &TimelineClock) -> Result<Clip> {
    if clip.effective_end() <= max_pos {
        return Ok(clip.clone());
    }
    if clip.start >= max_pos {
        return Err(TimelineError::AboveMaxMeasures {
            max_measures: max_measures(clock.time_signature()),
        });
    }
    let (left, _) = split_clip(clip, max_pos, clip.id, clock)?;
    Ok(left)
}

/// Shorten the occupied region so it ends at `at`
///
/// Returns `None` when nothing of the clip remains.
pub fn trim_end(clip: &Clip, at: Position) -> Option<Clip> {
    if at <= clip.start {
        return None;
    }
    if at >= clip.effective_end() {
        return Some(clip.clone());
    }
    let trimmed = if at <= clip.end {
        Clip {
            end: at,
            loop_end: None,
            ..clip.clone()
        }
    } else {
        Clip {
            loop_end: Some(at),
            ..clip.clone()
        }
    };
    Some(trimmed)
}

/// Drop everything before `at`, keeping the clip's id
///
/// Returns `None` when nothing of the clip remains.
pub fn trim_start(clip: &Clip, at: Position, clock: &TimelineClock) -> Option<Clip> {
    if at <= clip.start {
        return Some(clip.clone());
    }
    split_clip(clip, at, clip.id, clock)
        .ok()
        .map(|(_, right)| right)
}
