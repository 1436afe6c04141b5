// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Loop consolidation.
//!
//! Flattens a looped clip into one contiguous sample buffer covering the
//! whole occupied region. Widths are measured in ticks, which are
//! proportional to pixels for a fixed clock, so repetition boundaries land
//! on exact sample indices.

use tracing::{debug, warn};

use super::{Clip, ClipAudio, SampleBuffer};
use crate::error::Result;
use crate::position::Span;
use crate::timing::TimelineClock;

/// On-timeline width of each repetition, in order
///
/// Every repetition is one clip repetition wide except the last, which
/// holds whatever remains up to the effective end.
pub fn repetition_spans(clip: &Clip, clock: &TimelineClock) -> Vec<Span> {
    let sig = clock.time_signature();
    let start = clip.start.to_ticks(sig);
    let repetition = clip.end.to_ticks(sig).saturating_sub(start);
    let full = clip.effective_end().to_ticks(sig).saturating_sub(start);
    if repetition == 0 {
        return Vec::new();
    }

    let count = full.div_ceil(repetition);
    (0..count)
        .map(|i| Span::from_ticks(repetition.min(full - repetition * i), sig))
        .collect()
}

/// Render the clip's repetitions into a single audio payload
///
/// Returns `Ok(None)` when the clip has no audio or its audio has not been
/// decoded. Reads before the raw audio start or past its end are silent.
pub fn consolidate(clip: &Clip, clock: &TimelineClock) -> Result<Option<ClipAudio>> {
    let Some(audio) = clip.audio.as_ref() else {
        return Ok(None);
    };
    let Some(source) = audio.samples().filter(|samples| !samples.is_empty()) else {
        return Ok(None);
    };

    let sig = clock.time_signature();
    let audio_width = audio.length_ticks;
    if audio_width == 0 {
        warn!("Clip {} has an empty audio region, not consolidating", clip.id);
        return Ok(None);
    }

    let samples_per_tick = source.len() as f64 / audio_width as f64;
    let to_samples = |ticks: f64| (ticks * samples_per_tick).round() as i64;

    let source_start = to_samples(-audio.offset_ticks as f64);
    let source_len = source.len() as i64;

    let spans = repetition_spans(clip, clock);
    let mut channels = vec![Vec::new(); source.channel_count()];
    let mut elapsed = 0u64;
    for span in &spans {
        let width = span.to_ticks(sig);
        let out_start = to_samples(elapsed as f64);
        let out_end = to_samples((elapsed + width) as f64);
        elapsed += width;

        for (out, input) in channels.iter_mut().zip(&source.channels) {
            out.extend((0..out_end - out_start).map(|j| {
                let index = source_start + j;
                if (0..source_len).contains(&index) {
                    input[index as usize]
                } else {
                    0.0
                }
            }));
        }
    }

    let flattened = SampleBuffer::new(source.sample_rate, channels);
    let new_len = flattened.len();
    debug!(
        "Consolidated clip {}: {} repetitions, {} -> {} samples",
        clip.id,
        spans.len(),
        source.len(),
        new_len
    );

    let full = clip.effective_end().to_ticks(sig).saturating_sub(clip.start.to_ticks(sig));
    let mut consolidated = ClipAudio::from_samples(flattened, 0, full)?;
    consolidated.source_duration_seconds =
        audio.source_duration_seconds * new_len as f64 / source.len() as f64;
    Ok(Some(consolidated))
}

/// Replace a looped clip with an un-looped clip playing the flattened audio
pub fn consolidate_clip(clip: &Clip, clock: &TimelineClock) -> Result<Option<Clip>> {
    let Some(audio) = consolidate(clip, clock)? else {
        return Ok(None);
    };
    let end = clip.effective_end();
    Ok(Some(Clip {
        end,
        loop_end: None,
        end_limit: clip.end_limit.map(|limit| limit.max(end)),
        audio: Some(audio),
        ..clip.clone()
    }))
}
