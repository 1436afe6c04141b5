// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Conversions between musical positions, pixels and seconds.

use super::pos::{Position, Span, TICKS_PER_BEAT};
use crate::timing::TimelineClock;

impl Position {
    /// Horizontal pixel offset from the timeline start
    pub fn to_pixel_offset(&self, clock: &TimelineClock) -> f64 {
        ticks_to_pixels(self.to_ticks(clock.time_signature()), clock)
    }

    /// Position at a pixel offset (negative offsets clamp to the start)
    pub fn from_pixel_offset(px: f64, clock: &TimelineClock) -> Position {
        Position::from_ticks(pixels_to_ticks(px, clock), clock.time_signature())
    }

    /// Wall-clock time from the timeline start in seconds
    pub fn to_seconds(&self, clock: &TimelineClock) -> f64 {
        Span::from_ticks(self.to_ticks(clock.time_signature()), clock.time_signature())
            .to_seconds(clock)
    }

    /// Position reached after `seconds` of playback from the start
    pub fn from_seconds(seconds: f64, clock: &TimelineClock) -> Position {
        let span = Span::from_seconds(seconds, clock);
        Position::from_ticks(span.to_ticks(clock.time_signature()), clock.time_signature())
    }
}

impl Span {
    /// Duration of the span in seconds
    pub fn to_seconds(&self, clock: &TimelineClock) -> f64 {
        self.to_beats(clock.time_signature()) * clock.seconds_per_beat()
    }

    /// Span covering `seconds` of playback
    pub fn from_seconds(seconds: f64, clock: &TimelineClock) -> Span {
        let beats = seconds.max(0.0) / clock.seconds_per_beat();
        let ticks = (beats * TICKS_PER_BEAT as f64).round() as u64;
        Span::from_ticks(ticks, clock.time_signature())
    }

    /// Width of the span in pixels
    pub fn to_pixels(&self, clock: &TimelineClock) -> f64 {
        ticks_to_pixels(self.to_ticks(clock.time_signature()), clock)
    }
}

impl TimelineClock {
    /// Signed pixel distance from `from` to `to`
    pub fn pixel_width(&self, from: Position, to: Position) -> f64 {
        to.to_pixel_offset(self) - from.to_pixel_offset(self)
    }
}

pub(crate) fn ticks_to_pixels(ticks: u64, clock: &TimelineClock) -> f64 {
    ticks as f64 / TICKS_PER_BEAT as f64 * clock.beat_width()
}

pub(crate) fn pixels_to_ticks(px: f64, clock: &TimelineClock) -> u64 {
    if !px.is_finite() || px <= 0.0 {
        return 0;
    }
    (px / clock.beat_width() * TICKS_PER_BEAT as f64).round() as u64
}
