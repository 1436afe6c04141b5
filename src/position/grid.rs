// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Snap grid.
//!
//! Snapping works on the absolute offset (ticks, which are proportional to
//! pixels for a fixed clock) rather than per field, because a grid span can
//! mix measures, beats and fractions.

use serde::{Deserialize, Serialize};

use super::pos::{max_measures, timeline_end, Position, Span, TICKS_PER_BEAT};
use crate::timing::{TimeSignature, TimelineClock};

/// Smallest on-screen distance between two grid lines
pub const MIN_GRID_PIXELS: f64 = 8.0;

/// Finest subdivision of a beat offered by the grid
pub const MAX_BEAT_DIVISION: u32 = 128;

/// Rounding direction for snapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapMode {
    /// Nearest grid line; exact halves round up
    #[default]
    Nearest,
    /// Grid line at or before the position
    Floor,
    /// Grid line at or after the position
    Ceil,
}

/// Grid size choices exposed to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapGridSizeOption {
    /// Snapping disabled
    None,
    /// Follow the zoom level
    #[default]
    Auto,
    Measure,
    Beat,
    HalfBeat,
    QuarterBeat,
    EighthBeat,
    SixteenthBeat,
    ThirtySecondBeat,
    SixtyFourthBeat,
    OneTwentyEighthBeat,
}

impl SnapGridSizeOption {
    /// Beat division for the sub-beat options
    fn beat_division(&self) -> Option<u32> {
        match self {
            SnapGridSizeOption::Beat => Some(1),
            SnapGridSizeOption::HalfBeat => Some(2),
            SnapGridSizeOption::QuarterBeat => Some(4),
            SnapGridSizeOption::EighthBeat => Some(8),
            SnapGridSizeOption::SixteenthBeat => Some(16),
            SnapGridSizeOption::ThirtySecondBeat => Some(32),
            SnapGridSizeOption::SixtyFourthBeat => Some(64),
            SnapGridSizeOption::OneTwentyEighthBeat => Some(128),
            _ => None,
        }
    }
}

/// Concrete grid span for an option, or `None` when snapping is off
pub fn grid_span(option: SnapGridSizeOption, clock: &TimelineClock) -> Option<Span> {
    let sig = clock.time_signature();
    match option {
        SnapGridSizeOption::None => None,
        SnapGridSizeOption::Auto => Some(auto_grid_span(clock)),
        SnapGridSizeOption::Measure => Some(Span::from_measures(1)),
        other => other.beat_division().map(|div| beat_division_span(div, sig)),
    }
}

fn beat_division_span(division: u32, sig: TimeSignature) -> Span {
    let ticks = (TICKS_PER_BEAT + division / 2) / division;
    Span::from_ticks(ticks.max(1) as u64, sig)
}

/// Grid span keeping minor grid lines at least `MIN_GRID_PIXELS` apart
///
/// Zoomed far out the span grows in power-of-two measures. Between a beat
/// and a measure it uses the smallest divisor of the measure (in beats) that
/// is wide enough, so lines stay on whole beats for odd meters. Zoomed in it
/// halves the beat down to 1/128.
pub fn auto_grid_span(clock: &TimelineClock) -> Span {
    let sig = clock.time_signature();
    let measure_px = clock.measure_width();

    if measure_px < MIN_GRID_PIXELS {
        let limit = max_measures(sig);
        let mut measures = 1u32;
        while (measures as f64) * measure_px < MIN_GRID_PIXELS && measures < limit {
            measures = measures.saturating_mul(2);
        }
        return Span::from_measures(measures.min(limit));
    }

    let beat_px = clock.beat_width();
    if beat_px < MIN_GRID_PIXELS {
        let beats_per_measure = sig.beats_per_measure;
        let beats = (1..=beats_per_measure)
            .filter(|d| beats_per_measure % d == 0)
            .find(|d| *d as f64 * beat_px >= MIN_GRID_PIXELS)
            .unwrap_or(beats_per_measure);
        return Span::from_beats(beats, sig);
    }

    let mut division = 1u32;
    while division < MAX_BEAT_DIVISION && beat_px / (division * 2) as f64 >= MIN_GRID_PIXELS {
        division *= 2;
    }
    beat_division_span(division, sig)
}

impl Position {
    /// Snap to a multiple of `grid` measured from the timeline start
    ///
    /// A zero-length grid leaves the position unchanged. The result never
    /// passes the timeline end; a grid line beyond it snaps to the end
    /// itself, which may be off the grid.
    pub fn snap(&self, grid: Span, mode: SnapMode, sig: TimeSignature) -> Position {
        let step = grid.to_ticks(sig);
        if step == 0 {
            return *self;
        }

        let ticks = self.to_ticks(sig);
        let below = ticks / step * step;
        let remainder = ticks - below;

        let snapped = match mode {
            SnapMode::Floor => below,
            SnapMode::Ceil if remainder == 0 => below,
            SnapMode::Ceil => below + step,
            SnapMode::Nearest if remainder * 2 >= step => below + step,
            SnapMode::Nearest => below,
        };
        let end = timeline_end(sig).to_ticks(sig);
        Position::from_ticks(snapped.min(end), sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(measure: u32, beat: u32, fraction: u32) -> Position {
        Position::new(measure, beat, fraction, TimeSignature::FOUR_FOUR).unwrap()
    }

    #[test]
    fn test_snap_nearest_tie_rounds_up() {
        let sig = TimeSignature::FOUR_FOUR;
        let beat = Span::from_beats(1, sig);

        assert_eq!(pos(1, 3, 400).snap(beat, SnapMode::Nearest, sig), pos(1, 3, 0));
        assert_eq!(pos(1, 3, 500).snap(beat, SnapMode::Nearest, sig), pos(1, 4, 0));
        assert_eq!(pos(1, 3, 600).snap(beat, SnapMode::Nearest, sig), pos(1, 4, 0));
        assert_eq!(pos(1, 4, 500).snap(beat, SnapMode::Nearest, sig), pos(2, 1, 0));
    }

    #[test]
    fn test_snap_floor_and_ceil() {
        let sig = TimeSignature::FOUR_FOUR;
        let beat = Span::from_beats(1, sig);

        assert_eq!(pos(1, 3, 999).snap(beat, SnapMode::Floor, sig), pos(1, 3, 0));
        assert_eq!(pos(1, 3, 1).snap(beat, SnapMode::Ceil, sig), pos(1, 4, 0));
        assert_eq!(pos(1, 3, 0).snap(beat, SnapMode::Ceil, sig), pos(1, 3, 0));
    }

    #[test]
    fn test_snap_stays_inside_timeline() {
        let sig = TimeSignature::FOUR_FOUR;
        let end = timeline_end(sig);
        let last_beat = Position::from_ticks(end.to_ticks(sig) - 1000, sig);
        let near_end = Position::from_ticks(end.to_ticks(sig) - 1, sig);

        // Seven beats do not divide the timeline evenly
        let seven = Span::from_beats(7, sig);
        assert_eq!(last_beat.snap(seven, SnapMode::Ceil, sig), end);
        assert_eq!(near_end.snap(Span::from_beats(1, sig), SnapMode::Nearest, sig), end);
        assert!(near_end.snap(seven, SnapMode::Floor, sig) < end);
    }

    #[test]
    fn test_snap_mixed_unit_grid() {
        let sig = TimeSignature::FOUR_FOUR;
        // 1 measure + 2 beats = 6 beats per grid step
        let grid = Span::new(1, 2, 0, sig);
        assert_eq!(pos(2, 2, 0).snap(grid, SnapMode::Nearest, sig), pos(2, 3, 0));
        assert_eq!(pos(3, 1, 0).snap(grid, SnapMode::Floor, sig), pos(2, 3, 0));
        assert_eq!(pos(3, 1, 0).snap(grid, SnapMode::Ceil, sig), pos(4, 1, 0));
    }

    #[test]
    fn test_snap_zero_grid_is_identity() {
        let sig = TimeSignature::FOUR_FOUR;
        let p = pos(4, 2, 123);
        assert_eq!(p.snap(Span::ZERO, SnapMode::Nearest, sig), p);
    }

    #[test]
    fn test_fixed_grid_options() {
        let clock = TimelineClock::default();
        assert_eq!(grid_span(SnapGridSizeOption::None, &clock), None);
        assert_eq!(
            grid_span(SnapGridSizeOption::Measure, &clock),
            Some(Span::from_measures(1))
        );
        let quarter = grid_span(SnapGridSizeOption::QuarterBeat, &clock).unwrap();
        assert_eq!(quarter.fraction(), 250);
        let finest = grid_span(SnapGridSizeOption::OneTwentyEighthBeat, &clock).unwrap();
        assert_eq!(finest.fraction(), 8);
    }

    #[test]
    fn test_auto_grid_zoomed_out_grows_in_measures() {
        // 40 px/beat * 0.01 = 0.4 px per beat, 1.6 px per measure
        let clock = TimelineClock::default().with_horizontal_scale(0.01).unwrap();
        let span = auto_grid_span(&clock);
        assert_eq!(span, Span::from_measures(8));
        assert!(span.to_pixels(&clock) >= MIN_GRID_PIXELS);
    }

    #[test]
    fn test_auto_grid_uses_measure_divisors() {
        // 6/4 at 5 px per beat: 2 beats = 10 px is the smallest divisor that fits
        let sig = TimeSignature::new(6, 4).unwrap();
        let clock = TimelineClock::new(120.0, sig, 40.0, 0.125).unwrap();
        assert_eq!(auto_grid_span(&clock), Span::from_beats(2, sig));

        // 5/4 at 3 px per beat: only 5 divides 5, so a whole measure
        let sig = TimeSignature::new(5, 4).unwrap();
        let clock = TimelineClock::new(120.0, sig, 40.0, 0.075).unwrap();
        assert_eq!(auto_grid_span(&clock), Span::from_measures(1));
    }

    #[test]
    fn test_auto_grid_zoomed_in_halves_beat() {
        // 40 px per beat: a quarter beat is 10 px, an eighth would be 5 px
        let clock = TimelineClock::default();
        let span = auto_grid_span(&clock);
        assert_eq!(span.fraction(), 250);
        assert_eq!(span.beats(), 0);

        // Extreme zoom stops at 1/128 beat
        let clock = TimelineClock::default().with_horizontal_scale(1000.0).unwrap();
        assert_eq!(auto_grid_span(&clock).fraction(), 8);
    }

    #[test]
    fn test_auto_grid_whole_beat() {
        // 12 px per beat: half a beat would be 6 px
        let clock = TimelineClock::default().with_horizontal_scale(0.3).unwrap();
        assert_eq!(auto_grid_span(&clock), Span::from_beats(1, TimeSignature::FOUR_FOUR));
    }
}
