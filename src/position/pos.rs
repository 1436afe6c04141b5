// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Musical positions and spans.
//!
//! A `Position` is measure/beat/fraction with 1-based measures and beats and
//! a per-mille fraction of a beat. Internally all arithmetic goes through
//! ticks (thousandths of a beat counted from 1.1.000), which keeps carries
//! exact and makes normalization a single division.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};
use crate::timing::TimeSignature;

/// Subdivisions of one beat
pub const TICKS_PER_BEAT: u32 = 1000;

/// Timeline length ceiling expressed in quarter notes
pub const MAX_TIMELINE_QUARTERS: u64 = 4000;

/// Last measure that may hold content for the given time signature
pub fn max_measures(sig: TimeSignature) -> u32 {
    let quarters_per_measure_x4 = 4 * sig.beats_per_measure as u64;
    let measures = MAX_TIMELINE_QUARTERS * sig.beat_unit as u64 / quarters_per_measure_x4;
    measures.clamp(1, u32::MAX as u64 - 1) as u32
}

/// First position past the last representable measure
pub fn timeline_end(sig: TimeSignature) -> Position {
    Position {
        measure: max_measures(sig) + 1,
        beat: 1,
        fraction: 0,
    }
}

fn ticks_per_measure(sig: TimeSignature) -> u64 {
    sig.beats_per_measure as u64 * TICKS_PER_BEAT as u64
}

/// Absolute musical position on the timeline
///
/// Loading rejects zero measures or beats and fractions of a whole beat or
/// more. Whether the beat fits the measure depends on the time signature,
/// so loaded positions are passed through [`Position::normalize`] by their
/// owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PositionFields")]
pub struct Position {
    measure: u32,
    beat: u32,
    fraction: u32,
}

#[derive(Deserialize)]
struct PositionFields {
    measure: u32,
    beat: u32,
    fraction: u32,
}

impl TryFrom<PositionFields> for Position {
    type Error = TimelineError;

    fn try_from(fields: PositionFields) -> Result<Self> {
        let PositionFields {
            measure,
            beat,
            fraction,
        } = fields;
        if measure == 0 || beat == 0 || fraction >= TICKS_PER_BEAT {
            return Err(TimelineError::InvalidPosition {
                measure,
                beat,
                fraction,
            });
        }
        Ok(Self {
            measure,
            beat,
            fraction,
        })
    }
}

impl Position {
    /// The timeline start, 1.1.000
    pub const START: Position = Position {
        measure: 1,
        beat: 1,
        fraction: 0,
    };

    /// Create a position, carrying overflowing beats and fractions upward
    ///
    /// Measure and beat are 1-based; zero in either is rejected because it
    /// cannot be carried into a valid position.
    pub fn new(measure: u32, beat: u32, fraction: u32, sig: TimeSignature) -> Result<Self> {
        if measure == 0 || beat == 0 {
            return Err(TimelineError::InvalidPosition {
                measure,
                beat,
                fraction,
            });
        }
        let ticks = (measure as u64 - 1) * ticks_per_measure(sig)
            + (beat as u64 - 1) * TICKS_PER_BEAT as u64
            + fraction as u64;
        Ok(Self::from_ticks(ticks, sig))
    }

    /// Build a position from ticks elapsed since the timeline start
    pub fn from_ticks(ticks: u64, sig: TimeSignature) -> Self {
        let per_measure = ticks_per_measure(sig);
        let measure = ticks / per_measure;
        let in_measure = ticks % per_measure;
        Self {
            measure: (measure + 1).min(u32::MAX as u64) as u32,
            beat: (in_measure / TICKS_PER_BEAT as u64) as u32 + 1,
            fraction: (in_measure % TICKS_PER_BEAT as u64) as u32,
        }
    }

    /// Ticks elapsed since the timeline start
    pub fn to_ticks(&self, sig: TimeSignature) -> u64 {
        (self.measure.max(1) as u64 - 1) * ticks_per_measure(sig)
            + (self.beat.max(1) as u64 - 1) * TICKS_PER_BEAT as u64
            + self.fraction as u64
    }

    /// Get the 1-based measure
    pub fn measure(&self) -> u32 {
        self.measure
    }

    /// Get the 1-based beat within the measure
    pub fn beat(&self) -> u32 {
        self.beat
    }

    /// Get the per-mille fraction of the beat
    pub fn fraction(&self) -> u32 {
        self.fraction
    }

    /// Check whether fields are within range for the time signature
    pub fn is_normalized(&self, sig: TimeSignature) -> bool {
        self.measure >= 1
            && self.beat >= 1
            && self.beat <= sig.beats_per_measure
            && self.fraction < TICKS_PER_BEAT
    }

    /// Carry a beat that overflows the measure into the following measures
    pub fn normalize(&self, sig: TimeSignature) -> Self {
        Self::from_ticks(self.to_ticks(sig), sig)
    }

    /// Re-express this position under another time signature, keeping the
    /// number of beats elapsed since the timeline start
    pub fn renormalize(&self, from: TimeSignature, to: TimeSignature) -> Self {
        Self::from_ticks(self.to_ticks(from), to)
    }

    /// Lexicographic comparison on (measure, beat, fraction)
    pub fn compare(&self, other: &Position) -> Ordering {
        self.cmp(other)
    }

    /// Move forward by a span
    pub fn add(&self, span: Span, sig: TimeSignature) -> Result<Self> {
        let ticks = self.to_ticks(sig) + span.to_ticks(sig);
        if ticks > timeline_end(sig).to_ticks(sig) {
            return Err(TimelineError::AboveMaxMeasures {
                max_measures: max_measures(sig),
            });
        }
        Ok(Self::from_ticks(ticks, sig))
    }

    /// Move backward by a span
    pub fn subtract(&self, span: Span, sig: TimeSignature) -> Result<Self> {
        self.to_ticks(sig)
            .checked_sub(span.to_ticks(sig))
            .map(|ticks| Self::from_ticks(ticks, sig))
            .ok_or(TimelineError::BelowTimelineStart)
    }

    /// Move backward by a span, stopping at the timeline start
    pub fn saturating_subtract(&self, span: Span, sig: TimeSignature) -> Self {
        self.subtract(span, sig).unwrap_or(Position::START)
    }

    /// Unsigned distance between two positions; use `compare` for direction
    pub fn diff(&self, other: &Position, sig: TimeSignature) -> Span {
        let a = self.to_ticks(sig);
        let b = other.to_ticks(sig);
        Span::from_ticks(a.abs_diff(b), sig)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.measure, self.beat, self.fraction).cmp(&(other.measure, other.beat, other.fraction))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{:03}", self.measure, self.beat, self.fraction)
    }
}

/// Relative musical distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    measures: u32,
    beats: u32,
    fraction: u32,
}

impl Span {
    /// Zero-length span
    pub const ZERO: Span = Span {
        measures: 0,
        beats: 0,
        fraction: 0,
    };

    /// Create a span, carrying overflowing beats and fractions upward
    pub fn new(measures: u32, beats: u32, fraction: u32, sig: TimeSignature) -> Self {
        let ticks = measures as u64 * ticks_per_measure(sig)
            + beats as u64 * TICKS_PER_BEAT as u64
            + fraction as u64;
        Self::from_ticks(ticks, sig)
    }

    /// Span of whole measures
    pub fn from_measures(measures: u32) -> Self {
        Self {
            measures,
            beats: 0,
            fraction: 0,
        }
    }

    /// Span of whole beats
    pub fn from_beats(beats: u32, sig: TimeSignature) -> Self {
        Self::new(0, beats, 0, sig)
    }

    /// Build a span from a tick count
    pub fn from_ticks(ticks: u64, sig: TimeSignature) -> Self {
        let per_measure = ticks_per_measure(sig);
        let in_measure = ticks % per_measure;
        Self {
            measures: (ticks / per_measure).min(u32::MAX as u64) as u32,
            beats: (in_measure / TICKS_PER_BEAT as u64) as u32,
            fraction: (in_measure % TICKS_PER_BEAT as u64) as u32,
        }
    }

    /// Length of the span in ticks
    pub fn to_ticks(&self, sig: TimeSignature) -> u64 {
        self.measures as u64 * ticks_per_measure(sig)
            + self.beats as u64 * TICKS_PER_BEAT as u64
            + self.fraction as u64
    }

    /// Length of the span in (possibly fractional) beats
    pub fn to_beats(&self, sig: TimeSignature) -> f64 {
        self.to_ticks(sig) as f64 / TICKS_PER_BEAT as f64
    }

    pub fn measures(&self) -> u32 {
        self.measures
    }

    pub fn beats(&self) -> u32 {
        self.beats
    }

    pub fn fraction(&self) -> u32 {
        self.fraction
    }

    pub fn is_zero(&self) -> bool {
        self.measures == 0 && self.beats == 0 && self.fraction == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m {}b {:03}", self.measures, self.beats, self.fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_four() -> TimeSignature {
        TimeSignature::FOUR_FOUR
    }

    #[test]
    fn test_position_carries() {
        let sig = four_four();
        let pos = Position::new(1, 4, 1500, sig).unwrap();
        assert_eq!((pos.measure(), pos.beat(), pos.fraction()), (2, 1, 500));

        let pos = Position::new(3, 9, 0, sig).unwrap();
        assert_eq!((pos.measure(), pos.beat(), pos.fraction()), (5, 1, 0));
        assert!(pos.is_normalized(sig));
    }

    #[test]
    fn test_position_rejects_zero_fields() {
        let sig = four_four();
        assert!(matches!(
            Position::new(0, 1, 0, sig),
            Err(TimelineError::InvalidPosition { .. })
        ));
        assert!(Position::new(1, 0, 0, sig).is_err());
    }

    #[test]
    fn test_loaded_position_checks_fields() {
        let sig = four_four();
        let pos: Position = serde_yaml::from_str("measure: 3\nbeat: 2\nfraction: 250\n").unwrap();
        assert_eq!(pos, Position::new(3, 2, 250, sig).unwrap());

        assert!(serde_yaml::from_str::<Position>("measure: 0\nbeat: 1\nfraction: 0\n").is_err());
        assert!(serde_yaml::from_str::<Position>("measure: 1\nbeat: 1\nfraction: 1000\n").is_err());

        // A beat past the measure survives loading until normalized
        let overflowing: Position =
            serde_yaml::from_str("measure: 1\nbeat: 9\nfraction: 0\n").unwrap();
        assert!(!overflowing.is_normalized(sig));
        let normalized = overflowing.normalize(sig);
        assert_eq!(normalized, Position::new(3, 1, 0, sig).unwrap());
        assert!(normalized > Position::new(2, 1, 0, sig).unwrap());
    }

    #[test]
    fn test_ticks_round_trip() {
        let sig = TimeSignature::new(3, 4).unwrap();
        let pos = Position::new(2, 3, 250, sig).unwrap();
        assert_eq!(pos.to_ticks(sig), 3000 + 2000 + 250);
        assert_eq!(Position::from_ticks(pos.to_ticks(sig), sig), pos);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let sig = four_four();
        let a = Position::new(1, 4, 999, sig).unwrap();
        let b = Position::new(2, 1, 0, sig).unwrap();
        let c = Position::new(2, 1, 1, sig).unwrap();
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(c.compare(&b), Ordering::Greater);
        assert_eq!(b.compare(&b), Ordering::Equal);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_add_and_subtract() {
        let sig = four_four();
        let pos = Position::new(1, 4, 600, sig).unwrap();
        let span = Span::new(0, 1, 500, sig);

        let later = pos.add(span, sig).unwrap();
        assert_eq!(later, Position::new(2, 2, 100, sig).unwrap());
        assert_eq!(later.subtract(span, sig).unwrap(), pos);
    }

    #[test]
    fn test_subtract_below_start() {
        let sig = four_four();
        let pos = Position::new(1, 2, 0, sig).unwrap();
        let span = Span::from_beats(2, sig);
        assert_eq!(pos.subtract(span, sig), Err(TimelineError::BelowTimelineStart));
        assert_eq!(pos.saturating_subtract(span, sig), Position::START);
    }

    #[test]
    fn test_add_beyond_max_measures() {
        let sig = four_four();
        let max = max_measures(sig);
        assert_eq!(max, 1000);

        let last = Position::new(max, 1, 0, sig).unwrap();
        // Landing exactly on the timeline end is allowed
        assert_eq!(last.add(Span::from_measures(1), sig).unwrap(), timeline_end(sig));
        assert_eq!(
            last.add(Span::from_measures(2), sig),
            Err(TimelineError::AboveMaxMeasures { max_measures: max })
        );
    }

    #[test]
    fn test_max_measures_by_signature() {
        assert_eq!(max_measures(TimeSignature::new(3, 4).unwrap()), 1333);
        assert_eq!(max_measures(TimeSignature::new(6, 8).unwrap()), 1333);
        assert_eq!(max_measures(TimeSignature::new(7, 8).unwrap()), 1142);
    }

    #[test]
    fn test_diff_is_unsigned() {
        let sig = four_four();
        let a = Position::new(1, 2, 0, sig).unwrap();
        let b = Position::new(2, 3, 500, sig).unwrap();
        let forward = a.diff(&b, sig);
        assert_eq!(forward, b.diff(&a, sig));
        assert_eq!((forward.measures(), forward.beats(), forward.fraction()), (1, 1, 500));
    }

    #[test]
    fn test_span_normalization() {
        let sig = TimeSignature::new(3, 4).unwrap();
        let span = Span::new(0, 7, 2500, sig);
        assert_eq!((span.measures(), span.beats(), span.fraction()), (3, 0, 500));
        assert_eq!(span.to_beats(sig), 9.5);
        assert!(Span::ZERO.is_zero());
    }

    #[test]
    fn test_renormalize_keeps_beat_count() {
        let four = four_four();
        let three = TimeSignature::new(3, 4).unwrap();
        let pos = Position::new(2, 4, 0, four).unwrap();
        let moved = pos.renormalize(four, three);
        assert_eq!(moved, Position::new(3, 2, 0, three).unwrap());
        assert!(moved.is_normalized(three));
    }

    #[test]
    fn test_display() {
        let sig = four_four();
        assert_eq!(Position::new(3, 2, 50, sig).unwrap().to_string(), "3.2.050");
        assert_eq!(Span::new(1, 2, 5, sig).to_string(), "1m 2b 005");
    }
}
