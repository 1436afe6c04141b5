// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timeline clock.
//!
//! A `TimelineClock` is a snapshot of tempo, time signature and horizontal
//! zoom. Every conversion between musical positions, pixels and seconds
//! takes one snapshot explicitly; there is no process-wide "current" clock.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// Pixels occupied by one quarter note at a horizontal scale of 1.0
pub const DEFAULT_PIXELS_PER_BEAT: f64 = 40.0;

/// Default tempo in BPM
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Largest supported beat unit (1/64 notes)
pub const MAX_BEAT_UNIT: u32 = 64;

/// Time signature (beats per measure over beat unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimeSignatureFields")]
pub struct TimeSignature {
    /// Beats in one measure (numerator)
    pub beats_per_measure: u32,
    /// Note value of one beat (denominator, power of two)
    pub beat_unit: u32,
}

impl TimeSignature {
    /// Common time
    pub const FOUR_FOUR: TimeSignature = TimeSignature {
        beats_per_measure: 4,
        beat_unit: 4,
    };

    /// Create a validated time signature
    pub fn new(beats_per_measure: u32, beat_unit: u32) -> Result<Self> {
        if beats_per_measure == 0 {
            return Err(TimelineError::InvalidClock(
                "beats per measure must be at least 1".to_string(),
            ));
        }
        if !beat_unit.is_power_of_two() || beat_unit > MAX_BEAT_UNIT {
            return Err(TimelineError::InvalidClock(format!(
                "beat unit {} is not a power of two up to {}",
                beat_unit, MAX_BEAT_UNIT
            )));
        }
        Ok(Self {
            beats_per_measure,
            beat_unit,
        })
    }

    /// Length of one beat measured in quarter notes
    pub fn quarters_per_beat(&self) -> f64 {
        4.0 / self.beat_unit as f64
    }
}

#[derive(Deserialize)]
struct TimeSignatureFields {
    beats_per_measure: u32,
    beat_unit: u32,
}

impl TryFrom<TimeSignatureFields> for TimeSignature {
    type Error = TimelineError;

    fn try_from(fields: TimeSignatureFields) -> Result<Self> {
        Self::new(fields.beats_per_measure, fields.beat_unit)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.beats_per_measure, self.beat_unit)
    }
}

/// Tempo, meter and zoom snapshot used for all conversions
///
/// Deserialization goes through [`TimelineClock::new`], so a loaded clock
/// is as valid as a constructed one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClockFields")]
pub struct TimelineClock {
    /// Tempo in BPM
    tempo: f64,
    /// Current time signature
    time_signature: TimeSignature,
    /// Pixels per quarter note at unit scale
    pixels_per_beat: f64,
    /// User zoom factor
    horizontal_scale: f64,
}

impl TimelineClock {
    /// Create a validated clock
    pub fn new(
        tempo: f64,
        time_signature: TimeSignature,
        pixels_per_beat: f64,
        horizontal_scale: f64,
    ) -> Result<Self> {
        check_positive("tempo", tempo)?;
        check_positive("pixels per beat", pixels_per_beat)?;
        check_positive("horizontal scale", horizontal_scale)?;
        // Re-validate in case the signature was built from raw fields
        let time_signature =
            TimeSignature::new(time_signature.beats_per_measure, time_signature.beat_unit)?;

        Ok(Self {
            tempo,
            time_signature,
            pixels_per_beat,
            horizontal_scale,
        })
    }

    /// Get the tempo in BPM
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Get the time signature
    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// Get pixels per quarter note at unit scale
    pub fn pixels_per_beat(&self) -> f64 {
        self.pixels_per_beat
    }

    /// Get the horizontal zoom factor
    pub fn horizontal_scale(&self) -> f64 {
        self.horizontal_scale
    }

    /// Copy of this clock at another tempo
    pub fn with_tempo(&self, tempo: f64) -> Result<Self> {
        Self::new(
            tempo,
            self.time_signature,
            self.pixels_per_beat,
            self.horizontal_scale,
        )
    }

    /// Copy of this clock with another time signature
    pub fn with_time_signature(&self, time_signature: TimeSignature) -> Result<Self> {
        Self::new(
            self.tempo,
            time_signature,
            self.pixels_per_beat,
            self.horizontal_scale,
        )
    }

    /// Copy of this clock at another zoom level
    pub fn with_horizontal_scale(&self, horizontal_scale: f64) -> Result<Self> {
        Self::new(
            self.tempo,
            self.time_signature,
            self.pixels_per_beat,
            horizontal_scale,
        )
    }

    /// Width of one beat in pixels
    pub fn beat_width(&self) -> f64 {
        self.pixels_per_beat * self.horizontal_scale * self.time_signature.quarters_per_beat()
    }

    /// Width of one measure in pixels
    pub fn measure_width(&self) -> f64 {
        self.beat_width() * self.time_signature.beats_per_measure as f64
    }

    /// Duration of one beat in seconds
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.tempo
    }
}

#[derive(Deserialize)]
struct ClockFields {
    tempo: f64,
    time_signature: TimeSignature,
    pixels_per_beat: f64,
    horizontal_scale: f64,
}

impl TryFrom<ClockFields> for TimelineClock {
    type Error = TimelineError;

    fn try_from(fields: ClockFields) -> Result<Self> {
        Self::new(
            fields.tempo,
            fields.time_signature,
            fields.pixels_per_beat,
            fields.horizontal_scale,
        )
    }
}

impl Default for TimelineClock {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            time_signature: TimeSignature::FOUR_FOUR,
            pixels_per_beat: DEFAULT_PIXELS_PER_BEAT,
            horizontal_scale: 1.0,
        }
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TimelineError::InvalidClock(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}
