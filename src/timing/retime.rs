// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Re-timing positions across a clock change.
//!
//! Positions either stay on the same wall-clock second (un-stretched audio)
//! or on the same musical instant (notes, automation). The caller picks the
//! policy per field.

use serde::{Deserialize, Serialize};

use super::clock::TimelineClock;
use crate::position::Position;

/// What a position stays attached to when the clock changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pin {
    /// Same second of playback
    WallClock,
    /// Same number of beats from the start, re-normalized to the new meter
    Musical,
}

/// Re-express a signed tick offset under a new clock
///
/// Ticks count beats, which the time signature does not change, so only a
/// wall-clock pin rescales them.
pub fn retime_ticks(ticks: i64, old: &TimelineClock, new: &TimelineClock, pin: Pin) -> i64 {
    match pin {
        Pin::WallClock => {
            (ticks as f64 * old.seconds_per_beat() / new.seconds_per_beat()).round() as i64
        }
        Pin::Musical => ticks,
    }
}

/// Re-express one position under a new clock
pub fn retime_position(
    pos: Position,
    old: &TimelineClock,
    new: &TimelineClock,
    pin: Pin,
) -> Position {
    let ticks = pos.to_ticks(old.time_signature()) as i64;
    let retimed = retime_ticks(ticks, old, new, pin).max(0) as u64;
    Position::from_ticks(retimed, new.time_signature())
}

/// Keep each position on the same wall-clock second under `new`
pub fn retime_for_new_tempo(
    old: &TimelineClock,
    new: &TimelineClock,
    positions: &[Position],
) -> Vec<Position> {
    positions
        .iter()
        .map(|pos| retime_position(*pos, old, new, Pin::WallClock))
        .collect()
}
