// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the timeline clock (tempo, meter and zoom) and
//! the re-timing rules applied when tempo or meter change.

pub mod clock;
pub mod retime;

pub use clock::{TimeSignature, TimelineClock, DEFAULT_PIXELS_PER_BEAT, DEFAULT_TEMPO};
pub use retime::{retime_for_new_tempo, retime_position, retime_ticks, Pin};
