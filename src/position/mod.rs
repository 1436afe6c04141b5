// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Position algebra.
//!
//! This module provides the musical position and span types along with:
//! - Normalized arithmetic with explicit timeline bounds
//! - Pixel and wall-clock conversions against a `TimelineClock`
//! - Snapping and zoom-driven grid selection

pub mod convert;
pub mod grid;
pub mod pos;

pub use grid::{auto_grid_span, grid_span, SnapGridSizeOption, SnapMode, MIN_GRID_PIXELS};
pub use pos::{max_measures, timeline_end, Position, Span, TICKS_PER_BEAT};
