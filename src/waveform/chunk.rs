// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Fixed-width render chunks for long waveforms.

/// Chunk to render for a viewport position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    /// Chunk containing the viewport's left edge
    pub index: usize,
    /// Whether the following chunk must be rendered too
    pub needs_auxiliary: bool,
}

/// Number of chunks covering `total_width_px`
pub fn chunk_count(total_width_px: f64, chunk_size_px: f64) -> usize {
    if !(total_width_px > 0.0) || !(chunk_size_px > 0.0) {
        return 0;
    }
    (total_width_px / chunk_size_px).ceil() as usize
}

/// Pixel range `[start, end)` of one chunk, clipped to the total width
pub fn chunk_range(index: usize, total_width_px: f64, chunk_size_px: f64) -> (f64, f64) {
    let start = index as f64 * chunk_size_px;
    let end = (start + chunk_size_px).min(total_width_px.max(0.0));
    (start.min(end), end)
}

/// Chunk under the viewport's left edge
///
/// A viewport starting off a chunk boundary straddles into the next chunk,
/// which is then flagged as auxiliary if it exists.
pub fn chunk_window(total_width_px: f64, viewport_left_px: f64, chunk_size_px: f64) -> ChunkWindow {
    let count = chunk_count(total_width_px, chunk_size_px);
    if count == 0 {
        return ChunkWindow {
            index: 0,
            needs_auxiliary: false,
        };
    }

    let left = if viewport_left_px.is_finite() {
        viewport_left_px.clamp(0.0, total_width_px)
    } else {
        0.0
    };
    let index = ((left / chunk_size_px).floor() as usize).min(count - 1);
    let offset = left - index as f64 * chunk_size_px;

    ChunkWindow {
        index,
        needs_auxiliary: offset > 0.0 && index + 1 < count,
    }
}
