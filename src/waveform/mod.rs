// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Waveform level-of-detail cache.
//!
//! Peak/trough summaries at several resolutions, plus the chunking used to
//! render waveforms wider than a single render target.

pub mod chunk;
pub mod lod;

pub use chunk::{chunk_count, chunk_range, chunk_window, ChunkWindow};
pub use lod::{build_levels, Bucket, LodLevel, LodSet, DEFAULT_LOD_TARGETS};
