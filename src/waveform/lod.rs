// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Multi-resolution peak summaries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clip::SampleBuffer;
use crate::error::{Result, TimelineError};

/// Default bucket counts, coarse to fine
pub const DEFAULT_LOD_TARGETS: [usize; 4] = [512, 2048, 8192, 32768];

/// Peak and trough of one run of samples
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bucket {
    pub max: f32,
    pub min: f32,
}

/// One resolution of the summary
#[derive(Debug, Clone, PartialEq)]
pub struct LodLevel {
    /// Average number of source samples folded into each bucket
    pub samples_per_bucket: f64,
    pub buckets: Vec<Bucket>,
}

impl LodLevel {
    fn build(samples: &[f32], target: usize) -> Self {
        let count = target.min(samples.len());
        if count == 0 {
            return Self {
                samples_per_bucket: 0.0,
                buckets: Vec::new(),
            };
        }

        let len = samples.len();
        let buckets = (0..count)
            .map(|i| {
                let run = &samples[i * len / count..(i + 1) * len / count];
                run.iter().fold(
                    Bucket {
                        max: f32::NEG_INFINITY,
                        min: f32::INFINITY,
                    },
                    |bucket, &s| Bucket {
                        max: bucket.max.max(s),
                        min: bucket.min.min(s),
                    },
                )
            })
            .collect();

        Self {
            samples_per_bucket: len as f64 / count as f64,
            buckets,
        }
    }
}

/// Precomputed levels, ordered coarse to fine
#[derive(Debug, Clone, PartialEq)]
pub struct LodSet {
    pub sample_count: usize,
    pub levels: Vec<LodLevel>,
}

impl LodSet {
    /// Summarize a buffer, mixing all channels to mono
    pub fn from_buffer(buffer: &SampleBuffer, targets: &[usize]) -> Self {
        build_levels(&buffer.mono_mix(), targets)
    }

    /// Summarize a buffer on the blocking thread pool
    pub async fn build_async(buffer: Arc<SampleBuffer>, targets: Vec<usize>) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::from_buffer(&buffer, &targets))
            .await
            .map_err(|e| TimelineError::BackgroundTask(e.to_string()))
    }

    /// Level to draw at a zoom of `samples_per_pixel`
    ///
    /// The coarsest level whose buckets are no wider than one pixel; when
    /// every level is coarser than that, the finest.
    pub fn select(&self, samples_per_pixel: f64) -> Option<&LodLevel> {
        self.levels
            .iter()
            .find(|level| level.samples_per_bucket <= samples_per_pixel)
            .or_else(|| self.levels.last())
    }

    /// Buckets of the level chosen by [`LodSet::select`]
    pub fn select_level(&self, samples_per_pixel: f64) -> &[Bucket] {
        self.select(samples_per_pixel)
            .map(|level| level.buckets.as_slice())
            .unwrap_or(&[])
    }
}

/// Bucket `samples` once per target length
///
/// Targets are sorted so levels run coarse to fine. A level never has more
/// buckets than there are samples.
pub fn build_levels(samples: &[f32], targets: &[usize]) -> LodSet {
    let mut targets = targets.to_vec();
    targets.sort_unstable();

    let levels: Vec<LodLevel> = targets
        .iter()
        .map(|&target| LodLevel::build(samples, target))
        .collect();
    debug!(
        "Built {} waveform levels over {} samples",
        levels.len(),
        samples.len()
    );

    LodSet {
        sample_count: samples.len(),
        levels,
    }
}
