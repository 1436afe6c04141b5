// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Perceptual volume mapping.
//!
//! Maps decibels onto a fader-like 0..1 scale where equal steps sound like
//! equal loudness changes. 0 is silence, 1 is +6 dB.

/// Map a level in dB to the perceptual 0..1 scale
pub fn normalize(db: f64) -> f64 {
    if db.is_nan() || db == f64::NEG_INFINITY {
        return 0.0;
    }
    let gain = 10f64.powf(db / 20.0);
    if gain <= 0.0 {
        return 0.0;
    }
    let base = ((6.0 * gain.log2() + 192.0) / 198.0).clamp(0.0, 1.0);
    base.powi(8)
}

/// Inverse of [`normalize`]; 0 maps to negative infinity dB
pub fn denormalize(position: f64) -> f64 {
    if position.is_nan() || position <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let base = position.min(1.0).powf(1.0 / 8.0);
    let gain = 2f64.powf((base * 198.0 - 192.0) / 6.0);
    20.0 * gain.log10()
}
