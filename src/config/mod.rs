// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Editor settings.
//!
//! This module provides the settings file read by the editor: clock
//! defaults, snap grid and waveform cache parameters. Files are YAML
//! (`.yaml`, `.yml`) or TOML (`.toml`).

pub mod watcher;

pub use watcher::{validate_settings, SettingsEvent, SettingsWatcher};

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::position::SnapGridSizeOption;
use crate::timing::{TimeSignature, TimelineClock, DEFAULT_PIXELS_PER_BEAT, DEFAULT_TEMPO};
use crate::waveform::DEFAULT_LOD_TARGETS;

/// File format of a settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Yaml,
    Toml,
}

impl SettingsFormat {
    /// Pick the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            "yaml" | "yml" => Some(SettingsFormat::Yaml),
            "toml" => Some(SettingsFormat::Toml),
            _ => None,
        }
    }
}

/// Root settings file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EditorSettings {
    /// Snap grid size
    #[serde(default)]
    pub grid: SnapGridSizeOption,
    /// Tempo, meter and zoom
    #[serde(default)]
    pub clock: ClockSettings,
    /// Waveform cache parameters
    #[serde(default)]
    pub waveform: WaveformSettings,
}

impl EditorSettings {
    /// Load settings, choosing the format from the file extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = SettingsFormat::from_path(path)
            .ok_or_else(|| anyhow!("Unsupported settings file extension: {:?}", path))?;
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        let settings = match format {
            SettingsFormat::Yaml => Self::from_yaml(&contents)?,
            SettingsFormat::Toml => Self::from_toml(&contents)?,
        };
        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML settings")
    }

    /// Parse settings from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("Failed to parse TOML settings")
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize settings to YAML")
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize settings to TOML")
    }

    /// Save settings, choosing the format from the file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = match SettingsFormat::from_path(path) {
            Some(SettingsFormat::Yaml) => self.to_yaml()?,
            Some(SettingsFormat::Toml) => self.to_toml()?,
            None => bail!("Unsupported settings file extension: {:?}", path),
        };
        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings file: {:?}", path))
    }

    /// Build the clock described by these settings
    pub fn clock(&self) -> Result<TimelineClock> {
        self.clock.to_clock()
    }

    /// Check every field, returning the first problem
    pub fn validate(&self) -> Result<()> {
        self.clock()?;
        self.waveform.validate()
    }
}

/// Clock section of the settings file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockSettings {
    /// Tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Beats per measure
    #[serde(default = "default_beats_per_measure")]
    pub beats_per_measure: u32,
    /// Note value of one beat
    #[serde(default = "default_beat_unit")]
    pub beat_unit: u32,
    /// Pixels per quarter note at scale 1.0
    #[serde(default = "default_pixels_per_beat")]
    pub pixels_per_beat: f64,
    /// Horizontal zoom
    #[serde(default = "default_horizontal_scale")]
    pub horizontal_scale: f64,
}

fn default_tempo() -> f64 {
    DEFAULT_TEMPO
}
fn default_beats_per_measure() -> u32 {
    4
}
fn default_beat_unit() -> u32 {
    4
}
fn default_pixels_per_beat() -> f64 {
    DEFAULT_PIXELS_PER_BEAT
}
fn default_horizontal_scale() -> f64 {
    1.0
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            tempo: default_tempo(),
            beats_per_measure: default_beats_per_measure(),
            beat_unit: default_beat_unit(),
            pixels_per_beat: default_pixels_per_beat(),
            horizontal_scale: default_horizontal_scale(),
        }
    }
}

impl ClockSettings {
    /// Validate into a clock
    pub fn to_clock(&self) -> Result<TimelineClock> {
        let sig = TimeSignature::new(self.beats_per_measure, self.beat_unit)
            .context("Invalid time signature in settings")?;
        TimelineClock::new(self.tempo, sig, self.pixels_per_beat, self.horizontal_scale)
            .context("Invalid clock settings")
    }
}

impl From<&TimelineClock> for ClockSettings {
    fn from(clock: &TimelineClock) -> Self {
        let sig = clock.time_signature();
        Self {
            tempo: clock.tempo(),
            beats_per_measure: sig.beats_per_measure,
            beat_unit: sig.beat_unit,
            pixels_per_beat: clock.pixels_per_beat(),
            horizontal_scale: clock.horizontal_scale(),
        }
    }
}

/// Waveform section of the settings file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaveformSettings {
    /// Bucket counts of the four cached levels
    #[serde(default = "default_lod_targets")]
    pub lod_targets: Vec<usize>,
    /// Width of one render chunk in pixels
    #[serde(default = "default_chunk_width")]
    pub chunk_width_px: f64,
}

fn default_lod_targets() -> Vec<usize> {
    DEFAULT_LOD_TARGETS.to_vec()
}
fn default_chunk_width() -> f64 {
    4096.0
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            lod_targets: default_lod_targets(),
            chunk_width_px: default_chunk_width(),
        }
    }
}

impl WaveformSettings {
    /// Check level and chunk parameters
    pub fn validate(&self) -> Result<()> {
        if self.lod_targets.len() != DEFAULT_LOD_TARGETS.len() {
            bail!(
                "Expected {} waveform levels, found {}",
                DEFAULT_LOD_TARGETS.len(),
                self.lod_targets.len()
            );
        }
        if self.lod_targets.contains(&0) {
            bail!("Waveform level sizes must be positive");
        }
        if !(self.chunk_width_px.is_finite() && self.chunk_width_px > 0.0) {
            bail!("Chunk width must be positive, got {}", self.chunk_width_px);
        }
        Ok(())
    }
}
