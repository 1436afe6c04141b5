// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clip audio payloads.
//!
//! The serialized WAV bytes are the durable source of truth; the decoded
//! sample buffer is materialized on demand and never persisted.

use std::io::Cursor;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};
use crate::position::Position;
use crate::timing::TimeSignature;

/// MIME type of buffers produced by this crate
pub const WAV_MIME: &str = "audio/wav";

/// Decoded, de-interleaved PCM samples
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleBuffer {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// One vector per channel
    pub channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Create a buffer from per-channel samples
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Create a silent buffer
    pub fn silent(sample_rate: u32, channel_count: usize, len: usize) -> Self {
        Self {
            sample_rate,
            channels: vec![vec![0.0; len]; channel_count],
        }
    }

    /// Frames present in every channel
    ///
    /// A longer channel's extra samples are ignored by every reader.
    pub fn len(&self) -> usize {
        self.channels.iter().map(|c| c.len()).min().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length in seconds at the buffer's sample rate
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Average of all channels
    pub fn mono_mix(&self) -> Vec<f32> {
        let count = self.channel_count();
        if count == 0 {
            return Vec::new();
        }
        let len = self.len();
        if count == 1 {
            return self.channels[0][..len].to_vec();
        }
        (0..len)
            .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() / count as f32)
            .collect()
    }

    /// Decode WAV bytes (integer or float PCM)
    pub fn decode_wav(bytes: &[u8]) -> Result<Self> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| TimelineError::DecodeFailure(e.to_string()))?;
        let spec = reader.spec();
        let channel_count = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| TimelineError::DecodeFailure(e.to_string()))?,
            hound::SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / max_val))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| TimelineError::DecodeFailure(e.to_string()))?
            }
        };

        let frames = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }

        Ok(Self {
            sample_rate: spec.sample_rate,
            channels,
        })
    }

    /// Encode as 32-bit float WAV
    pub fn encode_wav(&self) -> Result<Vec<u8>> {
        if self.channels.is_empty() || self.channels.len() > u16::MAX as usize {
            return Err(TimelineError::EncodeFailure(format!(
                "unsupported channel count {}",
                self.channels.len()
            )));
        }
        let spec = hound::WavSpec {
            channels: self.channels.len() as u16,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let encode_err = |e: hound::Error| TimelineError::EncodeFailure(e.to_string());
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(encode_err)?;
            for i in 0..self.len() {
                for channel in &self.channels {
                    writer.write_sample(channel[i]).map_err(encode_err)?;
                }
            }
            writer.finalize().map_err(encode_err)?;
        }
        Ok(cursor.into_inner())
    }
}

/// Audio attached to a clip
///
/// One un-looped pass over the raw source is placed relative to the clip
/// start, in ticks. The offset is negative when the source begins before the
/// clip (a head-trimmed clip), so the placement survives moving the clip up
/// against the timeline start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipAudio {
    /// Serialized audio (WAV)
    pub buffer: Arc<[u8]>,
    /// Decoded samples, materialized from `buffer` on demand
    #[serde(skip)]
    pub decoded: Option<Arc<SampleBuffer>>,
    /// Ticks from the clip start to the first source sample
    pub offset_ticks: i64,
    /// Width of one pass over the source in ticks
    pub length_ticks: u64,
    pub source_duration_seconds: f64,
    pub mime: String,
}

impl ClipAudio {
    /// Wrap WAV bytes, decoding them once to validate and measure them
    pub fn from_wav_bytes(bytes: Vec<u8>, offset_ticks: i64, length_ticks: u64) -> Result<Self> {
        let decoded = SampleBuffer::decode_wav(&bytes)?;
        Ok(Self {
            buffer: Arc::from(bytes),
            source_duration_seconds: decoded.duration_seconds(),
            decoded: Some(Arc::new(decoded)),
            offset_ticks,
            length_ticks,
            mime: WAV_MIME.to_string(),
        })
    }

    /// Encode samples and wrap them
    pub fn from_samples(samples: SampleBuffer, offset_ticks: i64, length_ticks: u64) -> Result<Self> {
        let bytes = samples.encode_wav()?;
        Ok(Self {
            buffer: Arc::from(bytes),
            source_duration_seconds: samples.duration_seconds(),
            decoded: Some(Arc::new(samples)),
            offset_ticks,
            length_ticks,
            mime: WAV_MIME.to_string(),
        })
    }

    /// Encode samples spanning `start..end` for a clip starting at `clip_start`
    pub fn placed(
        samples: SampleBuffer,
        clip_start: Position,
        start: Position,
        end: Position,
        sig: TimeSignature,
    ) -> Result<Self> {
        let offset = start.to_ticks(sig) as i64 - clip_start.to_ticks(sig) as i64;
        let length = end.to_ticks(sig).saturating_sub(start.to_ticks(sig));
        Self::from_samples(samples, offset, length)
    }

    /// Signed tick range `[start, end)` of one source pass on the timeline
    pub fn span_ticks(&self, clip_start: Position, sig: TimeSignature) -> (i64, i64) {
        let start = clip_start.to_ticks(sig) as i64 + self.offset_ticks;
        (start, start + self.length_ticks as i64)
    }

    /// Decoded samples if already materialized
    pub fn samples(&self) -> Option<&SampleBuffer> {
        self.decoded.as_deref()
    }

    /// Decoded samples, decoding the buffer if needed
    pub fn decode(&self) -> Result<SampleBuffer> {
        match self.decoded {
            Some(ref decoded) => Ok(decoded.as_ref().clone()),
            None => SampleBuffer::decode_wav(&self.buffer),
        }
    }

    /// Copy of this payload with the decoded buffer materialized
    pub fn with_decoded(mut self) -> Result<Self> {
        if self.decoded.is_none() {
            let decoded = SampleBuffer::decode_wav(&self.buffer).map_err(|e| {
                tracing::warn!("Failed to decode clip audio: {}", e);
                e
            })?;
            self.decoded = Some(Arc::new(decoded));
        }
        Ok(self)
    }

    /// Decode on the blocking thread pool
    pub async fn decode_async(&self) -> Result<SampleBuffer> {
        if let Some(ref decoded) = self.decoded {
            return Ok(decoded.as_ref().clone());
        }
        let buffer = Arc::clone(&self.buffer);
        tokio::task::spawn_blocking(move || SampleBuffer::decode_wav(&buffer))
            .await
            .map_err(|e| TimelineError::BackgroundTask(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32 / len as f32).collect()
    }

    #[test]
    fn test_wav_round_trip() {
        let buffer = SampleBuffer::new(48000, vec![ramp(64), ramp(64).iter().map(|s| -s).collect()]);
        let bytes = buffer.encode_wav().unwrap();
        let decoded = SampleBuffer::decode_wav(&bytes).unwrap();

        assert_eq!(decoded.sample_rate, 48000);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded, buffer);
    }

    #[test]
    fn test_decode_int_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(-32768i16).unwrap();
            writer.finalize().unwrap();
        }

        let decoded = SampleBuffer::decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(decoded.channels[0], vec![0.5, -1.0]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = SampleBuffer::decode_wav(b"not a wav file");
        assert!(matches!(result, Err(TimelineError::DecodeFailure(_))));
    }

    #[test]
    fn test_encode_without_channels_fails() {
        let result = SampleBuffer::new(44100, Vec::new()).encode_wav();
        assert!(matches!(result, Err(TimelineError::EncodeFailure(_))));
    }

    #[test]
    fn test_mono_mix() {
        let buffer = SampleBuffer::new(44100, vec![vec![1.0, 0.5], vec![0.0, -0.5]]);
        assert_eq!(buffer.mono_mix(), vec![0.5, 0.0]);
        assert_eq!(buffer.duration_seconds(), 2.0 / 44100.0);
    }

    #[test]
    fn test_ragged_channels_use_shortest() {
        let buffer = SampleBuffer::new(1000, vec![vec![1.0; 10], vec![0.0; 5]]);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.mono_mix(), vec![0.5; 5]);

        let decoded = SampleBuffer::decode_wav(&buffer.encode_wav().unwrap()).unwrap();
        assert_eq!(decoded.len(), 5);
        assert_eq!(decoded.channels[0], vec![1.0; 5]);
    }

    #[test]
    fn test_placement_relative_to_clip() {
        let sig = TimeSignature::FOUR_FOUR;
        let clip_start = Position::new(1, 3, 0, sig).unwrap();
        let audio = ClipAudio::placed(
            SampleBuffer::new(1000, vec![ramp(300)]),
            clip_start,
            Position::new(1, 2, 0, sig).unwrap(),
            Position::new(2, 1, 0, sig).unwrap(),
            sig,
        )
        .unwrap();

        assert_eq!((audio.offset_ticks, audio.length_ticks), (-1000, 3000));
        assert_eq!(audio.span_ticks(clip_start, sig), (1000, 4000));
        assert_eq!(audio.span_ticks(Position::START, sig), (-1000, 2000));
    }

    #[test]
    fn test_decoded_samples_are_not_serialized() {
        let samples = SampleBuffer::new(8000, vec![ramp(80)]);
        let audio = ClipAudio::from_samples(samples.clone(), -250, 1000).unwrap();

        let yaml = serde_yaml::to_string(&audio).unwrap();
        assert!(!yaml.contains("decoded"));
        let loaded: ClipAudio = serde_yaml::from_str(&yaml).unwrap();
        assert!(loaded.samples().is_none());
        assert_eq!(loaded.offset_ticks, -250);
        assert_eq!(loaded.decode().unwrap(), samples);
    }

    #[test]
    fn test_lazy_decode() {
        let samples = SampleBuffer::new(8000, vec![ramp(800)]);
        let audio = ClipAudio::from_samples(samples.clone(), 0, 1000).unwrap();
        assert_eq!(audio.source_duration_seconds, 0.1);
        assert_eq!(audio.mime, WAV_MIME);

        let stripped = ClipAudio {
            decoded: None,
            ..audio
        };
        assert!(stripped.samples().is_none());

        let restored = stripped.with_decoded().unwrap();
        assert_eq!(restored.samples(), Some(&samples));
    }

    #[tokio::test]
    async fn test_decode_async() {
        let samples = SampleBuffer::new(8000, vec![ramp(100)]);
        let audio = ClipAudio::from_samples(samples.clone(), 0, 1000).unwrap();
        let stripped = ClipAudio {
            decoded: None,
            ..audio
        };

        let decoded = stripped.decode_async().await.unwrap();
        assert_eq!(decoded, samples);
    }
}
