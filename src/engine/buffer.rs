//! Audio Buffer Management
//!
//! Planar sample storage shared by the media element, the graph nodes and
//! the analyser tap.

use crate::error::{DissectError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns `f32::NEG_INFINITY` for zero or negative input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Planar audio buffer
///
/// # Example
/// ```
/// use dissect::engine::{AudioBuffer, ChannelLayout};
///
/// let buffer = AudioBuffer::new(48000, ChannelLayout::Stereo, 48000);
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer with the given length, layout and rate
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self::silent(layout.num_channels(), num_samples, sample_rate)
    }

    /// Create a silent buffer with an arbitrary channel count
    pub fn silent(num_channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate,
        }
    }

    /// Create an audio buffer from interleaved sample data
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(DissectError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_samples = self.num_samples();
        let mut interleaved = Vec::with_capacity(self.num_channels() * num_samples);

        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / self.sample_rate as f64
    }

    /// Immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Copy `len` frames starting at `start`, padding with silence past the end
    pub fn slice(&self, start: usize, len: usize) -> AudioBuffer {
        let samples = self
            .samples
            .iter()
            .map(|ch| {
                let mut out = vec![0.0_f32; len];
                if start < ch.len() {
                    let available = (ch.len() - start).min(len);
                    out[..available].copy_from_slice(&ch[start..start + available]);
                }
                out
            })
            .collect();

        AudioBuffer {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Append another buffer's frames
    ///
    /// Channels missing from `other` are extended with silence.
    pub fn append(&mut self, other: &AudioBuffer) {
        let added = other.num_samples();
        for (ch, channel) in self.samples.iter_mut().enumerate() {
            match other.samples.get(ch) {
                Some(src) => channel.extend_from_slice(src),
                None => channel.extend(std::iter::repeat(0.0).take(added)),
            }
        }
    }

    /// Add `other * gain` into this buffer sample by sample
    pub fn mix_in(&mut self, other: &AudioBuffer, gain: f32) {
        for (dst, src) in self.samples.iter_mut().zip(other.samples.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d += s * gain;
            }
        }
    }

    /// Average all channels into one
    pub fn mono_mix(&self) -> Vec<f32> {
        let num_channels = self.num_channels();
        if num_channels == 0 {
            return Vec::new();
        }

        let scale = 1.0 / num_channels as f32;
        (0..self.num_samples())
            .map(|i| self.samples.iter().map(|ch| ch[i]).sum::<f32>() * scale)
            .collect()
    }

    /// RMS level of a channel in dB
    pub fn rms_db(&self, channel: usize) -> f32 {
        let Some(data) = self.samples.get(channel) else {
            return f32::NEG_INFINITY;
        };
        if data.is_empty() {
            return f32::NEG_INFINITY;
        }

        let sum_sq: f64 = data.iter().map(|&s| (s as f64) * (s as f64)).sum();
        linear_to_db((sum_sq / data.len() as f64).sqrt() as f32)
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(0, ChannelLayout::Stereo, 48000)
    }
}

// ============================================================================
// Tests
// ============================================================================
