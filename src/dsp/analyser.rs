//! Analyser tap
//!
//! Produces frequency-domain magnitude data for the visualizer the way a host
//! analyser node does: a Blackman-windowed FFT over the most recent
//! `fft_size` samples, blended with the previous frame by a smoothing
//! constant, converted to dB and mapped onto bytes between `min_decibels`
//! and `max_decibels`.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::AudioNode;
use crate::config::DissectConfig;
use crate::engine::AudioBuffer;
use crate::error::{DissectError, Result};

/// Blackman window alpha
const BLACKMAN_ALPHA: f32 = 0.16;

/// Analyser settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserSettings {
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl From<&DissectConfig> for AnalyserSettings {
    fn from(config: &DissectConfig) -> Self {
        Self {
            fft_size: config.fft_size,
            smoothing: config.smoothing,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
        }
    }
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self::from(&DissectConfig::default())
    }
}

/// Frequency analysis node
pub struct Analyser {
    settings: AnalyserSettings,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Circular time-domain history, mono
    history: Vec<f32>,
    write_pos: usize,
    scratch: Vec<Complex<f32>>,
    /// Smoothed linear magnitudes from the previous analysis
    smoothed: Vec<f32>,
}

impl std::fmt::Debug for Analyser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyser")
            .field("settings", &self.settings)
            .field("write_pos", &self.write_pos)
            .finish()
    }
}

impl Analyser {
    /// Create an analyser
    ///
    /// # Errors
    /// `InvalidConfig` when the FFT size is not a power of two or the decibel
    /// range is empty.
    pub fn new(settings: AnalyserSettings) -> Result<Self> {
        if !settings.fft_size.is_power_of_two() || settings.fft_size < 32 {
            return Err(DissectError::InvalidConfig {
                field: "fft_size",
                reason: format!("{} is not a power of two >= 32", settings.fft_size),
            });
        }
        if settings.max_decibels <= settings.min_decibels {
            return Err(DissectError::InvalidConfig {
                field: "max_decibels",
                reason: "must be greater than min_decibels".to_string(),
            });
        }

        let n = settings.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(n);
        let window = (0..n).map(|i| blackman(i, n)).collect();

        Ok(Self {
            settings,
            fft,
            window,
            history: vec![0.0; n],
            write_pos: 0,
            scratch: vec![Complex::new(0.0, 0.0); n],
            smoothed: vec![0.0; n / 2],
        })
    }

    pub fn settings(&self) -> AnalyserSettings {
        self.settings
    }

    pub fn fft_size(&self) -> usize {
        self.settings.fft_size
    }

    /// Number of frequency bins (half the FFT size)
    pub fn frequency_bin_count(&self) -> usize {
        self.settings.fft_size / 2
    }

    /// Feed audio into the analysis window (downmixed to mono)
    pub fn push(&mut self, buffer: &AudioBuffer) {
        let n = self.history.len();
        for sample in buffer.mono_mix() {
            self.history[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % n;
        }
    }

    /// Fill `out` with byte magnitudes, one per bin
    ///
    /// Extra entries of a longer `out` are left untouched; a shorter `out`
    /// receives the lowest bins.
    pub fn get_byte_frequency_data(&mut self, out: &mut [u8]) {
        self.analyze();

        let AnalyserSettings {
            min_decibels,
            max_decibels,
            ..
        } = self.settings;
        let range_scale = 255.0 / (max_decibels - min_decibels);

        for (byte, &magnitude) in out.iter_mut().zip(self.smoothed.iter()) {
            let db = linear_magnitude_to_db(magnitude);
            let scaled = (range_scale * (db - min_decibels)).floor();
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }

    /// Fill `out` with magnitudes in dB, one per bin
    pub fn get_float_frequency_data(&mut self, out: &mut [f32]) {
        self.analyze();
        for (value, &magnitude) in out.iter_mut().zip(self.smoothed.iter()) {
            *value = linear_magnitude_to_db(magnitude);
        }
    }

    /// Run the windowed FFT and fold the result into the smoothed spectrum
    fn analyze(&mut self) {
        let n = self.settings.fft_size;

        // Oldest sample first
        for i in 0..n {
            let sample = self.history[(self.write_pos + i) % n];
            self.scratch[i] = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let tau = self.settings.smoothing;
        let scale = 1.0 / n as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(self.scratch.iter()) {
            let magnitude = bin.norm() * scale;
            let blended = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if blended.is_finite() { blended } else { 0.0 };
        }
    }
}

impl AudioNode for Analyser {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        self.push(buffer);
    }

    fn prepare(&mut self, _sample_rate: u32, _num_channels: usize) {
        self.reset();
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
        self.smoothed.fill(0.0);
        self.write_pos = 0;
    }

    fn node_type(&self) -> &'static str {
        "analyser"
    }
}

/// Blackman window coefficient
fn blackman(index: usize, size: usize) -> f32 {
    let a0 = 0.5 * (1.0 - BLACKMAN_ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * BLACKMAN_ALPHA;
    let x = 2.0 * std::f32::consts::PI * index as f32 / size as f32;
    a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
}

#[inline]
fn linear_magnitude_to_db(magnitude: f32) -> f32 {
    if magnitude <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * magnitude.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;

    fn settings(smoothing: f32) -> AnalyserSettings {
        AnalyserSettings {
            smoothing,
            ..AnalyserSettings::default()
        }
    }

    fn peak_bin(data: &[f32]) -> usize {
        data.iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
                if v > best.1 {
                    (i, v)
                } else {
                    best
                }
            })
            .0
    }

    #[test]
    fn test_bin_count_is_half_fft() {
        let analyser = Analyser::new(AnalyserSettings::default()).unwrap();
        assert_eq!(analyser.frequency_bin_count(), 1024);
    }

    #[test]
    fn test_rejects_bad_fft_size() {
        let bad = AnalyserSettings {
            fft_size: 1000,
            ..AnalyserSettings::default()
        };
        assert!(Analyser::new(bad).is_err());
    }

    #[test]
    fn test_silence_maps_to_zero_bytes() {
        let mut analyser = Analyser::new(settings(0.0)).unwrap();
        analyser.push(&AudioBuffer::silent(2, 4096, 48000));
        let mut data = vec![7u8; analyser.frequency_bin_count()];
        analyser.get_byte_frequency_data(&mut data);
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut analyser = Analyser::new(settings(0.0)).unwrap();
        // 48000 / 2048 = 23.4375 Hz per bin; bin 64 = 1500 Hz
        analyser.push(&generate_test_tone(1500.0, 0.1, 48000));

        let mut db = vec![0.0f32; analyser.frequency_bin_count()];
        analyser.get_float_frequency_data(&mut db);
        assert_eq!(peak_bin(&db), 64);

        // Windowed unit sine sits near -13.5 dB, well above the byte range top
        let mut data = vec![0u8; analyser.frequency_bin_count()];
        analyser.get_byte_frequency_data(&mut data);
        assert_eq!(data[64], 255);
        assert!(data[900] < 40);
    }

    #[test]
    fn test_smoothing_blends_frames() {
        let mut smooth = Analyser::new(settings(0.8)).unwrap();
        let mut sharp = Analyser::new(settings(0.0)).unwrap();
        let tone = generate_test_tone(1500.0, 0.1, 48000);
        smooth.push(&tone);
        sharp.push(&tone);

        let mut a = vec![0.0f32; 1024];
        let mut b = vec![0.0f32; 1024];
        smooth.get_float_frequency_data(&mut a);
        sharp.get_float_frequency_data(&mut b);

        // First smoothed frame is 20% of the instantaneous magnitude (-14 dB)
        assert!((b[64] - a[64] - 13.98).abs() < 0.1);
    }

    #[test]
    fn test_process_does_not_modify_signal() {
        let mut analyser = Analyser::new(AnalyserSettings::default()).unwrap();
        let tone = generate_test_tone(440.0, 0.05, 48000);
        let mut buffer = tone.clone();
        analyser.process(&mut buffer);
        assert_eq!(buffer, tone);
    }
}
