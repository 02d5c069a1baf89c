//! Biquad filter node
//!
//! Second-order IIR sections following the Audio EQ Cookbook, parameterised
//! the way a host biquad filter node is: low-pass and high-pass take their Q
//! as a resonance in dB, band-pass takes a plain quality factor and has a
//! 0 dB peak at the center frequency.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::AudioNode;
use crate::engine::AudioBuffer;

/// Filter response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Remove above frequency
    LowPass,
    /// Keep a band around the center frequency
    BandPass,
    /// Remove below frequency
    HighPass,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::LowPass => "lowpass",
            FilterType::BandPass => "bandpass",
            FilterType::HighPass => "highpass",
        }
    }
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    fn calculate(filter_type: FilterType, sample_rate: f64, frequency: f64, q: f64) -> Self {
        let nyquist = sample_rate / 2.0;
        let freq = frequency.clamp(1.0, nyquist - 1.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();

        let (b0, b1, b2, a0, a1, a2) = match filter_type {
            FilterType::LowPass => {
                let alpha = sin_w0 / (2.0 * 10.0_f64.powf(q / 20.0));
                (
                    (1.0 - cos_w0) / 2.0,
                    1.0 - cos_w0,
                    (1.0 - cos_w0) / 2.0,
                    1.0 + alpha,
                    -2.0 * cos_w0,
                    1.0 - alpha,
                )
            }
            FilterType::HighPass => {
                let alpha = sin_w0 / (2.0 * 10.0_f64.powf(q / 20.0));
                (
                    (1.0 + cos_w0) / 2.0,
                    -(1.0 + cos_w0),
                    (1.0 + cos_w0) / 2.0,
                    1.0 + alpha,
                    -2.0 * cos_w0,
                    1.0 - alpha,
                )
            }
            FilterType::BandPass => {
                let alpha = sin_w0 / (2.0 * q.max(1e-4));
                (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
        };

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude of H(e^jw) at `frequency`
    fn magnitude_at(&self, sample_rate: f64, frequency: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// Biquad filter state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    /// Direct Form I
    #[inline]
    fn process(&mut self, input: f64, c: &BiquadCoeffs) -> f64 {
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// A single biquad filter node with per-channel state
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    filter_type: FilterType,
    frequency: f32,
    q: f32,
    sample_rate: u32,
    coeffs: BiquadCoeffs,
    states: Vec<BiquadState>,
}

impl BiquadFilter {
    pub fn new(filter_type: FilterType, frequency: f32, q: f32, sample_rate: u32) -> Self {
        let mut filter = Self {
            filter_type,
            frequency,
            q,
            sample_rate,
            coeffs: BiquadCoeffs::default(),
            states: vec![BiquadState::default(); 2],
        };
        filter.update_coefficients();
        filter
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    /// Linear magnitude response at a frequency in Hz
    pub fn magnitude_response(&self, frequency: f32) -> f32 {
        self.coeffs
            .magnitude_at(self.sample_rate as f64, frequency as f64) as f32
    }

    fn update_coefficients(&mut self) {
        self.coeffs = BiquadCoeffs::calculate(
            self.filter_type,
            self.sample_rate as f64,
            self.frequency as f64,
            self.q as f64,
        );
    }
}

impl AudioNode for BiquadFilter {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        if self.states.len() < buffer.num_channels() {
            self.states
                .resize(buffer.num_channels(), BiquadState::default());
        }

        for (channel, state) in buffer.samples.iter_mut().zip(self.states.iter_mut()) {
            for sample in channel.iter_mut() {
                *sample = state.process(*sample as f64, &self.coeffs) as f32;
            }
        }
    }

    fn prepare(&mut self, sample_rate: u32, num_channels: usize) {
        self.sample_rate = sample_rate;
        self.states = vec![BiquadState::default(); num_channels];
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.states.fill(BiquadState::default());
    }

    fn node_type(&self) -> &'static str {
        "biquad"
    }
}
