//! Gain node
//!
//! Linear gain stage used for the original-mix path and each band path.
//! Mute/solo is expressed purely as gain writes so the graph topology never
//! changes after it is built.

use super::AudioNode;
use crate::engine::{linear_to_db, AudioBuffer};

/// Linear gain stage
#[derive(Debug, Clone, PartialEq)]
pub struct GainNode {
    gain: f32,
}

impl GainNode {
    /// Create a gain node with a linear gain (negative values are clamped to 0)
    pub fn new(gain: f32) -> Self {
        Self {
            gain: gain.max(0.0),
        }
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Current gain in dB (negative infinity when muted)
    pub fn gain_db(&self) -> f32 {
        linear_to_db(self.gain)
    }

    pub fn is_muted(&self) -> bool {
        self.gain == 0.0
    }
}

impl Default for GainNode {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl AudioNode for GainNode {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        // Unity gain optimization
        if (self.gain - 1.0).abs() < f32::EPSILON {
            return;
        }

        for channel in buffer.samples.iter_mut() {
            if self.gain == 0.0 {
                channel.fill(0.0);
            } else {
                for sample in channel.iter_mut() {
                    *sample *= self.gain;
                }
            }
        }
    }

    fn prepare(&mut self, _sample_rate: u32, _num_channels: usize) {}

    fn reset(&mut self) {
        // Gain has no internal state to reset
    }

    fn node_type(&self) -> &'static str {
        "gain"
    }
}
