//! Audio node trait
//!
//! Base trait for the processing nodes wired into the audio graph.

use crate::engine::AudioBuffer;

/// A node in the audio-routing graph
///
/// Nodes process buffers in place. Taps that only observe the signal (the
/// analyser) leave the buffer untouched.
pub trait AudioNode {
    /// Process audio buffer in-place
    fn process(&mut self, buffer: &mut AudioBuffer);

    /// Prepare the node for a sample rate and channel count
    fn prepare(&mut self, sample_rate: u32, num_channels: usize);

    /// Clear internal state (filter history, analysis window)
    fn reset(&mut self);

    /// Node type identifier
    fn node_type(&self) -> &'static str;
}
