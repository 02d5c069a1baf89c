//! DSP Nodes
//!
//! The processing nodes the audio graph is built from. All nodes implement
//! the `AudioNode` trait for uniform processing.

mod analyser;
mod biquad;
mod gain;
mod node;

pub use analyser::{Analyser, AnalyserSettings};
pub use biquad::{BiquadFilter, FilterType};
pub use gain::GainNode;
pub use node::AudioNode;
