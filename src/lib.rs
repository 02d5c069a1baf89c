//! Dissect - Band Isolation, Spectrum View and Looping
//!
//! Dissect overlays a control panel on a page playing media and lets the
//! user:
//! 1. Solo one of five fixed frequency bands (plain filtering, not source
//!    separation)
//! 2. Watch a live spectrum of the full mix
//! 3. Loop a time range of playback
//!
//! # Architecture
//!
//! A [`session::DissectSession`] owns everything for one page: the audio
//! graph, the panel, the visualizer, the loop controller and a cooperative
//! host scheduler with a virtual clock. The host's collaborators (media
//! element, audio context, canvas, timers, tab messaging) are modelled in
//! [`engine`], [`host`] and [`messaging`] so sessions run natively.

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod graph;
pub mod host;
pub mod looping;
pub mod messaging;
pub mod panel;
pub mod session;
pub mod visualizer;

pub use error::{DissectError, Result};
