//! Session configuration
//!
//! Every field has a default matching the behaviour of the page panel, so an
//! empty JSON object is a valid configuration file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DissectError, Result};

// ============================================================================
// Defaults
// ============================================================================

/// Analyser transform size (bins = fft_size / 2)
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Analyser temporal smoothing constant
pub const DEFAULT_SMOOTHING: f32 = 0.8;

/// Lower edge of the byte magnitude scale in dB
pub const DEFAULT_MIN_DECIBELS: f32 = -100.0;

/// Upper edge of the byte magnitude scale in dB
pub const DEFAULT_MAX_DECIBELS: f32 = -30.0;

/// Loop boundary polling period
pub const DEFAULT_LOOP_POLL_MS: f64 = 100.0;

/// Display refresh interval (60 Hz)
pub const DEFAULT_FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// URL fragment identifying a qualifying video page
pub const DEFAULT_WATCH_URL_PATTERN: &str = "youtube.com/watch";

/// How long the "not a video page" popup stays up
pub const DEFAULT_POPUP_REVERT_MS: f64 = 3000.0;

const MIN_FFT_SIZE: usize = 32;
const MAX_FFT_SIZE: usize = 32768;

/// Configuration for a Dissect session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DissectConfig {
    /// Analyser transform size, a power of two in 32..=32768
    pub fft_size: usize,
    /// Analyser smoothing constant in [0, 1]
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
    /// Loop boundary check period in milliseconds
    pub loop_poll_ms: f64,
    /// Per-frame callback interval in milliseconds
    pub frame_interval_ms: f64,
    /// Frames rendered per audio block
    pub block_size: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub watch_url_pattern: String,
    pub popup_revert_ms: f64,
}

impl Default for DissectConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            smoothing: DEFAULT_SMOOTHING,
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
            loop_poll_ms: DEFAULT_LOOP_POLL_MS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            block_size: 512,
            canvas_width: 300,
            canvas_height: 100,
            watch_url_pattern: DEFAULT_WATCH_URL_PATTERN.to_string(),
            popup_revert_ms: DEFAULT_POPUP_REVERT_MS,
        }
    }
}

impl DissectConfig {
    /// Load and validate a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DissectError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }

        let text = std::fs::read_to_string(path)?;
        let config: DissectConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(invalid(
                "fft_size",
                format!(
                    "{} is not a power of two in {}..={}",
                    self.fft_size, MIN_FFT_SIZE, MAX_FFT_SIZE
                ),
            ));
        }

        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(invalid(
                "smoothing",
                format!("{} is outside [0, 1]", self.smoothing),
            ));
        }

        if self.max_decibels <= self.min_decibels {
            return Err(invalid(
                "max_decibels",
                format!(
                    "{} must be greater than min_decibels {}",
                    self.max_decibels, self.min_decibels
                ),
            ));
        }

        if self.loop_poll_ms <= 0.0 {
            return Err(invalid("loop_poll_ms", "must be positive".to_string()));
        }

        if self.frame_interval_ms <= 0.0 {
            return Err(invalid(
                "frame_interval_ms",
                "must be positive".to_string(),
            ));
        }

        if self.block_size == 0 {
            return Err(invalid("block_size", "must be at least 1".to_string()));
        }

        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(invalid(
                "canvas_width",
                format!(
                    "canvas must be non-empty, got {}x{}",
                    self.canvas_width, self.canvas_height
                ),
            ));
        }

        if self.watch_url_pattern.is_empty() {
            return Err(invalid(
                "watch_url_pattern",
                "must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> DissectError {
    DissectError::InvalidConfig { field, reason }
}
