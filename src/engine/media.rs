//! Media element model
//!
//! Stands in for the page's video element: a playable buffer with a playhead,
//! a pause flag, duration metadata that arrives after construction, and an
//! end-of-playback event. The element tracks which audio context has captured
//! it, since a host allows one capture node per element for its lifetime.

use std::collections::VecDeque;
use std::fmt;

use log::debug;

use crate::engine::buffer::AudioBuffer;
use crate::error::{DissectError, Result};
use crate::host::ContextId;

/// Playback states of the element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Paused,
    Playing,
    /// Reached the end; behaves as paused until seeked or played again
    Ended,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Paused => write!(f, "Paused"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Ended => write!(f, "Ended"),
        }
    }
}

/// Events the element raises for listeners
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    /// Duration became known
    LoadedMetadata { duration: f64 },
    /// Playback reached the end of the media
    Ended,
}

/// A playable media element backed by an in-memory buffer
#[derive(Debug, Clone)]
pub struct MediaElement {
    source: AudioBuffer,
    /// Playhead in frames
    position: usize,
    state: PlaybackState,
    metadata_loaded: bool,
    captured_by: Option<ContextId>,
    events: VecDeque<MediaEvent>,
}

impl MediaElement {
    /// Create an element whose duration is not known yet
    ///
    /// Call [`MediaElement::load_metadata`] to make the duration available.
    pub fn new(source: AudioBuffer) -> Self {
        Self {
            source,
            position: 0,
            state: PlaybackState::Paused,
            metadata_loaded: false,
            captured_by: None,
            events: VecDeque::new(),
        }
    }

    /// Create an element and immediately load its metadata
    pub fn with_metadata(source: AudioBuffer) -> Self {
        let mut element = Self::new(source);
        element.load_metadata();
        element
    }

    /// Make the duration known and queue a `LoadedMetadata` event
    pub fn load_metadata(&mut self) {
        if self.metadata_loaded {
            return;
        }
        self.metadata_loaded = true;
        let duration = self.source.duration_secs();
        self.events.push_back(MediaEvent::LoadedMetadata { duration });
        debug!("[MEDIA] Metadata loaded, duration {:.3}s", duration);
    }

    /// Duration in seconds, `None` until metadata is loaded
    pub fn duration(&self) -> Option<f64> {
        self.metadata_loaded.then(|| self.source.duration_secs())
    }

    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.source.num_channels()
    }

    /// Current playhead position in seconds
    pub fn current_time(&self) -> f64 {
        self.position as f64 / self.source.sample_rate as f64
    }

    /// Seek to a position in seconds, clamped to the media
    ///
    /// Seeking away from the end clears the ended state.
    pub fn set_current_time(&mut self, seconds: f64) {
        let frame = (seconds.max(0.0) * self.source.sample_rate as f64).round() as usize;
        self.position = frame.min(self.source.num_samples());
        if self.state == PlaybackState::Ended && self.position < self.source.num_samples() {
            self.state = PlaybackState::Paused;
        }
        debug!("[MEDIA] Seek to {:.3}s", self.current_time());
    }

    /// Start playback; restarts from zero when ended
    pub fn play(&mut self) {
        if self.state == PlaybackState::Ended {
            self.position = 0;
        }
        self.state = PlaybackState::Playing;
        debug!("[MEDIA] Play from {:.3}s", self.current_time());
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            debug!("[MEDIA] Paused at {:.3}s", self.current_time());
        }
    }

    /// Paused or ended, matching the host's `paused` attribute
    pub fn is_paused(&self) -> bool {
        self.state != PlaybackState::Playing
    }

    pub fn has_ended(&self) -> bool {
        self.state == PlaybackState::Ended
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Pull the next `frames` of audio, advancing the playhead while playing
    ///
    /// A paused element yields silence. Reaching the end pauses the element
    /// and queues an `Ended` event; the remainder of the block is silence.
    pub fn read_block(&mut self, frames: usize) -> AudioBuffer {
        if self.state != PlaybackState::Playing {
            return AudioBuffer::silent(self.num_channels(), frames, self.sample_rate());
        }

        let block = self.source.slice(self.position, frames);
        let total = self.source.num_samples();
        self.position = (self.position + frames).min(total);

        if self.position >= total {
            self.state = PlaybackState::Ended;
            self.events.push_back(MediaEvent::Ended);
            debug!("[MEDIA] Ended");
        }

        block
    }

    /// Attach an audio context capture node to this element
    ///
    /// # Errors
    /// `MediaAlreadyCaptured` when another capture node is still attached.
    pub fn capture(&mut self, context: ContextId) -> Result<()> {
        match self.captured_by {
            Some(_) => Err(DissectError::MediaAlreadyCaptured),
            None => {
                self.captured_by = Some(context);
                Ok(())
            }
        }
    }

    /// Detach the capture node owned by `context`, if it is the one attached
    pub fn release(&mut self, context: ContextId) {
        if self.captured_by == Some(context) {
            self.captured_by = None;
        }
    }

    pub fn captured_by(&self) -> Option<ContextId> {
        self.captured_by
    }

    /// Drain the events raised since the last call
    pub fn take_events(&mut self) -> Vec<MediaEvent> {
        self.events.drain(..).collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::io::generate_test_tone;
    use approx::assert_relative_eq;

    fn element(duration: f32) -> MediaElement {
        MediaElement::new(generate_test_tone(440.0, duration, 1000))
    }

    #[test]
    fn test_duration_unknown_until_metadata() {
        let mut media = element(2.0);
        assert_eq!(media.duration(), None);
        assert!(media.take_events().is_empty());

        media.load_metadata();
        assert_eq!(media.duration(), Some(2.0));
        assert_eq!(
            media.take_events(),
            vec![MediaEvent::LoadedMetadata { duration: 2.0 }]
        );

        // Loading twice raises nothing new
        media.load_metadata();
        assert!(media.take_events().is_empty());
    }

    #[test]
    fn test_paused_element_yields_silence() {
        let mut media = element(1.0);
        let block = media.read_block(100);
        assert!(block.channel(0).iter().all(|&s| s == 0.0));
        assert_eq!(media.current_time(), 0.0);
    }

    #[test]
    fn test_playing_advances_playhead() {
        let mut media = element(1.0);
        media.play();
        media.read_block(250);
        assert_relative_eq!(media.current_time(), 0.25);
        assert!(!media.is_paused());
    }

    #[test]
    fn test_reaching_end_raises_ended() {
        let mut media = element(0.5);
        media.play();
        media.read_block(400);
        let block = media.read_block(400);

        assert!(media.has_ended());
        assert!(media.is_paused());
        assert_eq!(media.take_events(), vec![MediaEvent::Ended]);
        // Past-the-end frames are silent
        assert_eq!(block.channel(0)[399], 0.0);
    }

    #[test]
    fn test_seek_clamps_and_clears_ended() {
        let mut media = element(1.0);
        media.set_current_time(-5.0);
        assert_eq!(media.current_time(), 0.0);

        media.set_current_time(99.0);
        assert_relative_eq!(media.current_time(), 1.0);

        media.play();
        media.read_block(10);
        assert!(media.has_ended());

        media.set_current_time(0.5);
        assert_eq!(media.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_single_capture_per_element() {
        let mut media = element(1.0);
        let first = ContextId::new_for_test(1);
        let second = ContextId::new_for_test(2);

        assert!(media.capture(first).is_ok());
        let err = media.capture(second).unwrap_err();
        assert_eq!(err.error_code(), "MEDIA_ALREADY_CAPTURED");

        // Only the owner can release
        media.release(second);
        assert_eq!(media.captured_by(), Some(first));
        media.release(first);
        assert!(media.capture(second).is_ok());
    }
}
