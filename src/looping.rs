//! Loop controller
//!
//! Keeps playback inside a user-chosen time range by polling the playhead
//! on a fixed timer and seeking back to the start whenever it reaches the
//! end. The range captured when the loop is engaged is the one enforced;
//! moving the sliders afterwards takes effect on the next engage.

use log::{debug, info, warn};

use crate::engine::MediaElement;
use crate::error::{DissectError, Result};
use crate::host::{Rgb, Scheduler, TaskHandle, TaskId};

/// Loop button label while idle
pub const IDLE_LABEL: &str = "Set Loop & Play";

/// Loop button label while a loop is running
pub const LOOPING_LABEL: &str = "Looping... Click to Stop";

/// Loop button color while idle
pub const IDLE_COLOR: Rgb = Rgb::new(0xFF, 0x00, 0x00);

/// Loop button color while a loop is running
pub const LOOPING_COLOR: Rgb = Rgb::new(0x00, 0x7b, 0xff);

/// Format seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let minutes = (seconds / 60.0).floor() as u64;
    let remainder = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, remainder)
}

/// A playback time range in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoopRange {
    pub start: f64,
    pub end: f64,
}

impl LoopRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Whether the range can be looped (`end > start`)
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }
}

#[derive(Debug)]
struct EngagedLoop {
    range: LoopRange,
    timer: TaskHandle,
}

/// Loop state: slider range plus the running loop, if any
#[derive(Debug)]
pub struct LoopController {
    poll_ms: f64,
    /// Current slider values
    range: LoopRange,
    /// Slider upper bound (media duration once known)
    max: f64,
    engaged: Option<EngagedLoop>,
    seek_backs: u64,
}

impl LoopController {
    pub fn new(poll_ms: f64) -> Self {
        Self {
            poll_ms,
            range: LoopRange::default(),
            max: 0.0,
            engaged: None,
            seek_backs: 0,
        }
    }

    pub fn range(&self) -> LoopRange {
        self.range
    }

    /// Upper bound of both sliders
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Set the start slider, clamped to `[0, max]`
    pub fn set_start(&mut self, seconds: f64) -> f64 {
        self.range.start = self.clamp(seconds);
        self.range.start
    }

    /// Set the end slider, clamped to `[0, max]`
    pub fn set_end(&mut self, seconds: f64) -> f64 {
        self.range.end = self.clamp(seconds);
        self.range.end
    }

    /// Track a newly known media duration; the end slider moves to it
    pub fn on_duration_known(&mut self, duration: f64) {
        self.max = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.range.start = self.range.start.min(self.max);
        self.range.end = self.max;
        debug!("[LOOP] Range bounds now 0..{:.3}s", self.max);
    }

    /// Start looping the current slider range
    ///
    /// Replaces any running loop: seeks to the start, resumes playback if
    /// paused, and polls the playhead every `poll_ms`.
    ///
    /// # Errors
    /// - `MediaElementMissing` when there is no element to loop
    /// - `InvalidLoopRange` when `end <= start`; a running loop is untouched
    pub fn engage<T: Copy + std::fmt::Debug>(
        &mut self,
        media: Option<&mut MediaElement>,
        scheduler: &mut Scheduler<T>,
        tag: T,
    ) -> Result<()> {
        let media = media.ok_or(DissectError::MediaElementMissing)?;

        let range = self.range;
        if !range.is_valid() {
            return Err(DissectError::InvalidLoopRange {
                start: range.start,
                end: range.end,
            });
        }

        self.cancel();

        media.set_current_time(range.start);
        if media.is_paused() {
            media.play();
        }

        let timer = scheduler.set_interval(self.poll_ms, tag);
        self.engaged = Some(EngagedLoop { range, timer });
        info!(
            "[LOOP] Looping {} - {}",
            format_time(range.start),
            format_time(range.end)
        );
        Ok(())
    }

    /// Handle a due poll; returns `true` if it seeked back
    ///
    /// Polls from a cancelled or replaced timer are ignored.
    pub fn tick(&mut self, fired: TaskId, media: &mut MediaElement) -> bool {
        let Some(engaged) = self.engaged.as_ref() else {
            return false;
        };
        if !engaged.timer.is_live() || engaged.timer.id() != fired {
            return false;
        }

        if media.current_time() >= engaged.range.end {
            media.set_current_time(engaged.range.start);
            self.seek_backs += 1;
            debug!("[LOOP] Seek back to {:.3}s", engaged.range.start);
            return true;
        }
        false
    }

    /// Stop the running loop; returns `true` if one was running
    pub fn cancel(&mut self) -> bool {
        match self.engaged.take() {
            Some(engaged) => {
                engaged.timer.cancel();
                debug!("[LOOP] Cancelled");
                true
            }
            None => false,
        }
    }

    /// Stop looping at end of playback
    pub fn on_ended(&mut self) {
        if self.cancel() {
            info!("[LOOP] Playback ended, loop stopped");
        }
    }

    /// Stop looping, rewind and pause the element, and reset the range to
    /// the whole media
    pub fn reset(&mut self, media: Option<&mut MediaElement>) {
        self.cancel();

        let Some(media) = media else {
            warn!("[LOOP] No media element to reset");
            return;
        };

        media.set_current_time(0.0);
        if !media.is_paused() {
            media.pause();
        }
        self.range = LoopRange::new(0.0, media.duration().unwrap_or(0.0));
    }

    pub fn is_looping(&self) -> bool {
        self.engaged
            .as_ref()
            .is_some_and(|engaged| engaged.timer.is_live())
    }

    /// Range enforced by the running loop
    pub fn engaged_range(&self) -> Option<LoopRange> {
        self.engaged.as_ref().map(|engaged| engaged.range)
    }

    /// Times the loop has jumped back to its start
    pub fn seek_backs(&self) -> u64 {
        self.seek_backs
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_looping() {
            LOOPING_LABEL
        } else {
            IDLE_LABEL
        }
    }

    pub fn button_color(&self) -> Rgb {
        if self.is_looping() {
            LOOPING_COLOR
        } else {
            IDLE_COLOR
        }
    }

    pub fn start_label(&self) -> String {
        format_time(self.range.start)
    }

    pub fn end_label(&self) -> String {
        format_time(self.range.end)
    }

    fn clamp(&self, seconds: f64) -> f64 {
        if seconds.is_nan() {
            return 0.0;
        }
        seconds.clamp(0.0, self.max)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use test_case::test_case;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Poll;

    fn media(duration: f32) -> MediaElement {
        MediaElement::with_metadata(generate_test_tone(440.0, duration, 1000))
    }

    fn controller(duration: f64) -> LoopController {
        let mut ctl = LoopController::new(100.0);
        ctl.on_duration_known(duration);
        ctl
    }

    #[test_case(0.0, "0:00")]
    #[test_case(5.9, "0:05")]
    #[test_case(65.0, "1:05")]
    #[test_case(600.0, "10:00")]
    #[test_case(-3.0, "0:00")]
    fn test_format_time(seconds: f64, expected: &str) {
        assert_eq!(format_time(seconds), expected);
    }

    #[test]
    fn test_duration_sets_bounds_and_end() {
        let mut ctl = LoopController::new(100.0);
        assert_eq!(ctl.range(), LoopRange::new(0.0, 0.0));

        ctl.on_duration_known(30.0);
        assert_eq!(ctl.range(), LoopRange::new(0.0, 30.0));
        assert_eq!(ctl.set_end(45.0), 30.0);
        assert_eq!(ctl.set_start(-1.0), 0.0);
        assert_eq!(ctl.end_label(), "0:30");
    }

    #[test]
    fn test_engage_seeks_and_plays() {
        let mut sched = Scheduler::new(16.0);
        let mut media = media(20.0);
        let mut ctl = controller(20.0);
        ctl.set_start(5.0);
        ctl.set_end(15.0);

        ctl.engage(Some(&mut media), &mut sched, Poll).unwrap();
        assert_eq!(media.current_time(), 5.0);
        assert!(!media.is_paused());
        assert!(ctl.is_looping());
        assert_eq!(ctl.button_label(), LOOPING_LABEL);
        assert_eq!(ctl.button_color(), LOOPING_COLOR);
    }

    #[test]
    fn test_invalid_range_leaves_running_loop() {
        let mut sched = Scheduler::new(16.0);
        let mut media = media(20.0);
        let mut ctl = controller(20.0);
        ctl.set_start(5.0);
        ctl.set_end(15.0);
        ctl.engage(Some(&mut media), &mut sched, Poll).unwrap();

        ctl.set_start(10.0);
        ctl.set_end(5.0);
        let err = ctl.engage(Some(&mut media), &mut sched, Poll).unwrap_err();
        assert!(err.is_user_facing());

        assert!(ctl.is_looping());
        assert_eq!(ctl.engaged_range(), Some(LoopRange::new(5.0, 15.0)));
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn test_missing_media_is_rejected() {
        let mut sched = Scheduler::new(16.0);
        let mut ctl = controller(20.0);
        let err = ctl.engage(None, &mut sched, Poll).unwrap_err();
        assert_eq!(err.error_code(), "MEDIA_ELEMENT_MISSING");
        assert!(!ctl.is_looping());
    }

    #[test]
    fn test_tick_seeks_back_past_end() {
        let mut sched = Scheduler::new(16.0);
        let mut media = media(20.0);
        let mut ctl = controller(20.0);
        ctl.set_start(5.0);
        ctl.set_end(15.0);
        ctl.engage(Some(&mut media), &mut sched, Poll).unwrap();

        let fired = sched.pop_due(f64::MAX).unwrap();
        media.set_current_time(14.0);
        assert!(!ctl.tick(fired.id, &mut media));

        media.set_current_time(15.05);
        assert!(ctl.tick(fired.id, &mut media));
        assert_eq!(media.current_time(), 5.0);
        assert_eq!(ctl.seek_backs(), 1);
    }

    #[test]
    fn test_reengage_replaces_timer() {
        let mut sched = Scheduler::new(16.0);
        let mut media = media(20.0);
        let mut ctl = controller(20.0);
        ctl.set_end(10.0);
        ctl.engage(Some(&mut media), &mut sched, Poll).unwrap();
        let old = sched.pop_due(f64::MAX).unwrap();

        ctl.engage(Some(&mut media), &mut sched, Poll).unwrap();
        assert_eq!(sched.pending(), 1);

        media.set_current_time(12.0);
        assert!(!ctl.tick(old.id, &mut media));
    }

    #[test]
    fn test_reset_rewinds_and_pauses() {
        let mut sched = Scheduler::new(16.0);
        let mut media = media(20.0);
        let mut ctl = controller(20.0);
        ctl.set_start(3.0);
        ctl.set_end(8.0);
        ctl.engage(Some(&mut media), &mut sched, Poll).unwrap();

        ctl.reset(Some(&mut media));
        assert!(!ctl.is_looping());
        assert_eq!(sched.pending(), 0);
        assert_eq!(media.current_time(), 0.0);
        assert!(media.is_paused());
        assert_eq!(ctl.range(), LoopRange::new(0.0, 20.0));
        assert_eq!(ctl.button_label(), IDLE_LABEL);
        assert_eq!(ctl.button_color(), IDLE_COLOR);
    }

    #[test]
    fn test_ended_cancels_loop() {
        let mut sched = Scheduler::new(16.0);
        let mut media = media(20.0);
        let mut ctl = controller(20.0);
        ctl.set_end(10.0);
        ctl.engage(Some(&mut media), &mut sched, Poll).unwrap();

        ctl.on_ended();
        assert!(!ctl.is_looping());
        assert_eq!(sched.pending(), 0);
    }
}
