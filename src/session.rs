//! Dissect session
//!
//! One session per page: owns the mode flag, the audio graph, the panel,
//! the visualizer, the loop controller and the host scheduler that drives
//! them. Nothing is global, so sessions for different tabs coexist.
//!
//! Time only moves through [`DissectSession::advance`], which renders the
//! media through the graph block by block and dispatches due frame and
//! loop callbacks one at a time in time order.

use std::fmt;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::DissectConfig;
use crate::engine::{AudioBuffer, MediaElement, MediaEvent};
use crate::error::Result;
use crate::graph::{AudioGraph, BandId, BANDS};
use crate::host::{AudioBackend, Fired, NativeBackend, Scheduler};
use crate::looping::LoopController;
use crate::messaging::{ContentEndpoint, Request, Response};
use crate::panel::{Panel, PanelElement, PanelEvent};
use crate::visualizer::Visualizer;

/// Mode reported over messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    pub fn is_active(&self) -> bool {
        *self == Status::Active
    }
}

impl From<bool> for Status {
    fn from(active: bool) -> Self {
        if active {
            Status::Active
        } else {
            Status::Inactive
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => write!(f, "active"),
            Status::Inactive => write!(f, "inactive"),
        }
    }
}

/// Work the session schedules on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTask {
    AnimationFrame,
    LoopPoll,
}

/// Per-page dissect state
pub struct DissectSession {
    config: DissectConfig,
    graph: AudioGraph,
    media: Option<MediaElement>,
    panel: Option<Panel>,
    visualizer: Visualizer,
    looper: LoopController,
    scheduler: Scheduler<SessionTask>,
    active: bool,
    soloed: Option<BandId>,
    /// Frames of media time rendered so far
    rendered_frames: u64,
    recording: Option<AudioBuffer>,
}

impl fmt::Debug for DissectSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DissectSession")
            .field("active", &self.active)
            .field("soloed", &self.soloed)
            .field("now_ms", &self.scheduler.now_ms())
            .field("graph", &self.graph)
            .finish()
    }
}

impl DissectSession {
    /// Create a session for a page that may or may not have a media element
    pub fn new(
        config: DissectConfig,
        backend: Box<dyn AudioBackend>,
        media: Option<MediaElement>,
    ) -> Self {
        let graph = AudioGraph::new(backend, &config);
        let scheduler = Scheduler::new(config.frame_interval_ms);
        let looper = LoopController::new(config.loop_poll_ms);

        Self {
            config,
            graph,
            media,
            panel: None,
            visualizer: Visualizer::new(),
            looper,
            scheduler,
            active: false,
            soloed: None,
            rendered_frames: 0,
            recording: None,
        }
    }

    /// Create a session after validating the configuration
    ///
    /// # Errors
    /// `InvalidConfig` for out-of-range settings.
    pub fn try_new(
        config: DissectConfig,
        backend: Box<dyn AudioBackend>,
        media: Option<MediaElement>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config, backend, media))
    }

    /// Session with native audio contexts
    pub fn with_media(config: DissectConfig, media: MediaElement) -> Self {
        Self::new(config, Box::new(NativeBackend), Some(media))
    }

    // ========================================================================
    // Mode
    // ========================================================================

    pub fn status(&self) -> Status {
        Status::from(self.active)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Flip the mode
    pub fn toggle(&mut self) -> Status {
        self.set_active(!self.active)
    }

    /// Force the mode
    pub fn set_active(&mut self, active: bool) -> Status {
        if active {
            self.activate()
        } else {
            self.deactivate()
        }
    }

    /// Enter dissect mode
    ///
    /// Builds the panel on first use and initializes the graph. If the graph
    /// cannot be built the failure is logged and the mode stays inactive.
    pub fn activate(&mut self) -> Status {
        self.ensure_panel();

        if !self.graph.initialize(self.media.as_mut()) {
            error!("[SESSION] Failed to activate dissect mode: audio graph not initialized");
            self.active = false;
            return Status::Inactive;
        }

        self.active = true;
        // A rebuilt graph starts unsoloed
        self.soloed = self.graph.soloed();
        if let Some(panel) = self.panel.as_mut() {
            panel.show();
            panel.highlight_solo(self.soloed);
        }
        self.visualizer
            .start(&mut self.scheduler, SessionTask::AnimationFrame);

        info!("[SESSION] Dissect mode active");
        Status::Active
    }

    /// Leave dissect mode
    ///
    /// Hides the panel, stops drawing, restores the original mix and stops
    /// any loop. Nothing that was already scheduled runs afterwards.
    pub fn deactivate(&mut self) -> Status {
        self.active = false;

        if let Some(panel) = self.panel.as_mut() {
            panel.hide();
        }
        self.visualizer.stop();

        if self.graph.is_initialized() {
            self.graph.unsolo_all();
            self.soloed = None;
        }
        self.looper.cancel();
        self.sync_loop_ui();

        info!("[SESSION] Dissect mode inactive");
        Status::Inactive
    }

    fn ensure_panel(&mut self) {
        if self.panel.is_some() {
            return;
        }

        let mut panel = Panel::standard(&BANDS, self.config.canvas_width, self.config.canvas_height);
        if let Some(media) = self.media.as_ref() {
            self.looper
                .on_duration_known(media.duration().unwrap_or(0.0));
        }
        panel.sync_loop(&self.looper);
        self.panel = Some(panel);
    }

    // ========================================================================
    // Panel interaction
    // ========================================================================

    /// Handle a click or slider input on the panel
    pub fn dispatch(&mut self, event: PanelEvent) {
        if self.panel.is_none() {
            warn!("[SESSION] Ignoring {:?}: panel not built", event);
            return;
        }

        match event {
            PanelEvent::Click(PanelElement::Close) => {
                self.set_active(false);
            }
            PanelEvent::Click(PanelElement::Solo(id)) => self.click_solo(id),
            PanelEvent::Click(PanelElement::UnsoloAll) => self.unsolo_all(),
            PanelEvent::Click(PanelElement::LoopToggle) => {
                if let Err(e) = self.engage_slider_loop() {
                    debug!("[SESSION] Loop not engaged: {}", e);
                }
            }
            PanelEvent::Click(PanelElement::LoopReset) => self.reset_loop(),
            PanelEvent::Input(PanelElement::LoopStartSlider, value) => {
                self.looper.set_start(value);
                self.sync_loop_ui();
            }
            PanelEvent::Input(PanelElement::LoopEndSlider, value) => {
                self.looper.set_end(value);
                self.sync_loop_ui();
            }
            other => debug!("[SESSION] No handler for {:?}", other),
        }
    }

    /// Solo button: toggles between soloing this band and the original mix
    pub fn click_solo(&mut self, id: BandId) {
        if self.soloed == Some(id) {
            self.unsolo_all();
            return;
        }

        self.graph.solo_band(id);
        self.soloed = self.graph.soloed();
        if let Some(panel) = self.panel.as_mut() {
            panel.highlight_solo(Some(id));
        }
    }

    /// Restore the original mix and clear highlighting
    pub fn unsolo_all(&mut self) {
        self.graph.unsolo_all();
        self.soloed = None;
        if let Some(panel) = self.panel.as_mut() {
            panel.highlight_solo(None);
        }
    }

    pub fn soloed(&self) -> Option<BandId> {
        self.soloed
    }

    // ========================================================================
    // Looping
    // ========================================================================

    /// Move both loop sliders and engage the loop
    ///
    /// # Errors
    /// `InvalidLoopRange` when `end <= start` (also shown on the panel) or
    /// `MediaElementMissing`. A running loop is left as is on error.
    pub fn engage_loop(&mut self, start: f64, end: f64) -> Result<()> {
        self.ensure_panel();
        let previous = self.looper.range();
        self.looper.set_start(start);
        self.looper.set_end(end);

        let result = self.engage_slider_loop();
        if result.is_err() {
            self.looper.set_start(previous.start);
            self.looper.set_end(previous.end);
        }
        self.sync_loop_ui();
        result
    }

    /// Engage the loop on the current slider range
    pub fn engage_slider_loop(&mut self) -> Result<()> {
        let result = self.looper.engage(
            self.media.as_mut(),
            &mut self.scheduler,
            SessionTask::LoopPoll,
        );

        match &result {
            Ok(()) => {}
            Err(e) if e.is_user_facing() => {
                if let Some(panel) = self.panel.as_mut() {
                    panel.alert(e.to_string());
                }
            }
            Err(e) => warn!("[SESSION] Cannot loop: {}", e),
        }

        self.sync_loop_ui();
        result
    }

    /// Stop looping and rewind
    pub fn reset_loop(&mut self) {
        self.looper.reset(self.media.as_mut());
        self.sync_loop_ui();
    }

    fn sync_loop_ui(&mut self) {
        if let Some(panel) = self.panel.as_mut() {
            panel.sync_loop(&self.looper);
        }
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Run the page for `ms` milliseconds of host time
    pub fn advance(&mut self, ms: f64) {
        let target = self.scheduler.now_ms() + ms.max(0.0);
        self.handle_media_events();

        while let Some(due) = self.scheduler.next_due_ms().filter(|&t| t <= target) {
            self.render_until(due);
            match self.scheduler.pop_due(due) {
                Some(fired) => self.run_task(fired),
                None => break,
            }
        }

        self.render_until(target);
        self.scheduler.advance_clock(target);
    }

    pub fn now_ms(&self) -> f64 {
        self.scheduler.now_ms()
    }

    /// Keep rendered output from now on
    pub fn start_recording(&mut self) {
        let (channels, sample_rate) = self
            .media
            .as_ref()
            .map(|m| (m.num_channels(), m.sample_rate()))
            .unwrap_or((2, 48000));
        self.recording = Some(AudioBuffer::silent(channels, 0, sample_rate));
    }

    /// Stop recording and return what was rendered
    pub fn take_recording(&mut self) -> Option<AudioBuffer> {
        self.recording.take()
    }

    fn render_until(&mut self, until_ms: f64) {
        let Some(sample_rate) = self.media.as_ref().map(MediaElement::sample_rate) else {
            return;
        };

        let target = (until_ms / 1000.0 * sample_rate as f64).round() as u64;
        let block_size = self.config.block_size.max(1) as u64;

        while self.rendered_frames < target {
            let frames = (target - self.rendered_frames).min(block_size) as usize;
            let Some(media) = self.media.as_mut() else {
                return;
            };
            let block = media.read_block(frames);
            let output = self.graph.process(&block);
            if let Some(recording) = self.recording.as_mut() {
                recording.append(&output);
            }
            self.rendered_frames += frames as u64;
            self.handle_media_events();
        }
    }

    fn handle_media_events(&mut self) {
        let events = match self.media.as_mut() {
            Some(media) => media.take_events(),
            None => return,
        };

        for event in events {
            match event {
                MediaEvent::LoadedMetadata { duration } => {
                    // Already picked up when the panel was built
                    if duration == self.looper.max() {
                        continue;
                    }
                    self.looper.on_duration_known(duration);
                }
                MediaEvent::Ended => self.looper.on_ended(),
            }
            self.sync_loop_ui();
        }
    }

    fn run_task(&mut self, fired: Fired<SessionTask>) {
        match fired.tag {
            SessionTask::AnimationFrame => {
                let canvas = self.panel.as_mut().map(Panel::canvas_mut);
                self.visualizer.on_frame(
                    fired.id,
                    self.active,
                    self.graph.analyser_mut(),
                    canvas,
                    &mut self.scheduler,
                    SessionTask::AnimationFrame,
                );
            }
            SessionTask::LoopPoll => {
                if let Some(media) = self.media.as_mut() {
                    self.looper.tick(fired.id, media);
                }
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &DissectConfig {
        &self.config
    }

    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut AudioGraph {
        &mut self.graph
    }

    pub fn panel(&self) -> Option<&Panel> {
        self.panel.as_ref()
    }

    pub fn panel_mut(&mut self) -> Option<&mut Panel> {
        self.panel.as_mut()
    }

    pub fn media(&self) -> Option<&MediaElement> {
        self.media.as_ref()
    }

    pub fn media_mut(&mut self) -> Option<&mut MediaElement> {
        self.media.as_mut()
    }

    pub fn looper(&self) -> &LoopController {
        &self.looper
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    pub fn scheduler(&self) -> &Scheduler<SessionTask> {
        &self.scheduler
    }
}

impl ContentEndpoint for DissectSession {
    fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::ToggleUi => Response::with_status(self.toggle()),
            Request::GetStatus => Response::with_status(self.status()),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use crate::graph::GainSnapshot;
    use crate::host::UnsupportedBackend;

    fn session() -> DissectSession {
        let media = MediaElement::with_metadata(generate_test_tone(440.0, 20.0, 8000));
        DissectSession::with_media(DissectConfig::default(), media)
    }

    #[test]
    fn test_starts_inactive() {
        let session = session();
        assert_eq!(session.status(), Status::Inactive);
        assert!(session.panel().is_none());
    }

    #[test]
    fn test_activate_builds_and_shows_panel() {
        let mut session = session();
        assert_eq!(session.activate(), Status::Active);

        let panel = session.panel().unwrap();
        assert!(panel.is_visible());
        assert!(session.visualizer().is_running());
        assert_eq!(session.looper().range().end, 20.0);
    }

    #[test]
    fn test_activation_failure_stays_inactive() {
        let media = MediaElement::with_metadata(generate_test_tone(440.0, 1.0, 8000));
        let mut session =
            DissectSession::new(DissectConfig::default(), Box::new(UnsupportedBackend), Some(media));

        assert_eq!(session.toggle(), Status::Inactive);
        assert!(!session.is_active());
        // Panel is still built, just never shown
        assert!(!session.panel().unwrap().is_visible());
    }

    #[test]
    fn test_missing_media_stays_inactive() {
        let mut session = DissectSession::new(DissectConfig::default(), Box::new(NativeBackend), None);
        assert_eq!(session.activate(), Status::Inactive);
    }

    #[test]
    fn test_solo_click_toggles() {
        let mut session = session();
        session.activate();

        session.dispatch(PanelEvent::Click(PanelElement::Solo(BandId::Mid)));
        assert_eq!(session.soloed(), Some(BandId::Mid));
        assert_eq!(session.panel().unwrap().highlighted_solo(), Some(BandId::Mid));

        session.dispatch(PanelEvent::Click(PanelElement::Solo(BandId::Mid)));
        assert_eq!(session.soloed(), None);
        assert_eq!(session.panel().unwrap().highlighted_solo(), None);
        assert_eq!(session.graph().snapshot(), Some(GainSnapshot::UNSOLOED));
    }

    #[test]
    fn test_loop_toggle_with_inverted_sliders() {
        let mut session = session();
        session.activate();
        session.dispatch(PanelEvent::Input(PanelElement::LoopStartSlider, 8.0));
        session.dispatch(PanelEvent::Input(PanelElement::LoopEndSlider, 4.0));

        session.dispatch(PanelEvent::Click(PanelElement::LoopToggle));

        assert!(!session.looper().is_looping());
        assert_eq!(session.panel().unwrap().notices().len(), 1);
        assert_eq!(session.scheduler().pending(), 1); // animation frame only
    }

    #[test]
    fn test_reactivation_after_context_stop_clears_solo() {
        let mut session = session();
        session.activate();
        session.click_solo(BandId::High);

        session.graph_mut().context_mut().unwrap().close();
        assert_eq!(session.activate(), Status::Active);

        assert_eq!(session.soloed(), None);
        assert_eq!(session.panel().unwrap().highlighted_solo(), None);
        assert_eq!(session.graph().snapshot(), Some(GainSnapshot::UNSOLOED));
    }

    #[test]
    fn test_close_deactivates() {
        let mut session = session();
        session.activate();
        session.dispatch(PanelEvent::Click(PanelElement::Close));
        assert_eq!(session.status(), Status::Inactive);
        assert!(!session.panel().unwrap().is_visible());
    }

    #[test]
    fn test_advance_draws_frames_while_active() {
        let mut session = session();
        session.activate();
        session.media_mut().unwrap().play();
        session.advance(100.0);

        assert!(session.visualizer().frames_drawn() >= 5);
        assert!(session.panel().unwrap().canvas().fill_calls() > 0);
    }

    #[test]
    fn test_slider_input_updates_labels() {
        let mut session = session();
        session.activate();
        session.dispatch(PanelEvent::Input(PanelElement::LoopStartSlider, 12.4));

        let panel = session.panel().unwrap();
        assert_eq!(panel.text(PanelElement::LoopStartTime), Some("0:12"));
        assert_eq!(panel.text(PanelElement::LoopEndTime), Some("0:20"));
    }

    #[test]
    fn test_try_new_validates_config() {
        let config = DissectConfig {
            fft_size: 1000,
            ..DissectConfig::default()
        };
        assert!(DissectSession::try_new(config, Box::new(NativeBackend), None).is_err());
    }
}
