//! Toolbar activation surface
//!
//! Clicking the toolbar trigger on a qualifying page runs the toggle with
//! bootstrap. On any other page the trigger swaps in an informational popup
//! and reverts to the normal popup after a delay.

use log::info;

use super::bootstrap::{toggle_with_bootstrap, ToggleOutcome};
use super::tab::Tab;
use crate::config::DissectConfig;
use crate::error::Result;
use crate::host::{Scheduler, TaskHandle};

/// Whether a page URL qualifies for dissect mode
pub fn is_video_page(url: &str, pattern: &str) -> bool {
    !pattern.is_empty() && url.contains(pattern)
}

/// Popup the toolbar trigger currently opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupPage {
    #[default]
    Main,
    NotVideoPage,
}

/// Timers owned by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceTask {
    RevertPopup,
}

/// Result of clicking the toolbar trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceClick {
    Toggled(ToggleOutcome),
    NotVideoPage,
}

/// The toolbar trigger and its popup selection
#[derive(Debug)]
pub struct ActivationSurface {
    pattern: String,
    revert_ms: f64,
    popup: PopupPage,
    revert: Option<TaskHandle>,
    scheduler: Scheduler<SurfaceTask>,
}

impl ActivationSurface {
    pub fn new(config: &DissectConfig) -> Self {
        Self {
            pattern: config.watch_url_pattern.clone(),
            revert_ms: config.popup_revert_ms,
            popup: PopupPage::Main,
            revert: None,
            scheduler: Scheduler::new(config.frame_interval_ms),
        }
    }

    pub fn popup(&self) -> PopupPage {
        self.popup
    }

    /// Whether the informational popup is waiting to revert
    pub fn revert_pending(&self) -> bool {
        self.revert.as_ref().is_some_and(TaskHandle::is_live)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Handle a click on the toolbar trigger for `tab`
    ///
    /// # Errors
    /// Bootstrap failures from [`toggle_with_bootstrap`].
    pub fn on_clicked(&mut self, tab: &mut dyn Tab) -> Result<SurfaceClick> {
        if is_video_page(tab.url(), &self.pattern) {
            return toggle_with_bootstrap(tab).map(SurfaceClick::Toggled);
        }

        info!("[SURFACE] Not a video page: {}", tab.url());
        self.popup = PopupPage::NotVideoPage;
        self.revert = Some(
            self.scheduler
                .set_timeout(self.revert_ms, SurfaceTask::RevertPopup),
        );
        Ok(SurfaceClick::NotVideoPage)
    }

    /// Let `ms` milliseconds pass
    pub fn advance(&mut self, ms: f64) {
        let target = self.scheduler.now_ms() + ms.max(0.0);
        while let Some(fired) = self.scheduler.pop_due(target) {
            match fired.tag {
                SurfaceTask::RevertPopup => {
                    self.popup = PopupPage::Main;
                    self.revert = None;
                }
            }
        }
        self.scheduler.advance_clock(target);
    }
}
