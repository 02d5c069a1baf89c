//! Extension popup
//!
//! Shows the mode of the active tab and offers a toggle button. Only
//! qualifying pages are queried; anywhere else the popup asks the user to
//! navigate to a video page.

use log::error;

use super::protocol::Request;
use super::surface::is_video_page;
use super::tab::Tab;
use crate::error::DissectError;
use crate::host::Rgb;
use crate::session::Status;

pub const ACTIVE_TEXT: &str = "Dissect Mode Active!";
pub const INACTIVE_TEXT: &str = "Dissect Mode Inactive.";
pub const PROCESSING_TEXT: &str = "Processing...";
pub const NOT_VIDEO_TEXT: &str = "Please navigate to a YouTube video page.";
pub const DEACTIVATE_LABEL: &str = "Deactivate Dissect Mode";
pub const ACTIVATE_LABEL: &str = "Activate Dissect Mode";

const ACTIVE_BUTTON_COLOR: Rgb = Rgb::new(0x55, 0x55, 0x55);
const INACTIVE_BUTTON_COLOR: Rgb = Rgb::new(0xFF, 0x00, 0x00);

/// What the popup displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub status_text: String,
    pub button_label: String,
    pub button_color: Rgb,
    pub button_enabled: bool,
}

impl PopupView {
    fn for_status(status: Status) -> Self {
        match status {
            Status::Active => Self {
                status_text: ACTIVE_TEXT.to_string(),
                button_label: DEACTIVATE_LABEL.to_string(),
                button_color: ACTIVE_BUTTON_COLOR,
                button_enabled: true,
            },
            Status::Inactive => Self {
                status_text: INACTIVE_TEXT.to_string(),
                button_label: ACTIVATE_LABEL.to_string(),
                button_color: INACTIVE_BUTTON_COLOR,
                button_enabled: true,
            },
        }
    }
}

/// The popup bound to the active tab
#[derive(Debug, Clone)]
pub struct Popup {
    pattern: String,
    view: PopupView,
}

impl Popup {
    /// Open the popup and query the tab's status
    ///
    /// Any reply other than `active`, including a failed delivery, shows
    /// the inactive view.
    pub fn open(pattern: impl Into<String>, tab: &mut dyn Tab) -> Self {
        let pattern = pattern.into();

        let view = if is_video_page(tab.url(), &pattern) {
            let status = tab
                .send(Request::GetStatus)
                .ok()
                .and_then(|r| r.status)
                .unwrap_or(Status::Inactive);
            PopupView::for_status(status)
        } else {
            PopupView {
                status_text: NOT_VIDEO_TEXT.to_string(),
                button_enabled: false,
                ..PopupView::for_status(Status::Inactive)
            }
        };

        Self { pattern, view }
    }

    pub fn view(&self) -> &PopupView {
        &self.view
    }

    /// Handle a click on the toggle button
    pub fn click(&mut self, tab: &mut dyn Tab) -> &PopupView {
        if !is_video_page(tab.url(), &self.pattern) {
            self.view.status_text = NOT_VIDEO_TEXT.to_string();
            return &self.view;
        }

        match tab.send(Request::ToggleUi) {
            Ok(response) => match response.status {
                Some(status) => self.view = PopupView::for_status(status),
                None => self.view.status_text = PROCESSING_TEXT.to_string(),
            },
            Err(e) => {
                error!("[POPUP] {}", e);
                let message = match e {
                    DissectError::DeliveryFailed { reason } if !reason.is_empty() => reason,
                    DissectError::DeliveryFailed { .. } => "Unknown error".to_string(),
                    other => other.to_string(),
                };
                self.view.status_text = format!("Error: {}", message);
            }
        }
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DissectConfig, DEFAULT_WATCH_URL_PATTERN};
    use crate::engine::{generate_test_tone, MediaElement};
    use crate::messaging::SimulatedTab;
    use crate::session::DissectSession;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://www.youtube.com/watch?v=abc";

    fn live_tab() -> SimulatedTab {
        let media = MediaElement::with_metadata(generate_test_tone(440.0, 1.0, 8000));
        SimulatedTab::with_session(URL, DissectSession::with_media(DissectConfig::default(), media))
    }

    #[test]
    fn test_open_shows_inactive() {
        let mut tab = live_tab();
        let popup = Popup::open(DEFAULT_WATCH_URL_PATTERN, &mut tab);
        assert_eq!(popup.view().status_text, INACTIVE_TEXT);
        assert_eq!(popup.view().button_label, ACTIVATE_LABEL);
        assert!(popup.view().button_enabled);
    }

    #[test]
    fn test_click_toggles_view() {
        let mut tab = live_tab();
        let mut popup = Popup::open(DEFAULT_WATCH_URL_PATTERN, &mut tab);

        assert_eq!(popup.click(&mut tab).status_text, ACTIVE_TEXT);
        assert_eq!(popup.view().button_label, DEACTIVATE_LABEL);
        assert_eq!(popup.view().button_color, Rgb::new(0x55, 0x55, 0x55));

        assert_eq!(popup.click(&mut tab).status_text, INACTIVE_TEXT);
    }

    #[test]
    fn test_not_video_page_disables_button() {
        let mut tab = SimulatedTab::new("https://example.com/");
        let popup = Popup::open(DEFAULT_WATCH_URL_PATTERN, &mut tab);
        assert_eq!(popup.view().status_text, NOT_VIDEO_TEXT);
        assert!(!popup.view().button_enabled);
    }

    #[test]
    fn test_delivery_error_is_shown() {
        let mut tab = SimulatedTab::new(URL);
        let mut popup = Popup::open(DEFAULT_WATCH_URL_PATTERN, &mut tab);
        assert_eq!(popup.view().status_text, INACTIVE_TEXT);

        let view = popup.click(&mut tab);
        assert!(view.status_text.starts_with("Error: Could not establish connection"));
    }
}
