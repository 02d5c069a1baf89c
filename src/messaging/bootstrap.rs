//! Probe-then-bootstrap toggle
//!
//! The privileged side first sends `toggleUI` to whatever is listening in
//! the tab. If nothing answers with a status, it injects the content
//! endpoint and its stylesheet and sends `toggleUI` exactly once more.

use log::{debug, error, info, warn};

use super::protocol::Request;
use super::tab::Tab;
use crate::error::Result;
use crate::session::Status;

/// How a toggle reached the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The probe was answered; the endpoint was already running
    Delivered(Status),
    /// The endpoint was injected and the retry delivered; the status is
    /// whatever the retry reported
    Injected(Option<Status>),
}

impl ToggleOutcome {
    pub fn status(&self) -> Option<Status> {
        match self {
            ToggleOutcome::Delivered(status) => Some(*status),
            ToggleOutcome::Injected(status) => *status,
        }
    }
}

/// Toggle dissect mode in a tab, bootstrapping the endpoint if needed
///
/// # Errors
/// - `InjectionFailed` when the endpoint cannot be injected; nothing is
///   retried
/// - `DeliveryFailed` when the single retry also fails
pub fn toggle_with_bootstrap(tab: &mut dyn Tab) -> Result<ToggleOutcome> {
    match tab.send(Request::ToggleUi) {
        Ok(response) => {
            if let Some(status) = response.status {
                info!("[BOOT] Content endpoint already active, toggled to {}", status);
                return Ok(ToggleOutcome::Delivered(status));
            }
            debug!("[BOOT] Probe answered without a status");
        }
        Err(e) => debug!("[BOOT] Probe failed: {}", e),
    }

    if let Err(e) = tab.inject_content() {
        error!("[BOOT] Failed to inject content script: {}", e);
        return Err(e);
    }
    info!("[BOOT] Content script injected");

    if let Err(e) = tab.insert_css() {
        warn!("[BOOT] Stylesheet not inserted: {}", e);
    }

    let response = tab.send(Request::ToggleUi)?;
    Ok(ToggleOutcome::Injected(response.status))
}
