//! Messaging Integration Tests
//!
//! End-to-end tests for the toolbar surface, the bootstrap toggle and the
//! popup talking to sessions hosted in simulated tabs.

use pretty_assertions::assert_eq;

use dissect::config::{DissectConfig, DEFAULT_WATCH_URL_PATTERN};
use dissect::engine::{generate_test_tone, MediaElement};
use dissect::messaging::popup::{ACTIVE_TEXT, INACTIVE_TEXT, NOT_VIDEO_TEXT};
use dissect::messaging::{
    toggle_with_bootstrap, ActivationSurface, ContentEndpoint, Popup, PopupPage, SimulatedTab,
    SurfaceClick, Tab, ToggleOutcome,
};
use dissect::session::{DissectSession, Status};
use dissect::Result;

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

fn new_session() -> Result<DissectSession> {
    let media = MediaElement::with_metadata(generate_test_tone(440.0, 5.0, 8000));
    Ok(DissectSession::with_media(DissectConfig::default(), media))
}

fn status_of(tab: &SimulatedTab) -> Option<Status> {
    tab.session().map(DissectSession::status)
}

// === Bootstrap Tests ===

#[test]
fn test_first_click_injects_then_toggles() {
    let mut surface = ActivationSurface::new(&DissectConfig::default());
    let mut tab = SimulatedTab::with_factory(VIDEO_URL, new_session);

    let click = surface.on_clicked(&mut tab).unwrap();
    assert_eq!(
        click,
        SurfaceClick::Toggled(ToggleOutcome::Injected(Some(Status::Active)))
    );
    assert_eq!(tab.injections(), 1);
    assert!(tab.css_inserted());
    assert_eq!(status_of(&tab), Some(Status::Active));

    let click = surface.on_clicked(&mut tab).unwrap();
    assert_eq!(
        click,
        SurfaceClick::Toggled(ToggleOutcome::Delivered(Status::Inactive))
    );
    assert_eq!(tab.injections(), 1);
    assert_eq!(status_of(&tab), Some(Status::Inactive));
}

#[test]
fn test_navigation_requires_new_bootstrap() {
    let mut tab = SimulatedTab::with_factory(VIDEO_URL, new_session);
    toggle_with_bootstrap(&mut tab).unwrap();

    tab.navigate("https://www.youtube.com/watch?v=other");
    assert_eq!(status_of(&tab), None);

    let outcome = toggle_with_bootstrap(&mut tab).unwrap();
    assert_eq!(outcome, ToggleOutcome::Injected(Some(Status::Active)));
    assert_eq!(tab.injections(), 2);
}

#[test]
fn test_injection_failure_is_reported_once() {
    let mut tab = SimulatedTab::new(VIDEO_URL);

    let err = toggle_with_bootstrap(&mut tab).unwrap_err();
    assert_eq!(err.error_code(), "INJECTION_FAILED");
    assert_eq!(tab.deliveries(), 0);
}

#[test]
fn test_factory_error_becomes_injection_failure() {
    let mut tab = SimulatedTab::with_factory(VIDEO_URL, || {
        let config = DissectConfig {
            fft_size: 1000,
            ..DissectConfig::default()
        };
        DissectSession::try_new(config, Box::new(dissect::host::NativeBackend), None)
    });

    let err = toggle_with_bootstrap(&mut tab).unwrap_err();
    assert_eq!(err.error_code(), "INJECTION_FAILED");
    assert!(err.to_string().contains("fft_size"));
}

#[test]
fn test_page_without_media_stays_inactive() {
    let mut tab = SimulatedTab::with_factory(VIDEO_URL, || {
        Ok(DissectSession::new(
            DissectConfig::default(),
            Box::new(dissect::host::NativeBackend),
            None,
        ))
    });

    let outcome = toggle_with_bootstrap(&mut tab).unwrap();
    assert_eq!(outcome, ToggleOutcome::Injected(Some(Status::Inactive)));
    // Panel is built even though the graph is not
    assert!(tab.session().unwrap().panel().is_some());
}

// === Surface Tests ===

#[test]
fn test_non_video_page_shows_info_popup() {
    let mut surface = ActivationSurface::new(&DissectConfig::default());
    let mut tab = SimulatedTab::with_factory("https://www.youtube.com/", new_session);

    assert_eq!(surface.on_clicked(&mut tab).unwrap(), SurfaceClick::NotVideoPage);
    assert_eq!(surface.popup(), PopupPage::NotVideoPage);
    assert_eq!(tab.injections(), 0);

    surface.advance(1500.0);
    // Clicking again restarts the revert delay
    surface.on_clicked(&mut tab).unwrap();
    surface.advance(2000.0);
    assert_eq!(surface.popup(), PopupPage::NotVideoPage);
    surface.advance(1000.0);
    assert_eq!(surface.popup(), PopupPage::Main);
}

// === Popup Tests ===

#[test]
fn test_popup_reflects_and_flips_mode() {
    let mut tab = SimulatedTab::with_factory(VIDEO_URL, new_session);
    toggle_with_bootstrap(&mut tab).unwrap();

    let mut popup = Popup::open(DEFAULT_WATCH_URL_PATTERN, &mut tab);
    assert_eq!(popup.view().status_text, ACTIVE_TEXT);

    let view = popup.click(&mut tab);
    assert_eq!(view.status_text, INACTIVE_TEXT);
    assert_eq!(status_of(&tab), Some(Status::Inactive));
}

#[test]
fn test_popup_without_endpoint() {
    let mut tab = SimulatedTab::new(VIDEO_URL);
    let mut popup = Popup::open(DEFAULT_WATCH_URL_PATTERN, &mut tab);
    assert_eq!(popup.view().status_text, INACTIVE_TEXT);

    let view = popup.click(&mut tab);
    assert_eq!(
        view.status_text,
        "Error: Could not establish connection. Receiving end does not exist."
    );
}

#[test]
fn test_popup_on_other_page() {
    let mut tab = SimulatedTab::with_factory("https://example.com/", new_session);
    let popup = Popup::open(DEFAULT_WATCH_URL_PATTERN, &mut tab);

    assert_eq!(popup.view().status_text, NOT_VIDEO_TEXT);
    assert!(!popup.view().button_enabled);
    assert_eq!(tab.deliveries(), 0);
}

// === Wire Format Tests ===

#[test]
fn test_wire_round_trip_through_session() {
    let mut session = new_session().unwrap();

    let reply = session.handle_json(r#"{"action":"getStatus"}"#).unwrap();
    assert_eq!(reply.as_deref(), Some(r#"{"status":"inactive"}"#));

    let reply = session.handle_json(r#"{"action":"toggleUI"}"#).unwrap();
    assert_eq!(reply.as_deref(), Some(r#"{"status":"active"}"#));

    let reply = session.handle_json(r#"{"action":"refresh"}"#).unwrap();
    assert_eq!(reply, None);
    assert_eq!(session.status(), Status::Active);
}

#[test]
fn test_tab_trait_object() {
    let mut tab = SimulatedTab::with_factory(VIDEO_URL, new_session);
    let tab: &mut dyn Tab = &mut tab;
    assert_eq!(tab.url(), VIDEO_URL);
    assert!(tab.send(dissect::messaging::Request::GetStatus).is_err());
}
