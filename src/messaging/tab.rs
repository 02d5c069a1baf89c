//! Browser tab seam
//!
//! What the privileged side can do with a tab: read its URL, message its
//! content endpoint, and inject the content endpoint and its stylesheet.
//! [`SimulatedTab`] hosts a [`DissectSession`] behind that interface and
//! routes every message through the JSON wire format.

use log::{debug, info};

use super::protocol::{ContentEndpoint, Request, Response};
use crate::error::{DissectError, Result};
use crate::session::DissectSession;

/// A browser tab as seen from the privileged side
pub trait Tab {
    fn url(&self) -> &str;

    /// Deliver a request to the content endpoint
    ///
    /// # Errors
    /// `DeliveryFailed` when no endpoint is listening.
    fn send(&mut self, request: Request) -> Result<Response>;

    /// Inject the content endpoint
    fn inject_content(&mut self) -> Result<()>;

    /// Inject the panel stylesheet
    fn insert_css(&mut self) -> Result<()>;
}

type SessionFactory = Box<dyn FnMut() -> Result<DissectSession>>;

/// An in-process tab whose content endpoint is a [`DissectSession`]
pub struct SimulatedTab {
    url: String,
    session: Option<DissectSession>,
    factory: Option<SessionFactory>,
    css_inserted: bool,
    injections: usize,
    deliveries: usize,
}

impl std::fmt::Debug for SimulatedTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedTab")
            .field("url", &self.url)
            .field("has_session", &self.session.is_some())
            .field("injections", &self.injections)
            .finish()
    }
}

impl SimulatedTab {
    /// A tab with nothing injected; injection fails until a factory is set
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session: None,
            factory: None,
            css_inserted: false,
            injections: 0,
            deliveries: 0,
        }
    }

    /// A tab whose injection builds sessions with `factory`
    pub fn with_factory<F>(url: impl Into<String>, factory: F) -> Self
    where
        F: FnMut() -> Result<DissectSession> + 'static,
    {
        let mut tab = Self::new(url);
        tab.factory = Some(Box::new(factory));
        tab
    }

    /// A tab whose content endpoint is already running
    pub fn with_session(url: impl Into<String>, session: DissectSession) -> Self {
        let mut tab = Self::new(url);
        tab.session = Some(session);
        tab
    }

    pub fn navigate(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.session = None;
        self.css_inserted = false;
        debug!("[TAB] Navigated to {}", self.url);
    }

    pub fn session(&self) -> Option<&DissectSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut DissectSession> {
        self.session.as_mut()
    }

    pub fn css_inserted(&self) -> bool {
        self.css_inserted
    }

    /// Successful content injections so far
    pub fn injections(&self) -> usize {
        self.injections
    }

    /// Requests that reached an endpoint
    pub fn deliveries(&self) -> usize {
        self.deliveries
    }
}

impl Tab for SimulatedTab {
    fn url(&self) -> &str {
        &self.url
    }

    fn send(&mut self, request: Request) -> Result<Response> {
        let session = self.session.as_mut().ok_or_else(|| DissectError::DeliveryFailed {
            reason: "Could not establish connection. Receiving end does not exist.".to_string(),
        })?;

        let json = serde_json::to_string(&request)?;
        self.deliveries += 1;
        match session.handle_json(&json)? {
            Some(reply) => Ok(serde_json::from_str(&reply)?),
            None => Ok(Response::default()),
        }
    }

    fn inject_content(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("[TAB] Content endpoint already present");
            self.injections += 1;
            return Ok(());
        }

        let factory = self.factory.as_mut().ok_or_else(|| DissectError::InjectionFailed {
            reason: format!("cannot access contents of {}", self.url),
        })?;
        let session = factory().map_err(|e| DissectError::InjectionFailed {
            reason: e.to_string(),
        })?;

        self.session = Some(session);
        self.injections += 1;
        info!("[TAB] Content endpoint injected into {}", self.url);
        Ok(())
    }

    fn insert_css(&mut self) -> Result<()> {
        if self.factory.is_none() && self.session.is_none() {
            return Err(DissectError::InjectionFailed {
                reason: format!("cannot access contents of {}", self.url),
            });
        }
        self.css_inserted = true;
        Ok(())
    }
}
