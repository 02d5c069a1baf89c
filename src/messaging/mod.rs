//! Cross-context messaging
//!
//! The toggle/status protocol between the privileged extension side and the
//! page, the probe-then-bootstrap toggle, the toolbar activation surface and
//! the popup.

pub mod bootstrap;
pub mod popup;
pub mod protocol;
pub mod surface;
pub mod tab;

pub use bootstrap::{toggle_with_bootstrap, ToggleOutcome};
pub use popup::{Popup, PopupView};
pub use protocol::{decode_request, ContentEndpoint, Request, Response};
pub use surface::{is_video_page, ActivationSurface, PopupPage, SurfaceClick, SurfaceTask};
pub use tab::{SimulatedTab, Tab};
