//! Host environment model
//!
//! The collaborators a page provides to the panel: audio contexts, the
//! frame/timer scheduler and a 2D canvas.

pub mod canvas;
pub mod context;
pub mod scheduler;

pub use canvas::{hsl_to_rgb, Canvas2d, RasterCanvas, Rgb, BACKGROUND};
pub use context::{AudioBackend, AudioContext, ContextId, ContextState, NativeBackend, UnsupportedBackend};
pub use scheduler::{Fired, Scheduler, TaskHandle, TaskId};
