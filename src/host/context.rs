//! Audio processing context
//!
//! The host resource an audio graph lives in. Creating one can fail when the
//! host has no audio processing support, which the graph reports as an
//! environment error instead of propagating.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::error::{DissectError, Result};

/// Lowest sample rate a context accepts
pub const MIN_CONTEXT_SAMPLE_RATE: u32 = 3000;

/// Highest sample rate a context accepts
pub const MAX_CONTEXT_SAMPLE_RATE: u32 = 768_000;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an audio context, used to track media element capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(id: u64) -> Self {
        ContextId(id)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Lifecycle state of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// An audio processing context
#[derive(Debug)]
pub struct AudioContext {
    id: ContextId,
    sample_rate: u32,
    state: ContextState,
}

impl AudioContext {
    /// Create a suspended context at the given sample rate
    ///
    /// # Errors
    /// `AudioContextUnsupported` for sample rates outside the host's range.
    pub fn new(sample_rate: u32) -> Result<Self> {
        if !(MIN_CONTEXT_SAMPLE_RATE..=MAX_CONTEXT_SAMPLE_RATE).contains(&sample_rate) {
            return Err(DissectError::AudioContextUnsupported {
                reason: format!(
                    "sample rate {} Hz outside {}..={} Hz",
                    sample_rate, MIN_CONTEXT_SAMPLE_RATE, MAX_CONTEXT_SAMPLE_RATE
                ),
            });
        }

        let context = Self {
            id: ContextId::next(),
            sample_rate,
            state: ContextState::Suspended,
        };
        debug!("[CONTEXT] Created {} at {} Hz", context.id, sample_rate);
        Ok(context)
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ContextState::Running
    }

    /// Resume a suspended context; a closed context stays closed
    pub fn resume(&mut self) {
        if self.state == ContextState::Suspended {
            self.state = ContextState::Running;
            debug!("[CONTEXT] {} running", self.id);
        }
    }

    pub fn suspend(&mut self) {
        if self.state == ContextState::Running {
            self.state = ContextState::Suspended;
            debug!("[CONTEXT] {} suspended", self.id);
        }
    }

    pub fn close(&mut self) {
        self.state = ContextState::Closed;
        debug!("[CONTEXT] {} closed", self.id);
    }
}

/// Factory for audio contexts
///
/// The seam where a host without audio processing support is modelled.
pub trait AudioBackend {
    fn create_context(&self, sample_rate: u32) -> Result<AudioContext>;
}

/// Backend that builds native in-process contexts
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl AudioBackend for NativeBackend {
    fn create_context(&self, sample_rate: u32) -> Result<AudioContext> {
        AudioContext::new(sample_rate)
    }
}

/// Backend for hosts with no audio processing API
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedBackend;

impl AudioBackend for UnsupportedBackend {
    fn create_context(&self, _sample_rate: u32) -> Result<AudioContext> {
        Err(DissectError::AudioContextUnsupported {
            reason: "no audio processing API available".to_string(),
        })
    }
}
