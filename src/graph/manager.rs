//! Audio graph manager
//!
//! Builds the fixed-topology graph bound to a media element and applies
//! solo/mute as gain writes. The topology is
//!
//! ```text
//! source ─┬─ original-mix gain ───────────────┬─ output
//!         ├─ band filter ─ band gain (x5) ────┘
//!         └─ analyser (tap, not in the playback path)
//! ```
//!
//! Exactly one of two gain configurations holds at any time: the original
//! mix at unity with every band muted, or a single band at unity with the
//! original mix and every other band muted.

use log::{debug, error, info, warn};
use serde::Serialize;

use super::bands::{BandId, BANDS};
use crate::config::DissectConfig;
use crate::dsp::{Analyser, AnalyserSettings, AudioNode, BiquadFilter, GainNode};
use crate::engine::{AudioBuffer, MediaElement};
use crate::error::{DissectError, Result};
use crate::host::{AudioBackend, AudioContext, ContextState};

// ============================================================================
// Gain Snapshot
// ============================================================================

/// Comparable view of every gain in the graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GainSnapshot {
    pub original_mix: f32,
    /// Band gains in [`BandId::ALL`] order
    pub bands: [f32; 5],
}

impl GainSnapshot {
    /// Gains of a graph with nothing soloed
    pub const UNSOLOED: GainSnapshot = GainSnapshot {
        original_mix: 1.0,
        bands: [0.0; 5],
    };

    /// The soloed band, if exactly one band is audible
    pub fn soloed(&self) -> Option<BandId> {
        let mut audible = BandId::ALL
            .iter()
            .zip(self.bands.iter())
            .filter(|(_, &gain)| gain != 0.0);
        match (audible.next(), audible.next()) {
            (Some((&id, _)), None) => Some(id),
            _ => None,
        }
    }

    /// Whether the gains are in one of the two legal configurations
    pub fn is_exclusive(&self) -> bool {
        let audible = self.bands.iter().filter(|&&g| g != 0.0).count();
        match audible {
            0 => self.original_mix == 1.0,
            1 => self.original_mix == 0.0 && self.bands.iter().all(|&g| g == 0.0 || g == 1.0),
            _ => false,
        }
    }
}

// ============================================================================
// Graph
// ============================================================================

/// One filter+gain path
#[derive(Debug)]
struct BandPath {
    id: BandId,
    filter: BiquadFilter,
    gain: GainNode,
}

/// Nodes that exist while the graph is built
#[derive(Debug)]
struct LiveGraph {
    context: AudioContext,
    original_mix: GainNode,
    analyser: Analyser,
    bands: Vec<BandPath>,
}

impl LiveGraph {
    fn snapshot(&self) -> GainSnapshot {
        let mut bands = [0.0; 5];
        for path in &self.bands {
            bands[path.id.index()] = path.gain.gain();
        }
        GainSnapshot {
            original_mix: self.original_mix.gain(),
            bands,
        }
    }
}

/// Audio routing graph bound to a media element
pub struct AudioGraph {
    backend: Box<dyn AudioBackend>,
    analyser_settings: AnalyserSettings,
    live: Option<LiveGraph>,
}

impl std::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioGraph")
            .field("analyser_settings", &self.analyser_settings)
            .field("live", &self.live)
            .finish()
    }
}

impl AudioGraph {
    /// Create an unbuilt graph that will obtain contexts from `backend`
    pub fn new(backend: Box<dyn AudioBackend>, config: &DissectConfig) -> Self {
        Self {
            backend,
            analyser_settings: AnalyserSettings::from(config),
            live: None,
        }
    }

    /// Build the graph, logging and returning `false` on failure
    ///
    /// Returns `true` without rebuilding when the graph is already running.
    pub fn initialize(&mut self, media: Option<&mut MediaElement>) -> bool {
        match self.try_initialize(media) {
            Ok(()) => true,
            Err(e) => {
                error!("[GRAPH] Initialization failed: {}", e);
                false
            }
        }
    }

    /// Build the graph
    ///
    /// A previous graph whose context stopped running is disposed first,
    /// releasing its capture of the media element.
    ///
    /// # Errors
    /// - `MediaElementMissing` when no element is given
    /// - `AudioContextUnsupported` when the backend cannot build a context
    /// - `MediaAlreadyCaptured` when another context holds the element
    pub fn try_initialize(&mut self, media: Option<&mut MediaElement>) -> Result<()> {
        if self.is_running() {
            debug!("[GRAPH] Already running, skipping rebuild");
            return Ok(());
        }

        let media = media.ok_or(DissectError::MediaElementMissing)?;

        if self.live.is_some() {
            self.dispose(Some(&mut *media));
        }

        let mut context = self.backend.create_context(media.sample_rate())?;
        let analyser = Analyser::new(self.analyser_settings)?;
        media.capture(context.id())?;

        if context.state() == ContextState::Suspended {
            context.resume();
        }

        let sample_rate = context.sample_rate();
        let num_channels = media.num_channels();
        let bands = BANDS
            .iter()
            .map(|band| {
                let mut filter = band.build_filter(sample_rate);
                filter.prepare(sample_rate, num_channels);
                BandPath {
                    id: band.id,
                    filter,
                    gain: GainNode::new(0.0),
                }
            })
            .collect();

        info!(
            "[GRAPH] Initialized on {} ({} Hz, {} ch)",
            context.id(),
            sample_rate,
            num_channels
        );

        self.live = Some(LiveGraph {
            context,
            original_mix: GainNode::new(1.0),
            analyser,
            bands,
        });
        Ok(())
    }

    /// Tear the graph down, releasing the element's capture and closing the
    /// context
    pub fn dispose(&mut self, media: Option<&mut MediaElement>) {
        if let Some(mut live) = self.live.take() {
            if let Some(media) = media {
                media.release(live.context.id());
            }
            live.context.close();
            debug!("[GRAPH] Disposed {} band nodes", live.bands.len());
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.live.is_some()
    }

    /// Whether a graph exists and its context is running
    pub fn is_running(&self) -> bool {
        self.live
            .as_ref()
            .is_some_and(|live| live.context.is_running())
    }

    pub fn context(&self) -> Option<&AudioContext> {
        self.live.as_ref().map(|live| &live.context)
    }

    pub fn context_mut(&mut self) -> Option<&mut AudioContext> {
        self.live.as_mut().map(|live| &mut live.context)
    }

    pub fn analyser_mut(&mut self) -> Option<&mut Analyser> {
        self.live.as_mut().map(|live| &mut live.analyser)
    }

    /// Make one band the only audible path
    ///
    /// No-op with a warning when the graph is not built.
    pub fn solo_band(&mut self, id: BandId) {
        let Some(live) = self.live.as_mut() else {
            warn!("[GRAPH] Cannot solo {}: audio graph not initialized", id);
            return;
        };

        live.original_mix.set_gain(0.0);
        for path in live.bands.iter_mut() {
            path.gain.set_gain(if path.id == id { 1.0 } else { 0.0 });
        }
        debug!("[GRAPH] Soloed {}", id);
    }

    /// Restore the original mix and mute every band
    pub fn unsolo_all(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };

        live.original_mix.set_gain(1.0);
        for path in live.bands.iter_mut() {
            path.gain.set_gain(0.0);
        }
        debug!("[GRAPH] Unsoloed all bands");
    }

    /// Current gains, `None` before the graph is built
    pub fn snapshot(&self) -> Option<GainSnapshot> {
        self.live.as_ref().map(LiveGraph::snapshot)
    }

    pub fn soloed(&self) -> Option<BandId> {
        self.snapshot().and_then(|s| s.soloed())
    }

    /// Render one block from the source through the graph
    ///
    /// Without a graph the source plays unprocessed. A context that is not
    /// running outputs silence. Every band filter runs on every block so a
    /// solo switch takes effect with warm filter state.
    pub fn process(&mut self, input: &AudioBuffer) -> AudioBuffer {
        let Some(live) = self.live.as_mut() else {
            return input.clone();
        };

        if !live.context.is_running() {
            return AudioBuffer::silent(input.num_channels(), input.num_samples(), input.sample_rate);
        }

        live.analyser.push(input);

        let mut output = input.clone();
        live.original_mix.process(&mut output);

        for path in live.bands.iter_mut() {
            let mut band = input.clone();
            path.filter.process(&mut band);
            if !path.gain.is_muted() {
                path.gain.process(&mut band);
                output.mix_in(&band, 1.0);
            }
        }

        output
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
