//! Audio Engine Module
//!
//! Sample buffers, WAV file I/O and the playable media element the audio
//! graph captures.

pub mod buffer;
pub mod io;
pub mod media;

pub use buffer::{db_to_linear, linear_to_db, AudioBuffer, ChannelLayout};
pub use io::{export_audio, generate_multitone, generate_test_tone, import_audio, ExportFormat};
pub use media::{MediaElement, MediaEvent, PlaybackState};
