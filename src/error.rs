//! Error handling for Dissect
//!
//! Nothing here is fatal to the host page. Operations that the panel treats
//! as "falsy on failure" log these errors and degrade to the inactive mode.

use thiserror::Error;

/// Result type alias for Dissect operations
pub type Result<T> = std::result::Result<T, DissectError>;

/// Main error type for Dissect operations
#[derive(Error, Debug)]
pub enum DissectError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Environment Errors
    #[error("No media element found on the page")]
    MediaElementMissing,

    #[error("Audio processing is not supported: {reason}")]
    AudioContextUnsupported { reason: String },

    #[error("Media element is already attached to another audio context")]
    MediaAlreadyCaptured,

    #[error("Audio graph is not initialized")]
    GraphNotInitialized,

    // Precondition Errors
    #[error("Unknown band: {id}")]
    UnknownBand { id: String },

    #[error("End time must be greater than start time for looping ({start:.2}s..{end:.2}s)")]
    InvalidLoopRange { start: f64, end: f64 },

    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    // Messaging Errors
    #[error("Message delivery failed: {reason}")]
    DeliveryFailed { reason: String },

    #[error("Failed to inject content script: {reason}")]
    InjectionFailed { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<hound::Error> for DissectError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => DissectError::Io(io),
            other => DissectError::InvalidAudio {
                reason: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

impl DissectError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            DissectError::FileNotFound { .. } => "FILE_NOT_FOUND",
            DissectError::InvalidAudio { .. } => "INVALID_AUDIO",
            DissectError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            DissectError::MediaElementMissing => "MEDIA_ELEMENT_MISSING",
            DissectError::AudioContextUnsupported { .. } => "AUDIO_CONTEXT_UNSUPPORTED",
            DissectError::MediaAlreadyCaptured => "MEDIA_ALREADY_CAPTURED",
            DissectError::GraphNotInitialized => "GRAPH_NOT_INITIALIZED",
            DissectError::UnknownBand { .. } => "UNKNOWN_BAND",
            DissectError::InvalidLoopRange { .. } => "INVALID_LOOP_RANGE",
            DissectError::InvalidConfig { .. } => "INVALID_CONFIG",
            DissectError::DeliveryFailed { .. } => "DELIVERY_FAILED",
            DissectError::InjectionFailed { .. } => "INJECTION_FAILED",
            DissectError::Io(_) => "IO_ERROR",
            DissectError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable without user action
    ///
    /// Delivery failures are expected while the page side is still loading
    /// and are answered with a single inject-and-retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DissectError::DeliveryFailed { .. }
                | DissectError::GraphNotInitialized
                | DissectError::InvalidLoopRange { .. }
        )
    }

    /// Whether the error should be shown to the user as a blocking notice
    /// rather than only logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, DissectError::InvalidLoopRange { .. })
    }
}
