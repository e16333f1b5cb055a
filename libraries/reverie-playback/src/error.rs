//! Error types for playback management

use reverie_catalog::{CatalogError, TrackId};
use thiserror::Error;

/// Playback errors
///
/// None of these are fatal: the controller always leaves its state
/// consistent before returning one.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Track id is not part of the current catalog
    #[error("Unknown track: {0}")]
    UnknownTrack(TrackId),

    /// A buffer could not start playing a source
    #[error("Cannot play {locator}: {reason}")]
    SourceFailed { locator: String, reason: String },

    /// Catalog could not be fetched or was malformed
    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    /// A crossfade is already in flight
    #[error("A transition is already in progress")]
    TransitionInProgress,

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl PlaybackError {
    /// Error category reported to the render surface
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlaybackError::Catalog(_) => ErrorKind::CatalogFetch,
            PlaybackError::SourceFailed { .. } => ErrorKind::PlaybackSource,
            _ => ErrorKind::Playback,
        }
    }
}

/// Broad error category for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Catalog fetch or parse failed; the catalog is empty
    CatalogFetch,
    /// A source failed to start; playback is stopped
    PlaybackSource,
    /// Any other rejected request
    Playback,
}

/// Last failure as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PlaybackError> for ErrorNotice {
    fn from(error: &PlaybackError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
