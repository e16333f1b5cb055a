//! Error types for catalog loading.

use crate::types::TrackId;
use thiserror::Error;

/// Errors that can occur while fetching or validating a track catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with an error payload
    #[error("Catalog provider error: {message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },

    /// Body was not a list of track records
    #[error("Invalid catalog payload: {0}")]
    InvalidPayload(String),

    /// A record in the list failed validation
    #[error("Invalid track at index {index}: {reason}")]
    InvalidTrack { index: usize, reason: String },

    /// Two records share the same id
    #[error("Duplicate track id: {0}")]
    DuplicateId(TrackId),

    /// Invalid provider URL
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    /// Cover art could not be decoded
    #[error("Invalid cover art: {0}")]
    InvalidCoverArt(String),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
