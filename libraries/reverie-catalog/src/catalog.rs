//! Ordered, validated track catalog.

use crate::error::{CatalogError, Result};
use crate::types::{ErrorPayload, Track, TrackId};
use serde_json::Value;
use std::collections::HashSet;

/// Immutable ordered list of tracks.
///
/// A catalog only exists in a valid state: every id is positive and unique,
/// every duration is finite and non-negative, every locator is non-empty.
/// Refetching produces a new catalog rather than mutating this one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    /// Build a catalog, validating every record.
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(tracks.len());

        for (index, track) in tracks.iter().enumerate() {
            validate_track(index, track)?;
            if !seen.insert(track.id) {
                return Err(CatalogError::DuplicateId(track.id));
            }
        }

        Ok(Self { tracks })
    }

    /// Empty catalog
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a provider response body.
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| CatalogError::InvalidPayload(format!("body is not JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Interpret an already-parsed provider response.
    ///
    /// Only a JSON array counts as a catalog. An object with an `error`
    /// string is reported as a provider error; anything else is invalid.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let mut tracks = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let track: Track = serde_json::from_value(item).map_err(|e| {
                        CatalogError::InvalidTrack {
                            index,
                            reason: e.to_string(),
                        }
                    })?;
                    tracks.push(track);
                }
                Self::new(tracks)
            }
            Value::Object(_) => match serde_json::from_value::<ErrorPayload>(value) {
                Ok(payload) => Err(CatalogError::Provider {
                    status: None,
                    message: payload.error,
                }),
                Err(_) => Err(CatalogError::InvalidPayload(
                    "expected a list of tracks, got an object".into(),
                )),
            },
            other => Err(CatalogError::InvalidPayload(format!(
                "expected a list of tracks, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks in catalog order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track ids in catalog order
    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Index of a track in catalog order
    pub fn position(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Filter by title or artist, keeping catalog order.
    ///
    /// An empty query returns every track.
    pub fn search(&self, query: &str) -> Vec<&Track> {
        self.tracks.iter().filter(|t| t.matches(query)).collect()
    }
}

fn validate_track(index: usize, track: &Track) -> Result<()> {
    let invalid = |reason: &str| CatalogError::InvalidTrack {
        index,
        reason: reason.to_string(),
    };

    if track.id.get() == 0 {
        return Err(invalid("id must be a positive integer"));
    }
    if !track.duration_seconds.is_finite() || track.duration_seconds < 0.0 {
        return Err(invalid("duration must be a finite, non-negative number"));
    }
    if track.source_locator.trim().is_empty() {
        return Err(invalid("source locator is empty"));
    }

    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
