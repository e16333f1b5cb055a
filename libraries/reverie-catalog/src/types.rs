//! Wire types shared by catalog providers and the playback engine.

use crate::error::{CatalogError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positive track identifier, unique within one catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(u64);

impl TrackId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TrackId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A playable track as delivered by the catalog provider.
///
/// Immutable once fetched. The engine only ever clones and compares these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,

    pub title: String,

    pub artist: String,

    /// Length in seconds (0 when the provider could not determine it)
    #[serde(alias = "duration")]
    pub duration_seconds: f64,

    /// Where the audio lives, e.g. `/music/song.mp3`
    #[serde(alias = "url")]
    pub source_locator: String,

    /// Base64 image, usually a `data:` URL
    #[serde(default)]
    pub cover_art: Option<String>,
}

/// Decoded cover art image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Track {
    /// Decode the embedded cover art, if any.
    ///
    /// Accepts `data:<mime>;base64,<payload>` or a bare base64 payload.
    pub fn cover_art(&self) -> Result<Option<CoverArt>> {
        let Some(raw) = self.cover_art.as_deref() else {
            return Ok(None);
        };

        let (mime, payload) = match raw.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    CatalogError::InvalidCoverArt("data URL without payload".into())
                })?;
                let mime = header.strip_suffix(";base64").ok_or_else(|| {
                    CatalogError::InvalidCoverArt("data URL is not base64 encoded".into())
                })?;
                (mime.to_string(), payload)
            }
            None => ("application/octet-stream".to_string(), raw),
        };

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| CatalogError::InvalidCoverArt(e.to_string()))?;

        Ok(Some(CoverArt { mime, bytes }))
    }

    /// Case-insensitive match on title or artist.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.artist.to_lowercase().contains(&query)
    }
}

/// Error body returned by a provider, e.g. `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with_art(art: Option<&str>) -> Track {
        Track {
            id: TrackId::new(1),
            title: "Night Drive".to_string(),
            artist: "Static Bloom".to_string(),
            duration_seconds: 200.0,
            source_locator: "/music/night-drive.mp3".to_string(),
            cover_art: art.map(String::from),
        }
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(track_with_art(None)).unwrap();
        assert_eq!(json["durationSeconds"], 200.0);
        assert_eq!(json["sourceLocator"], "/music/night-drive.mp3");
        assert!(json["coverArt"].is_null());
    }

    #[test]
    fn accepts_legacy_field_names() {
        let track: Track = serde_json::from_str(
            r#"{"id": 3, "title": "A", "artist": "B", "duration": 95, "url": "/music/a.mp3"}"#,
        )
        .unwrap();

        assert_eq!(track.id, TrackId::new(3));
        assert_eq!(track.duration_seconds, 95.0);
        assert_eq!(track.source_locator, "/music/a.mp3");
        assert_eq!(track.cover_art, None);
    }

    #[test]
    fn decodes_data_url_cover_art() {
        let track = track_with_art(Some("data:image/png;base64,iVBORw=="));
        let art = track.cover_art().unwrap().unwrap();
        assert_eq!(art.mime, "image/png");
        assert_eq!(art.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn decodes_bare_base64_cover_art() {
        let track = track_with_art(Some("AQID"));
        let art = track.cover_art().unwrap().unwrap();
        assert_eq!(art.mime, "application/octet-stream");
        assert_eq!(art.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_broken_cover_art() {
        assert!(track_with_art(Some("data:image/png;base64")).cover_art().is_err());
        assert!(track_with_art(Some("data:image/png,plain")).cover_art().is_err());
        assert!(track_with_art(Some("!!not base64!!")).cover_art().is_err());
    }

    #[test]
    fn missing_cover_art_is_none() {
        assert!(track_with_art(None).cover_art().unwrap().is_none());
    }

    #[test]
    fn matches_title_or_artist_case_insensitive() {
        let track = track_with_art(None);
        assert!(track.matches("night"));
        assert!(track.matches("BLOOM"));
        assert!(track.matches("  "));
        assert!(!track.matches("daylight"));
    }
}
