/// Music directory scanner
///
/// Turns the files of one directory into catalog records. Tags are read with
/// lofty; a missing title falls back to the file stem and a missing artist to
/// `Unknown Artist`. Only files lofty cannot read at all get their artist and
/// title from an `"Artist - Title"` file name.
use crate::config::LibrarySettings;
use crate::error::{Result, ServerError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lofty::{AudioFile, ItemKey, Picture, TaggedFileExt};
use reverie_catalog::{Track, TrackId};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File extensions served as tracks (matched case-insensitively)
pub const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "flac", "wav", "aac"];

const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Scans the configured music directory
#[derive(Debug, Clone)]
pub struct LibraryScanner {
    settings: LibrarySettings,
}

impl LibraryScanner {
    pub fn new(settings: LibrarySettings) -> Self {
        Self { settings }
    }

    pub fn music_dir(&self) -> &Path {
        &self.settings.music_dir
    }

    /// Build the catalog, off the async runtime
    pub async fn scan(&self) -> Result<Vec<Track>> {
        let scanner = self.clone();
        tokio::task::spawn_blocking(move || scanner.scan_blocking())
            .await
            .map_err(|e| ServerError::Internal(format!("Scan task failed: {}", e)))?
    }

    /// Build the catalog on the current thread
    ///
    /// Files are sorted by name and numbered from 1 in that order.
    pub fn scan_blocking(&self) -> Result<Vec<Track>> {
        let dir = &self.settings.music_dir;
        let library_error = |source| ServerError::Library {
            path: dir.display().to_string(),
            source,
        };

        let mut files: Vec<(String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(library_error)? {
            let entry = entry.map_err(library_error)?;
            let Ok(name) = entry.file_name().into_string() else {
                warn!(path = ?entry.path(), "Skipping non UTF-8 file name");
                continue;
            };
            if is_audio_file(&name) {
                files.push((name, entry.path()));
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let tracks: Vec<Track> = files
            .iter()
            .enumerate()
            .map(|(index, (name, path))| self.track_for(index as u64 + 1, name, path))
            .collect();

        info!(dir = %dir.display(), tracks = tracks.len(), "Music directory scanned");
        Ok(tracks)
    }

    fn track_for(&self, id: u64, file_name: &str, path: &Path) -> Track {
        let (title, artist, duration_seconds, cover_art) = match read_tags(path) {
            Ok(tags) => (
                tags.title.unwrap_or_else(|| file_stem(file_name).to_string()),
                tags.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                tags.duration_seconds,
                tags.cover_art,
            ),
            Err(e) => {
                warn!(file = file_name, error = %e, "Falling back to file name metadata");
                let (artist, title) = split_file_name(file_name);
                (title, artist, 0.0, None)
            }
        };

        Track {
            id: TrackId::new(id),
            title,
            artist,
            duration_seconds,
            source_locator: self.settings.locator_for(file_name),
            cover_art,
        }
    }
}

/// Whatever a file's tags and properties yielded
#[derive(Debug, Default)]
struct FileTags {
    title: Option<String>,
    artist: Option<String>,
    duration_seconds: f64,
    cover_art: Option<String>,
}

fn read_tags(path: &Path) -> lofty::Result<FileTags> {
    let tagged_file = lofty::read_from_path(path)?;

    // Whole seconds, like the durations clients display
    let duration_seconds = tagged_file.properties().duration().as_secs_f64().round();

    let mut tags = FileTags {
        duration_seconds,
        ..FileTags::default()
    };

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.tags().first());
    if let Some(tag) = tag {
        tags.title = non_empty(tag.get_string(&ItemKey::TrackTitle));
        tags.artist = non_empty(tag.get_string(&ItemKey::TrackArtist));
        tags.cover_art = tag.pictures().first().map(picture_data_url);
    }

    debug!(path = %path.display(), ?tags.title, duration_seconds, "Read tags");
    Ok(tags)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Whether `file_name` has one of the served extensions
pub fn is_audio_file(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Artist and title from an `"Artist - Title.ext"` file name
///
/// Names without the separator get the unknown artist and the bare stem.
pub fn split_file_name(file_name: &str) -> (String, String) {
    let stem = file_stem(file_name);
    match stem.split_once(" - ") {
        Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
            (artist.trim().to_string(), title.trim().to_string())
        }
        _ => (UNKNOWN_ARTIST.to_string(), stem.trim().to_string()),
    }
}

fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Embed an embedded picture as a `data:` URL
///
/// Pictures without a MIME type are labelled `application/octet-stream`.
pub fn picture_data_url(picture: &Picture) -> String {
    let mime = picture
        .mime_type()
        .map(|m| m.as_str())
        .unwrap_or("application/octet-stream");
    format!("data:{};base64,{}", mime, STANDARD.encode(picture.data()))
}
