/// Tracks API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use reverie_catalog::{Track, TrackId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    /// Case-insensitive title/artist filter
    #[serde(default)]
    pub q: Option<String>,
}

/// GET /api/tracks
///
/// Rescans the music directory on every request, so ids follow the current
/// file listing. Filtering keeps the ids of the full listing.
pub async fn list_tracks(
    State(app_state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<Vec<Track>>> {
    let mut tracks = app_state.library.scan().await?;

    if let Some(q) = query.q.as_deref() {
        tracks.retain(|track| track.matches(q));
    }

    Ok(Json(tracks))
}

/// GET /api/tracks/:id
pub async fn get_track(
    Path(id): Path<u64>,
    State(app_state): State<AppState>,
) -> Result<Json<Track>> {
    let track_id = TrackId::new(id);
    let track = app_state
        .library
        .scan()
        .await?
        .into_iter()
        .find(|track| track.id == track_id)
        .ok_or_else(|| ServerError::NotFound(format!("Track {} not found", track_id)))?;
    Ok(Json(track))
}
