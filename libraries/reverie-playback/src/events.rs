//! Playback Events
//!
//! Event-based communication for render surface synchronization.
//! Events are queued by the controller and drained by the host after each
//! call:
//! - State changes (play/pause/stop)
//! - Track changes (immediately for manual skips, at ramp end for crossfades)
//! - Crossfade lifecycle and progress
//! - Position updates (forwarded from the active buffer)

use crate::error::{ErrorKind, ErrorNotice};
use crate::types::PlaybackStatus;
use reverie_catalog::TrackId;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Controller state changed
    StateChanged {
        /// The new state
        state: PlaybackStatus,
    },

    /// Current track changed
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Position update from the active buffer
    PositionUpdate {
        position_seconds: f64,
        duration_seconds: f64,
    },

    /// Crossfade ramp started between two tracks
    CrossfadeStarted {
        /// ID of the outgoing track
        from_track_id: TrackId,
        /// ID of the incoming track
        to_track_id: TrackId,
        /// Length of the ramp in seconds
        duration_seconds: f64,
    },

    /// Crossfade progress update (for UI animations)
    CrossfadeProgress {
        /// Progress from 0.0 (just started) to 1.0 (complete)
        progress: f64,
    },

    /// Crossfade completed and roles swapped
    CrossfadeCompleted {
        /// ID of the track now active
        track_id: TrackId,
    },

    /// In-flight crossfade torn down before completion
    CrossfadeCancelled,

    /// Volume changed
    VolumeChanged {
        /// New master level (0.0-1.0)
        volume: f32,
        /// Whether audio is muted
        is_muted: bool,
    },

    ShuffleChanged {
        enabled: bool,
    },

    AutoplayChanged {
        enabled: bool,
    },

    CrossfadeSettingsChanged {
        enabled: bool,
        duration_seconds: f64,
    },

    /// New catalog in effect
    CatalogLoaded {
        /// Number of tracks
        tracks: usize,
    },

    /// Recoverable error (engine state is already consistent)
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl From<ErrorNotice> for PlaybackEvent {
    fn from(notice: ErrorNotice) -> Self {
        PlaybackEvent::Error {
            kind: notice.kind,
            message: notice.message,
        }
    }
}

impl PlaybackEvent {
    /// Whether this event should trigger a full re-render
    pub fn changes_track_list(&self) -> bool {
        matches!(
            self,
            PlaybackEvent::CatalogLoaded { .. } | PlaybackEvent::ShuffleChanged { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_variant_tag() {
        let event = PlaybackEvent::TrackChanged {
            track_id: TrackId::new(2),
            previous_track_id: Some(TrackId::new(1)),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["TrackChanged"]["track_id"], 2);
        assert_eq!(json["TrackChanged"]["previous_track_id"], 1);
    }

    #[test]
    fn error_notice_becomes_error_event() {
        let event = PlaybackEvent::from(ErrorNotice {
            kind: ErrorKind::CatalogFetch,
            message: "offline".to_string(),
        });

        assert_eq!(
            event,
            PlaybackEvent::Error {
                kind: ErrorKind::CatalogFetch,
                message: "offline".to_string()
            }
        );
    }

    #[test]
    fn track_list_events() {
        assert!(PlaybackEvent::CatalogLoaded { tracks: 3 }.changes_track_list());
        assert!(PlaybackEvent::ShuffleChanged { enabled: true }.changes_track_list());
        assert!(!PlaybackEvent::CrossfadeCancelled.changes_track_list());
    }
}
