//! Core types for playback management

use reverie_catalog::Track;
use serde::{Deserialize, Serialize};

/// Longest accepted crossfade, in seconds
pub const MAX_CROSSFADE_SECONDS: f64 = 10.0;

/// Controller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Nothing playing (no track, or the last track ended without autoplay)
    Stopped,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// What the render surface reads after every change.
///
/// Owned and mutated only by the playback controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_track: Option<Track>,

    pub is_playing: bool,

    /// Always within `[0, duration]` of the current track
    pub position_seconds: f64,

    /// Master volume in `[0, 1]`
    pub volume: f32,
}

impl PlaybackState {
    pub fn new(volume: f32) -> Self {
        Self {
            current_track: None,
            is_playing: false,
            position_seconds: 0.0,
            volume,
        }
    }
}

/// Ordering used to resolve next/previous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackOrder {
    /// Natural catalog order
    Sequential,

    /// Materialized random permutation
    Shuffled,
}

/// Which role a buffer slot currently plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferRole {
    /// Audible now
    Active,

    /// Preloaded or fading in
    Standby,
}

/// One of the two physical buffer slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    pub fn other(self) -> Self {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }
}

/// Session configuration for the playback controller
///
/// In-memory only; nothing here is persisted or read from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial master volume (0.0-1.0, default: 1.0)
    pub volume: f32,

    /// Start with shuffle enabled (default: false)
    pub shuffle: bool,

    /// Advance automatically at end of track (default: false)
    pub autoplay: bool,

    /// Crossfade between consecutive tracks (default: true)
    pub crossfade_enabled: bool,

    /// Crossfade length in seconds (0-10, default: 3)
    pub crossfade_seconds: f64,

    /// Number of volume steps per crossfade ramp (default: 20)
    pub ramp_steps: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            shuffle: false,
            autoplay: false,
            crossfade_enabled: true,
            crossfade_seconds: 3.0,
            ramp_steps: 20,
        }
    }
}
