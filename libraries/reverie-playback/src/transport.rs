//! Dual-buffer transport
//!
//! Two persistent buffer slots, addressed by role. Which slot is Active is a
//! single tag; swapping roles flips the tag and never moves buffer contents.

use crate::buffer::AudioBuffer;
use crate::error::{PlaybackError, Result};
use crate::types::{BufferRole, SlotId};
use reverie_catalog::Track;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Volumes closer than this are treated as equal
const VOLUME_EPSILON: f32 = 1e-4;

/// What a buffer reported to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportEventKind {
    /// Playhead moved (seconds)
    TimeUpdate(f64),

    /// Source played to its end
    Ended,

    /// Buffer started or stopped producing audio
    PlayStateChanged(bool),

    /// Enough data buffered to start without delay
    CanPlay,

    /// Source could not be played
    Error(String),
}

/// Buffer report tagged with the physical slot it came from
///
/// Slots, not roles, because a role may have swapped between the buffer
/// emitting the event and the controller receiving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportEvent {
    pub slot: SlotId,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(slot: SlotId, kind: TransportEventKind) -> Self {
        Self { slot, kind }
    }
}

/// Owner of the two playback buffers
pub struct DualBufferTransport {
    slots: [Box<dyn AudioBuffer>; 2],
    tracks: [Option<Track>; 2],
    active: SlotId,
    nominal_volume: f32,
}

impl DualBufferTransport {
    /// Slot A starts as Active
    pub fn new(a: Box<dyn AudioBuffer>, b: Box<dyn AudioBuffer>) -> Self {
        Self {
            slots: [a, b],
            tracks: [None, None],
            active: SlotId::A,
            nominal_volume: 1.0,
        }
    }

    pub fn active_slot(&self) -> SlotId {
        self.active
    }

    pub fn standby_slot(&self) -> SlotId {
        self.active.other()
    }

    pub fn slot_for(&self, role: BufferRole) -> SlotId {
        match role {
            BufferRole::Active => self.active,
            BufferRole::Standby => self.active.other(),
        }
    }

    pub fn role_of(&self, slot: SlotId) -> BufferRole {
        if slot == self.active {
            BufferRole::Active
        } else {
            BufferRole::Standby
        }
    }

    /// Buffer currently playing `role`
    pub fn buffer(&self, role: BufferRole) -> &dyn AudioBuffer {
        self.slot(self.slot_for(role))
    }

    /// Buffer in a physical slot
    pub fn slot(&self, slot: SlotId) -> &dyn AudioBuffer {
        self.slots[slot.index()].as_ref()
    }

    fn buffer_mut(&mut self, role: BufferRole) -> &mut dyn AudioBuffer {
        let slot = self.slot_for(role);
        self.slots[slot.index()].as_mut()
    }

    /// Track loaded in `role`, if any
    pub fn track(&self, role: BufferRole) -> Option<&Track> {
        self.tracks[self.slot_for(role).index()].as_ref()
    }

    /// Level a buffer returns to when no ramp is running
    pub fn nominal_volume(&self) -> f32 {
        self.nominal_volume
    }

    pub fn set_nominal_volume(&mut self, volume: f32) {
        if volume.is_finite() {
            self.nominal_volume = volume.clamp(0.0, 1.0);
        }
    }

    /// Load `track` into the Active buffer and start it.
    ///
    /// Starts at `offset_seconds` (0 for a fresh start) at nominal volume.
    /// On failure the Active slot is left empty and paused.
    pub fn load_active(&mut self, track: &Track, offset_seconds: f64) -> Result<()> {
        let slot = self.active;
        let nominal = self.nominal_volume;

        debug!(track_id = %track.id, ?slot, offset_seconds, "Loading active buffer");

        let started = {
            let buffer = self.buffer_mut(BufferRole::Active);
            buffer.pause();
            buffer.load(&track.source_locator).and_then(|()| {
                if offset_seconds > 0.0 {
                    buffer.seek(offset_seconds);
                }
                buffer.set_volume(nominal);
                buffer.play()
            })
        };

        match started {
            Ok(()) => {
                self.tracks[slot.index()] = Some(track.clone());
                Ok(())
            }
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Active buffer failed to start");
                self.buffer_mut(BufferRole::Active).pause();
                self.tracks[slot.index()] = None;
                Err(source_failed(track, e))
            }
        }
    }

    /// Preload `track` into the Standby buffer without starting it
    pub fn load_standby(&mut self, track: &Track) -> Result<()> {
        let slot = self.standby_slot();

        debug!(track_id = %track.id, ?slot, "Preloading standby buffer");

        let loaded = {
            let buffer = self.buffer_mut(BufferRole::Standby);
            buffer.pause();
            buffer.load(&track.source_locator)
        };

        match loaded {
            Ok(()) => {
                self.tracks[slot.index()] = Some(track.clone());
                Ok(())
            }
            Err(e) => {
                self.tracks[slot.index()] = None;
                Err(source_failed(track, e))
            }
        }
    }

    /// Resume the Active buffer
    pub fn play(&mut self) -> Result<()> {
        self.play_role(BufferRole::Active)
    }

    pub fn play_role(&mut self, role: BufferRole) -> Result<()> {
        if self.track(role).is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.buffer_mut(role).play()
    }

    /// Pause the Active buffer
    pub fn pause(&mut self) {
        self.pause_role(BufferRole::Active);
    }

    pub fn pause_role(&mut self, role: BufferRole) {
        self.buffer_mut(role).pause();
    }

    /// Pause both buffers
    pub fn pause_all(&mut self) {
        for buffer in &mut self.slots {
            buffer.pause();
        }
    }

    /// Seek the Active buffer
    pub fn seek(&mut self, seconds: f64) {
        self.buffer_mut(BufferRole::Active).seek(seconds.max(0.0));
    }

    /// Set one buffer's level, clamped to `[0, 1]`. Non-finite values are ignored.
    pub fn set_volume(&mut self, role: BufferRole, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.buffer_mut(role).set_volume(volume.clamp(0.0, 1.0));
    }

    /// Put both buffers back at nominal volume
    pub fn restore_volumes(&mut self) {
        let nominal = self.nominal_volume;
        self.set_volume(BufferRole::Active, nominal);
        self.set_volume(BufferRole::Standby, nominal);
    }

    /// Forget everything loaded in either slot
    pub fn clear(&mut self) {
        self.pause_all();
        self.tracks = [None, None];
    }

    /// Exchange Active and Standby.
    ///
    /// Refused unless the outgoing buffer is paused at nominal volume and the
    /// incoming buffer is playing at nominal volume.
    pub fn swap_roles(&mut self) -> Result<()> {
        let nominal = self.nominal_volume;
        let outgoing = self.buffer(BufferRole::Active);
        let incoming = self.buffer(BufferRole::Standby);

        if outgoing.is_playing() {
            return Err(PlaybackError::InvalidOperation(
                "outgoing buffer is still playing".into(),
            ));
        }
        if (outgoing.volume() - nominal).abs() > VOLUME_EPSILON {
            return Err(PlaybackError::InvalidOperation(
                "outgoing buffer is not at nominal volume".into(),
            ));
        }
        if !incoming.is_playing() {
            return Err(PlaybackError::InvalidOperation(
                "incoming buffer is not playing".into(),
            ));
        }
        if (incoming.volume() - nominal).abs() > VOLUME_EPSILON {
            return Err(PlaybackError::InvalidOperation(
                "incoming buffer is not at nominal volume".into(),
            ));
        }

        self.active = self.active.other();
        debug!(active = ?self.active, "Swapped buffer roles");
        Ok(())
    }
}

impl std::fmt::Debug for DualBufferTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualBufferTransport")
            .field("active", &self.active)
            .field("tracks", &self.tracks)
            .field("nominal_volume", &self.nominal_volume)
            .finish_non_exhaustive()
    }
}

fn source_failed(track: &Track, error: PlaybackError) -> PlaybackError {
    match error {
        PlaybackError::SourceFailed { .. } => error,
        other => PlaybackError::SourceFailed {
            locator: track.source_locator.clone(),
            reason: other.to_string(),
        },
    }
}
