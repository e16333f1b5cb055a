//! Playback controller - core orchestration
//!
//! Composes sequencer, transport and crossfade coordinator. The only type the
//! render surface talks to, and the only writer of [`PlaybackState`].
//!
//! Everything runs on the host's event loop: user actions, buffer reports
//! ([`handle_transport_event`](PlaybackController::handle_transport_event))
//! and timer deliveries ([`on_timer`](PlaybackController::on_timer)) are
//! separate, non-overlapping calls. After each call the host drains
//! [`PlaybackEvent`]s and re-renders.

use crate::{
    crossfade::{BeginOutcome, CrossfadeCoordinator, CrossfadeSettings, TimerOutcome, TransitionState},
    error::{ErrorNotice, PlaybackError, Result},
    events::PlaybackEvent,
    scheduler::{ManualScheduler, Scheduler, TimerId},
    sequencer::Sequencer,
    transport::{DualBufferTransport, TransportEvent, TransportEventKind},
    types::{BufferRole, PlaybackConfig, PlaybackOrder, PlaybackState, PlaybackStatus},
    volume::Volume,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reverie_catalog::{Catalog, CatalogError, CatalogProvider, Track, TrackId};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Playback controller
pub struct PlaybackController<S: Scheduler = ManualScheduler> {
    // Track resolution
    sequencer: Sequencer,

    // Buffers and transitions
    transport: DualBufferTransport,
    coordinator: CrossfadeCoordinator,
    scheduler: S,

    // Session settings
    volume: Volume,
    autoplay: bool,

    // Render-facing state
    state: PlaybackState,
    status: PlaybackStatus,
    last_error: Option<ErrorNotice>,

    // Shuffle randomness
    rng: StdRng,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<S: Scheduler> PlaybackController<S> {
    /// Create a controller with an empty catalog
    pub fn new(config: PlaybackConfig, transport: DualBufferTransport, scheduler: S) -> Self {
        let volume = Volume::new(config.volume);
        let mut rng = StdRng::from_entropy();

        let mut sequencer = Sequencer::new(Arc::new(Catalog::empty()));
        if config.shuffle {
            sequencer.enable_shuffle(None, &mut rng);
        }

        let mut transport = transport;
        transport.set_nominal_volume(volume.gain());
        transport.restore_volumes();

        Self {
            sequencer,
            transport,
            coordinator: CrossfadeCoordinator::new(CrossfadeSettings::new(
                config.crossfade_enabled,
                config.crossfade_seconds,
                config.ramp_steps,
            )),
            scheduler,
            state: PlaybackState::new(volume.level()),
            volume,
            autoplay: config.autoplay,
            status: PlaybackStatus::Stopped,
            last_error: None,
            rng,
            pending_events: Vec::new(),
        }
    }

    /// Use a specific random source for shuffling
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    // ===== Catalog =====

    /// Adopt the outcome of a catalog fetch.
    ///
    /// A failure never propagates: playback stops, the catalog becomes
    /// empty and the error is surfaced as an event and in
    /// [`last_error`](Self::last_error).
    pub fn load_catalog(&mut self, result: std::result::Result<Catalog, CatalogError>) {
        match result {
            Ok(catalog) => {
                let tracks = catalog.len();
                let current = self.current_id();
                self.sequencer
                    .set_catalog(Arc::new(catalog), current, &mut self.rng);
                self.last_error = None;

                info!(tracks, "Catalog loaded");
                self.emit(PlaybackEvent::CatalogLoaded { tracks });
            }
            Err(e) => {
                self.cancel_transition();
                self.transport.clear();
                self.sequencer
                    .set_catalog(Arc::new(Catalog::empty()), None, &mut self.rng);

                self.state.current_track = None;
                self.state.position_seconds = 0.0;
                self.set_status(PlaybackStatus::Stopped);

                self.emit(PlaybackEvent::CatalogLoaded { tracks: 0 });
                self.report(&PlaybackError::from(e));
            }
        }
    }

    /// Fetch from `provider` and adopt the result
    pub async fn refresh_catalog<P: CatalogProvider + ?Sized>(&mut self, provider: &P) {
        let result = provider.fetch_tracks().await;
        self.load_catalog(result);
    }

    pub fn catalog(&self) -> &Catalog {
        self.sequencer.catalog()
    }

    /// Tracks matching `query`, in catalog order
    pub fn search(&self, query: &str) -> Vec<&Track> {
        self.sequencer.catalog().search(query)
    }

    /// Tracks in the order next/previous walk them
    pub fn display_order(&self) -> Vec<&Track> {
        self.sequencer.display_order()
    }

    // ===== Playback Control =====

    /// Play a track from the list, from the start
    pub fn select_track(&mut self, id: TrackId) -> Result<()> {
        let track = self
            .sequencer
            .catalog()
            .get(id)
            .cloned()
            .ok_or(PlaybackError::UnknownTrack(id))?;

        self.cancel_transition();
        self.sequencer.relocate(id);
        self.start_track(track, 0.0)
    }

    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.status {
            PlaybackStatus::Playing => {
                self.pause();
                Ok(())
            }
            PlaybackStatus::Paused | PlaybackStatus::Stopped => self.play(),
        }
    }

    /// Start or resume playback
    ///
    /// From `Stopped`, restarts the cued track (the one that just ended) or
    /// picks the first track in the current order.
    pub fn play(&mut self) -> Result<()> {
        match self.status {
            PlaybackStatus::Playing => Ok(()),
            PlaybackStatus::Paused => self.resume(),
            PlaybackStatus::Stopped => {
                self.cancel_transition();
                match self.state.current_track.clone() {
                    Some(track) => {
                        let offset = self.state.position_seconds;
                        self.start_track(track, offset)
                    }
                    None => match self.sequencer.next(None) {
                        Some(track) => self.start_track(track, 0.0),
                        None => Err(PlaybackError::NoTrackLoaded),
                    },
                }
            }
        }
    }

    /// Pause playback
    ///
    /// Tears down any ramp; it re-triggers on resume if still in the window.
    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.cancel_transition();
            self.transport.pause();
            self.set_status(PlaybackStatus::Paused);
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.status != PlaybackStatus::Paused {
            return Ok(());
        }

        match self.transport.play() {
            Ok(()) => {
                self.set_status(PlaybackStatus::Playing);
                Ok(())
            }
            Err(e) => Err(self.fail_source(e)),
        }
    }

    /// Skip to next track (never crossfades)
    ///
    /// Returns the track now playing, or `None` when the catalog is empty.
    pub fn next(&mut self) -> Result<Option<TrackId>> {
        self.cancel_transition();
        let current = self.current_id();
        match self.sequencer.next(current) {
            Some(track) => {
                let id = track.id;
                self.start_track(track, 0.0)?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Skip to previous track (never crossfades)
    pub fn previous(&mut self) -> Result<Option<TrackId>> {
        self.cancel_transition();
        let current = self.current_id();
        match self.sequencer.previous(current) {
            Some(track) => {
                let id = track.id;
                self.start_track(track, 0.0)?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Seek within the current track
    ///
    /// The target is clamped to `[0, duration]`; returns where playback
    /// actually landed.
    pub fn seek(&mut self, seconds: f64) -> Result<f64> {
        if self.state.current_track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        if !seconds.is_finite() {
            return Err(PlaybackError::InvalidOperation(
                "seek position must be a finite number".into(),
            ));
        }

        let duration = self.duration();
        let target = clamp_position(seconds, duration);

        self.cancel_transition();
        self.transport.seek(target);
        self.state.position_seconds = target;

        if duration - target > self.coordinator.settings().duration_seconds {
            self.coordinator.arm();
        }

        debug!(target, duration, "Seek");
        self.emit(PlaybackEvent::PositionUpdate {
            position_seconds: target,
            duration_seconds: duration,
        });

        Ok(target)
    }

    /// Seek to a fraction (0.0-1.0) of the current track
    pub fn seek_to_percent(&mut self, fraction: f64) -> Result<f64> {
        if !fraction.is_finite() {
            return Err(PlaybackError::InvalidOperation(
                "seek fraction must be a finite number".into(),
            ));
        }
        let target = fraction.clamp(0.0, 1.0) * self.duration();
        self.seek(target)
    }

    // ===== Volume =====

    /// Set master volume (0.0-1.0, clamped). NaN and infinity are ignored.
    pub fn set_volume(&mut self, volume: f32) {
        if self.volume.set_level(volume) {
            self.apply_volume();
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    pub fn mute(&mut self) {
        self.volume.mute();
        self.apply_volume();
    }

    pub fn unmute(&mut self) {
        self.volume.unmute();
        self.apply_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.apply_volume();
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    // ===== Modes =====

    /// Flip shuffle; returns whether it is now on.
    ///
    /// Turning shuffle on builds a new permutation positioned at the current
    /// track. Turning it off returns to catalog order. The current track
    /// keeps playing either way.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.cancel_transition();

        let enabled = match self.sequencer.order() {
            PlaybackOrder::Shuffled => {
                self.sequencer.disable_shuffle();
                false
            }
            PlaybackOrder::Sequential => {
                let current = self.current_id();
                self.sequencer.enable_shuffle(current, &mut self.rng);
                true
            }
        };

        self.emit(PlaybackEvent::ShuffleChanged { enabled });
        enabled
    }

    pub fn is_shuffled(&self) -> bool {
        self.sequencer.order() == PlaybackOrder::Shuffled
    }

    pub fn order(&self) -> PlaybackOrder {
        self.sequencer.order()
    }

    /// Flip autoplay; returns whether it is now on.
    ///
    /// A ramp already running is left to finish.
    pub fn toggle_autoplay(&mut self) -> bool {
        self.autoplay = !self.autoplay;
        self.emit(PlaybackEvent::AutoplayChanged {
            enabled: self.autoplay,
        });
        self.autoplay
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// Flip crossfade; returns whether it is now on. Disabling cancels a
    /// running ramp.
    pub fn toggle_crossfade(&mut self) -> bool {
        let enabled = !self.coordinator.settings().enabled;
        if !enabled {
            self.cancel_transition();
        }
        self.coordinator.set_enabled(enabled);
        self.emit_crossfade_settings();
        enabled
    }

    /// Set crossfade length (clamped to 0-10 s). Returns false for NaN or
    /// infinity, which are ignored.
    pub fn set_crossfade_duration(&mut self, seconds: f64) -> bool {
        if !self.coordinator.set_duration(seconds) {
            return false;
        }
        self.emit_crossfade_settings();
        true
    }

    pub fn crossfade_settings(&self) -> &CrossfadeSettings {
        self.coordinator.settings()
    }

    // ===== Host Callbacks =====

    /// Feed a buffer report into the state machine
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        let role = self.transport.role_of(event.slot);

        match (role, event.kind) {
            (BufferRole::Active, TransportEventKind::TimeUpdate(position)) => {
                self.on_time_update(position);
            }
            (BufferRole::Active, TransportEventKind::Ended) => self.on_ended(),
            (BufferRole::Active, TransportEventKind::PlayStateChanged(playing)) => {
                self.on_play_state_changed(playing);
            }
            (BufferRole::Active, TransportEventKind::Error(reason)) => {
                self.on_active_error(reason);
            }
            (BufferRole::Standby, TransportEventKind::CanPlay) => self.on_standby_ready(),
            (BufferRole::Standby, TransportEventKind::Error(reason)) => {
                self.on_standby_error(reason);
            }
            (role, kind) => {
                trace!(?role, ?kind, "Transport event ignored");
            }
        }
    }

    /// Deliver a fired timer
    ///
    /// Ids that do not belong to the running ramp are ignored.
    pub fn on_timer(&mut self, id: TimerId) {
        match self
            .coordinator
            .on_timer(id, &mut self.transport, &mut self.scheduler)
        {
            TimerOutcome::Ignored => {}
            TimerOutcome::Stepped { progress } => {
                self.emit(PlaybackEvent::CrossfadeProgress { progress });
            }
            TimerOutcome::Completed { from, to } => {
                self.emit(PlaybackEvent::CrossfadeProgress { progress: 1.0 });
                self.adopt_incoming(from, to);
            }
            TimerOutcome::Failed { to, reason } => {
                self.fail_source(PlaybackError::SourceFailed {
                    locator: to.source_locator,
                    reason,
                });
            }
        }
    }

    // ===== State Queries =====

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn transition(&self) -> &TransitionState {
        self.coordinator.state()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current_track.as_ref()
    }

    /// Length of the current track in seconds (0 when unknown)
    ///
    /// Falls back to what the active buffer reports when the catalog did not
    /// know the duration.
    pub fn duration(&self) -> f64 {
        match &self.state.current_track {
            Some(track) if track.duration_seconds > 0.0 => track.duration_seconds,
            Some(_) => {
                let reported = self.transport.buffer(BufferRole::Active).duration();
                if reported.is_finite() && reported > 0.0 {
                    reported
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }

    pub fn transport(&self) -> &DualBufferTransport {
        &self.transport
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Most recent recoverable error, until cleared or a catalog loads
    pub fn last_error(&self) -> Option<&ErrorNotice> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // ===== Events =====

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn current_id(&self) -> Option<TrackId> {
        self.state.current_track.as_ref().map(|t| t.id)
    }

    fn start_track(&mut self, track: Track, offset_seconds: f64) -> Result<()> {
        let previous_track_id = self.current_id();

        match self.transport.load_active(&track, offset_seconds) {
            Ok(()) => {
                debug!(track_id = %track.id, "Track started");
                let track_id = track.id;

                self.coordinator.arm();
                self.state.position_seconds = offset_seconds;
                self.state.current_track = Some(track);
                self.set_status(PlaybackStatus::Playing);
                self.emit(PlaybackEvent::TrackChanged {
                    track_id,
                    previous_track_id,
                });
                Ok(())
            }
            Err(e) => Err(self.fail_source(e)),
        }
    }

    fn on_time_update(&mut self, position: f64) {
        if self.state.current_track.is_none() || !position.is_finite() {
            return;
        }

        let duration = self.duration();
        let position = clamp_position(position, duration);
        self.state.position_seconds = position;
        self.emit(PlaybackEvent::PositionUpdate {
            position_seconds: position,
            duration_seconds: duration,
        });

        if self.status != PlaybackStatus::Playing || duration <= 0.0 {
            return;
        }

        let remaining = duration - position;
        if self.coordinator.should_trigger(self.autoplay, remaining) {
            self.begin_crossfade(position, remaining);
        }
    }

    fn begin_crossfade(&mut self, position: f64, remaining: f64) {
        let Some(from) = self.state.current_track.clone() else {
            return;
        };
        let Some(to) = self.sequencer.peek_next(Some(from.id)).cloned() else {
            return;
        };
        let (from_track_id, to_track_id) = (from.id, to.id);

        match self.coordinator.begin(
            from,
            to,
            position,
            remaining,
            &mut self.transport,
            &mut self.scheduler,
        ) {
            Ok(BeginOutcome::Started { duration_seconds }) => {
                self.emit(PlaybackEvent::CrossfadeStarted {
                    from_track_id,
                    to_track_id,
                    duration_seconds,
                });
            }
            Ok(BeginOutcome::Preloading) => {}
            Err(e) => {
                // Active keeps playing; end of track falls back to a direct load
                self.report(&e);
            }
        }
    }

    fn on_standby_ready(&mut self) {
        if !matches!(self.coordinator.state(), TransitionState::Preloading { .. }) {
            return;
        }

        let position = self.state.position_seconds;
        let remaining = (self.duration() - position).max(0.0);

        match self.coordinator.on_standby_ready(
            position,
            remaining,
            &mut self.transport,
            &mut self.scheduler,
        ) {
            Ok(Some(duration_seconds)) => {
                if let TransitionState::Crossfading(fade) = self.coordinator.state() {
                    let event = PlaybackEvent::CrossfadeStarted {
                        from_track_id: fade.from.id,
                        to_track_id: fade.to.id,
                        duration_seconds,
                    };
                    self.emit(event);
                }
            }
            Ok(None) => {}
            Err(e) => self.report(&e),
        }
    }

    fn on_ended(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }

        if matches!(self.coordinator.state(), TransitionState::Crossfading(_)) {
            // Outgoing ran out before the last step
            match self
                .coordinator
                .commit(&mut self.transport, &mut self.scheduler)
            {
                Ok((from, to)) => self.adopt_incoming(from, to),
                Err(e) => {
                    self.fail_source(e);
                }
            }
            return;
        }
        self.cancel_transition();

        if self.autoplay {
            let current = self.current_id();
            match self.sequencer.next(current) {
                Some(track) => {
                    // Failure is already reported and leaves us Stopped
                    let _ = self.start_track(track, 0.0);
                }
                None => self.stop_at_end(),
            }
        } else {
            self.stop_at_end();
        }
    }

    fn stop_at_end(&mut self) {
        self.transport.pause();
        self.transport.seek(0.0);
        self.coordinator.arm();
        self.state.position_seconds = 0.0;
        self.set_status(PlaybackStatus::Stopped);
    }

    fn on_play_state_changed(&mut self, playing: bool) {
        // Buffer-level pauses during a ramp belong to the ramp
        if self.state.current_track.is_none() || !self.coordinator.is_idle() {
            return;
        }

        match (self.status, playing) {
            (PlaybackStatus::Playing, false) => self.set_status(PlaybackStatus::Paused),
            (PlaybackStatus::Paused, true) => self.set_status(PlaybackStatus::Playing),
            _ => {}
        }
    }

    fn on_active_error(&mut self, reason: String) {
        let Some(track) = self.state.current_track.as_ref() else {
            return;
        };
        let error = PlaybackError::SourceFailed {
            locator: track.source_locator.clone(),
            reason,
        };
        self.fail_source(error);
    }

    fn on_standby_error(&mut self, reason: String) {
        let Some(incoming) = self.coordinator.state().incoming() else {
            return;
        };
        let error = PlaybackError::SourceFailed {
            locator: incoming.source_locator.clone(),
            reason,
        };

        self.cancel_transition();
        // No retry for this track; end of track loads directly
        self.coordinator.disarm();
        self.report(&error);
    }

    fn adopt_incoming(&mut self, from: Track, to: Track) {
        self.sequencer.relocate(to.id);

        let position = self.transport.buffer(BufferRole::Active).position();
        let track_id = to.id;
        self.state.position_seconds = clamp_position(position, to.duration_seconds);
        self.state.current_track = Some(to);

        self.emit(PlaybackEvent::TrackChanged {
            track_id,
            previous_track_id: Some(from.id),
        });
        self.emit(PlaybackEvent::CrossfadeCompleted { track_id });
    }

    fn cancel_transition(&mut self) {
        if self
            .coordinator
            .cancel(&mut self.transport, &mut self.scheduler)
        {
            self.emit(PlaybackEvent::CrossfadeCancelled);
        }
    }

    fn apply_volume(&mut self) {
        self.transport.set_nominal_volume(self.volume.gain());
        if matches!(self.coordinator.state(), TransitionState::Crossfading(_)) {
            self.coordinator.rescale(&mut self.transport);
        } else {
            self.transport.restore_volumes();
        }

        self.state.volume = self.volume.level();
        self.emit(PlaybackEvent::VolumeChanged {
            volume: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
    }

    /// Stop everything after a source failure and surface it
    fn fail_source(&mut self, error: PlaybackError) -> PlaybackError {
        self.cancel_transition();
        self.transport.pause_all();

        self.state.current_track = None;
        self.state.position_seconds = 0.0;
        self.set_status(PlaybackStatus::Stopped);
        self.report(&error);

        error
    }

    fn report(&mut self, error: &PlaybackError) {
        let notice = ErrorNotice::from(error);
        warn!(kind = ?notice.kind, message = %notice.message, "Playback error");
        self.emit(PlaybackEvent::from(notice.clone()));
        self.last_error = Some(notice);
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        self.state.is_playing = status == PlaybackStatus::Playing;
        if self.status != status {
            self.status = status;
            self.emit(PlaybackEvent::StateChanged { state: status });
        }
    }

    fn emit_crossfade_settings(&mut self) {
        let settings = self.coordinator.settings();
        let event = PlaybackEvent::CrossfadeSettingsChanged {
            enabled: settings.enabled,
            duration_seconds: settings.duration_seconds,
        };
        self.emit(event);
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }
}

impl<S: Scheduler> std::fmt::Debug for PlaybackController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("status", &self.status)
            .field("state", &self.state)
            .field("transition", self.coordinator.state())
            .field("order", &self.sequencer.order())
            .field("autoplay", &self.autoplay)
            .finish_non_exhaustive()
    }
}

/// Clamp into `[0, duration]`, or `[0, ∞)` when the duration is unknown
fn clamp_position(seconds: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        seconds.clamp(0.0, duration)
    } else {
        seconds.max(0.0)
    }
}
