//! Shared helpers for playback integration tests

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use reverie_catalog::{Catalog, Track, TrackId};
use reverie_playback::{
    AudioBuffer, BufferRole, DualBufferTransport, ManualScheduler, PlaybackConfig,
    PlaybackController, PlaybackError, PlaybackEvent, Result, TransportEvent, TransportEventKind,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Inspectable state behind a [`MockBuffer`]
#[derive(Debug, Default)]
pub struct MockState {
    pub locator: Option<String>,
    pub volume: f32,
    pub position: f64,
    pub playing: bool,
    pub ready: bool,
    pub loads: usize,
}

/// Mock audio buffer whose state the test keeps a handle to
pub struct MockBuffer {
    state: Rc<RefCell<MockState>>,
    locator: Option<String>,
    failing: Vec<String>,
    defer_ready: bool,
}

impl MockBuffer {
    pub fn new() -> (Self, Rc<RefCell<MockState>>) {
        let state = Rc::new(RefCell::new(MockState {
            volume: 1.0,
            ..MockState::default()
        }));
        (
            Self {
                state: state.clone(),
                locator: None,
                failing: Vec::new(),
                defer_ready: false,
            },
            state,
        )
    }

    /// Reject these locators on load
    pub fn failing(mut self, locators: &[&str]) -> Self {
        self.failing = locators.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Stay unready after load until the test flips `ready`
    pub fn deferred(mut self) -> Self {
        self.defer_ready = true;
        self
    }
}

impl AudioBuffer for MockBuffer {
    fn load(&mut self, locator: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.position = 0.0;
        state.loads += 1;

        if self.failing.iter().any(|l| l == locator) {
            self.locator = None;
            state.locator = None;
            state.ready = false;
            return Err(PlaybackError::SourceFailed {
                locator: locator.to_string(),
                reason: "decoder rejected source".to_string(),
            });
        }

        self.locator = Some(locator.to_string());
        state.locator = Some(locator.to_string());
        state.ready = !self.defer_ready;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.locator.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        self.state.borrow_mut().position = seconds;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    fn position(&self) -> f64 {
        self.state.borrow().position
    }

    fn duration(&self) -> f64 {
        0.0
    }

    fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }
}

pub fn create_test_track(id: u64, title: &str, duration: f64) -> Track {
    Track {
        id: TrackId::new(id),
        title: title.to_string(),
        artist: "Test Artist".to_string(),
        duration_seconds: duration,
        source_locator: format!("/music/{}.mp3", title.to_lowercase()),
        cover_art: None,
    }
}

/// Three tracks A, B, C of 180, 200 and 220 seconds
pub fn abc_catalog() -> Catalog {
    Catalog::new(vec![
        create_test_track(1, "A", 180.0),
        create_test_track(2, "B", 200.0),
        create_test_track(3, "C", 220.0),
    ])
    .expect("valid catalog")
}

/// Controller over two mock buffers plus handles to both slots
pub struct Harness {
    pub controller: PlaybackController<ManualScheduler>,
    pub slot_a: Rc<RefCell<MockState>>,
    pub slot_b: Rc<RefCell<MockState>>,
}

impl Harness {
    pub fn new(config: PlaybackConfig, catalog: Catalog) -> Self {
        let (a, slot_a) = MockBuffer::new();
        let (b, slot_b) = MockBuffer::new();
        Self::with_buffers(config, catalog, a, b, slot_a, slot_b)
    }

    pub fn with_buffers(
        config: PlaybackConfig,
        catalog: Catalog,
        a: MockBuffer,
        b: MockBuffer,
        slot_a: Rc<RefCell<MockState>>,
        slot_b: Rc<RefCell<MockState>>,
    ) -> Self {
        let transport = DualBufferTransport::new(Box::new(a), Box::new(b));
        let mut controller = PlaybackController::new(config, transport, ManualScheduler::new())
            .with_rng(StdRng::seed_from_u64(2024));
        controller.load_catalog(Ok(catalog));
        controller.drain_events();

        Self {
            controller,
            slot_a,
            slot_b,
        }
    }

    /// State of the buffer currently in `role`
    pub fn buffer(&self, role: BufferRole) -> Rc<RefCell<MockState>> {
        let slot = self.controller.transport().slot_for(role);
        match slot {
            reverie_playback::SlotId::A => self.slot_a.clone(),
            reverie_playback::SlotId::B => self.slot_b.clone(),
        }
    }

    pub fn volumes(&self) -> (f32, f32) {
        (
            self.buffer(BufferRole::Active).borrow().volume,
            self.buffer(BufferRole::Standby).borrow().volume,
        )
    }

    /// Report a playhead position from the active buffer
    pub fn time_update(&mut self, seconds: f64) {
        self.buffer(BufferRole::Active).borrow_mut().position = seconds;
        self.active_event(TransportEventKind::TimeUpdate(seconds));
    }

    pub fn ended(&mut self) {
        self.buffer(BufferRole::Active).borrow_mut().playing = false;
        self.active_event(TransportEventKind::Ended);
    }

    pub fn active_event(&mut self, kind: TransportEventKind) {
        let slot = self.controller.transport().active_slot();
        self.controller
            .handle_transport_event(TransportEvent::new(slot, kind));
    }

    pub fn standby_event(&mut self, kind: TransportEventKind) {
        let slot = self.controller.transport().standby_slot();
        self.controller
            .handle_transport_event(TransportEvent::new(slot, kind));
    }

    /// Fire pending timers until none are left; returns how many fired
    pub fn run_timers(&mut self) -> usize {
        let mut fired = 0;
        while let Some(id) = self.controller.scheduler_mut().fire_next() {
            self.controller.on_timer(id);
            fired += 1;
        }
        fired
    }

    /// Fire exactly one pending timer
    pub fn fire_one(&mut self) -> bool {
        match self.controller.scheduler_mut().fire_next() {
            Some(id) => {
                self.controller.on_timer(id);
                true
            }
            None => false,
        }
    }

    pub fn events(&mut self) -> Vec<PlaybackEvent> {
        self.controller.drain_events()
    }
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
