//! Reverie - Playback Engine
//!
//! Host-driven playback for Reverie: what is playing, what plays next, and
//! how one track crossfades into the following one.
//!
//! This crate provides:
//! - Sequential and shuffled next/previous over a track catalog
//! - Two buffer slots (active + standby) with role swapping
//! - Stepped linear crossfades near the end of a track
//! - Master volume with mute
//! - Seek (time and percentage), autoplay
//! - Events for render surface synchronization
//!
//! # Architecture
//!
//! `reverie-playback` never touches audio hardware or the clock:
//! - Buffers are provided via the [`AudioBuffer`] trait
//! - Timers are provided via the [`Scheduler`] trait
//! - The host forwards buffer reports ([`TransportEvent`]) and fired
//!   timers back into the [`PlaybackController`]
//!
//! Every call is synchronous and runs to completion, so the controller needs
//! no locks. With the `tokio-driver` feature, `TokioScheduler` provides real
//! timers on a tokio runtime.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use reverie_catalog::Catalog;
//! use reverie_playback::{
//!     AudioBuffer, DualBufferTransport, ManualScheduler, PlaybackConfig, PlaybackController,
//!     PlaybackStatus, Result,
//! };
//!
//! // Implement AudioBuffer for your platform
//! #[derive(Default)]
//! struct SilentBuffer {
//!     locator: Option<String>,
//!     volume: f32,
//!     position: f64,
//!     playing: bool,
//! }
//!
//! impl AudioBuffer for SilentBuffer {
//!     fn load(&mut self, locator: &str) -> Result<()> {
//!         self.locator = Some(locator.to_string());
//!         self.position = 0.0;
//!         Ok(())
//!     }
//!     fn play(&mut self) -> Result<()> {
//!         self.playing = true;
//!         Ok(())
//!     }
//!     fn pause(&mut self) {
//!         self.playing = false;
//!     }
//!     fn seek(&mut self, seconds: f64) {
//!         self.position = seconds;
//!     }
//!     fn set_volume(&mut self, volume: f32) {
//!         self.volume = volume;
//!     }
//!     fn volume(&self) -> f32 {
//!         self.volume
//!     }
//!     fn position(&self) -> f64 {
//!         self.position
//!     }
//!     fn duration(&self) -> f64 {
//!         0.0
//!     }
//!     fn is_playing(&self) -> bool {
//!         self.playing
//!     }
//!     fn is_ready(&self) -> bool {
//!         self.locator.is_some()
//!     }
//!     fn locator(&self) -> Option<&str> {
//!         self.locator.as_deref()
//!     }
//! }
//!
//! let transport = DualBufferTransport::new(
//!     Box::new(SilentBuffer::default()),
//!     Box::new(SilentBuffer::default()),
//! );
//! let mut controller =
//!     PlaybackController::new(PlaybackConfig::default(), transport, ManualScheduler::new());
//!
//! controller.load_catalog(Catalog::from_json(
//!     r#"[{"id": 1, "title": "Dawn", "artist": "Lumen", "durationSeconds": 180, "sourceLocator": "/music/dawn.mp3"}]"#,
//! ));
//!
//! controller.play().unwrap();
//! assert_eq!(controller.status(), PlaybackStatus::Playing);
//!
//! controller.set_volume(0.5);
//! controller.seek(90.0).unwrap();
//!
//! for event in controller.drain_events() {
//!     println!("{:?}", event);
//! }
//! ```

mod buffer;
mod controller;
pub mod crossfade;
mod error;
mod events;
mod scheduler;
mod sequencer;
mod shuffle;
mod transport;
pub mod types;
mod volume;

// Public exports
pub use buffer::AudioBuffer;
pub use controller::PlaybackController;
pub use crossfade::{CrossfadeCoordinator, CrossfadeSettings, TransitionState};
pub use error::{ErrorKind, ErrorNotice, PlaybackError, Result};
pub use events::PlaybackEvent;
#[cfg(feature = "tokio-driver")]
pub use scheduler::TokioScheduler;
pub use scheduler::{ManualScheduler, PendingTimer, Scheduler, TimerId};
pub use sequencer::Sequencer;
pub use shuffle::ShuffleQueue;
pub use transport::{DualBufferTransport, TransportEvent, TransportEventKind};
pub use types::{
    BufferRole, PlaybackConfig, PlaybackOrder, PlaybackState, PlaybackStatus, SlotId,
};
pub use volume::Volume;
