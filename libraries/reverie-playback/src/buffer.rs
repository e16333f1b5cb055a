//! Platform-agnostic audio buffer trait
//!
//! Abstracts one playback handle (an `<audio>` element, a native sink, a
//! simulated clock in tests). The engine never decodes audio itself.

use crate::error::Result;

/// One playback handle
///
/// Implementors report progress back to the host, which forwards it to
/// [`PlaybackController::handle_transport_event`](crate::PlaybackController::handle_transport_event)
/// tagged with the slot the buffer lives in.
pub trait AudioBuffer {
    /// Point the buffer at a new source without starting playback
    ///
    /// Resets position to 0. Returns `SourceFailed` if the locator is
    /// rejected outright.
    fn load(&mut self, locator: &str) -> Result<()>;

    /// Start or resume playback
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Move the playhead (seconds from start)
    fn seek(&mut self, seconds: f64);

    /// Set output level in `[0, 1]`
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    /// Current playhead in seconds
    fn position(&self) -> f64;

    /// Source length in seconds (0 when unknown)
    fn duration(&self) -> f64;

    fn is_playing(&self) -> bool;

    /// Whether enough data is buffered to start without delay
    fn is_ready(&self) -> bool;

    /// Locator of the loaded source
    fn locator(&self) -> Option<&str>;
}

/// In-memory buffer for unit tests
///
/// Ready immediately after load; fails any locator listed in `failing`.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct DummyBuffer {
    pub locator: Option<String>,
    pub volume: f32,
    pub position: f64,
    pub duration: f64,
    pub playing: bool,
    pub ready: bool,
    pub defer_ready: bool,
    pub failing: Vec<String>,
}

#[cfg(test)]
impl DummyBuffer {
    pub fn new() -> Self {
        Self {
            volume: 1.0,
            ..Self::default()
        }
    }

    pub fn failing_on(locator: &str) -> Self {
        Self {
            failing: vec![locator.to_string()],
            ..Self::new()
        }
    }

    pub fn deferred() -> Self {
        Self {
            defer_ready: true,
            ..Self::new()
        }
    }
}

#[cfg(test)]
impl AudioBuffer for DummyBuffer {
    fn load(&mut self, locator: &str) -> Result<()> {
        self.playing = false;
        self.position = 0.0;
        if self.failing.iter().any(|l| l == locator) {
            self.locator = None;
            self.ready = false;
            return Err(crate::error::PlaybackError::SourceFailed {
                locator: locator.to_string(),
                reason: "unsupported source".to_string(),
            });
        }
        self.locator = Some(locator.to_string());
        self.ready = !self.defer_ready;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.locator.is_none() {
            return Err(crate::error::PlaybackError::NoTrackLoaded);
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        self.position = seconds;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }
}
