//! Crossfade coordinator for track transitions
//!
//! Drives the Idle -> Preloading -> Crossfading -> Idle cycle. Near the end
//! of the active track the incoming track is preloaded into the standby
//! buffer, both buffers are ramped linearly in fixed steps, and the roles are
//! swapped once the outgoing buffer is silent and paused.
//!
//! Each step is a single-shot timer scheduled by the previous one, so steps
//! can never overlap or run ahead. The timer id lives inside the
//! [`TransitionState`]; any id that does not match it is stale and ignored.

use crate::error::{PlaybackError, Result};
use crate::scheduler::{Scheduler, TimerId};
use crate::transport::DualBufferTransport;
use crate::types::{BufferRole, MAX_CROSSFADE_SECONDS};
use reverie_catalog::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of volume steps per ramp
pub const DEFAULT_RAMP_STEPS: u32 = 20;

/// Crossfade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossfadeSettings {
    /// Whether crossfade is enabled
    pub enabled: bool,

    /// Crossfade duration in seconds (0 = hard cut, max 10)
    pub duration_seconds: f64,

    /// Volume steps per ramp (at least 1)
    pub steps: u32,
}

impl Default for CrossfadeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_seconds: 3.0,
            steps: DEFAULT_RAMP_STEPS,
        }
    }
}

impl CrossfadeSettings {
    /// Create settings, clamping duration and steps into range
    pub fn new(enabled: bool, duration_seconds: f64, steps: u32) -> Self {
        let mut settings = Self {
            enabled,
            duration_seconds: 0.0,
            steps: steps.max(1),
        };
        settings.set_duration(duration_seconds);
        settings
    }

    /// Set duration, clamped to `[0, 10]`. Non-finite values are ignored.
    pub fn set_duration(&mut self, seconds: f64) -> bool {
        if !seconds.is_finite() {
            return false;
        }
        self.duration_seconds = seconds.clamp(0.0, MAX_CROSSFADE_SECONDS);
        true
    }

    /// Whether an automatic advance should ramp rather than cut
    pub fn is_effective(&self) -> bool {
        self.enabled && self.duration_seconds > 0.0
    }
}

/// A ramp in flight
#[derive(Debug, Clone, PartialEq)]
pub struct Crossfade {
    pub from: Track,
    pub to: Track,

    /// Position of the outgoing track when the ramp began
    pub started_at_seconds: f64,

    /// Actual ramp length (never longer than what was left of `from`)
    pub duration_seconds: f64,

    /// Steps applied so far
    pub step: u32,
    pub steps: u32,

    timer: TimerId,
}

impl Crossfade {
    /// Progress from 0.0 (just started) to 1.0 (complete)
    pub fn progress(&self) -> f64 {
        f64::from(self.step) / f64::from(self.steps)
    }

    /// Timer that will deliver the next step
    pub fn timer(&self) -> TimerId {
        self.timer
    }

    fn step_interval(&self) -> Duration {
        step_interval(self.duration_seconds, self.steps)
    }
}

/// Transition state owned by the coordinator
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TransitionState {
    /// No transition
    #[default]
    Idle,

    /// Incoming track loading into standby, ramp starts when it can play
    Preloading { from: Track, next: Track },

    /// Volumes ramping across both buffers
    Crossfading(Crossfade),
}

impl TransitionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TransitionState::Idle)
    }

    /// Ramp progress, if a ramp is running
    pub fn progress(&self) -> Option<f64> {
        match self {
            TransitionState::Crossfading(fade) => Some(fade.progress()),
            _ => None,
        }
    }

    /// Track being brought in
    pub fn incoming(&self) -> Option<&Track> {
        match self {
            TransitionState::Idle => None,
            TransitionState::Preloading { next, .. } => Some(next),
            TransitionState::Crossfading(fade) => Some(&fade.to),
        }
    }
}

/// Result of a transition request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeginOutcome {
    /// Ramp running for this many seconds
    Started { duration_seconds: f64 },

    /// Waiting for the standby buffer to become ready
    Preloading,
}

/// Result of a timer delivery
#[derive(Debug, Clone, PartialEq)]
pub enum TimerOutcome {
    /// Not our timer (stale or cancelled)
    Ignored,

    /// One more step applied
    Stepped { progress: f64 },

    /// Final step applied and roles swapped
    Completed { from: Track, to: Track },

    /// Final step applied but the roles could not be swapped
    Failed { to: Track, reason: String },
}

/// Crossfade coordinator
///
/// Holds no buffers or timers of its own; the controller lends it the
/// transport and scheduler for each call.
#[derive(Debug, Clone)]
pub struct CrossfadeCoordinator {
    settings: CrossfadeSettings,
    state: TransitionState,

    /// Single-shot trigger for the current track
    armed: bool,
}

impl CrossfadeCoordinator {
    pub fn new(settings: CrossfadeSettings) -> Self {
        Self {
            settings,
            state: TransitionState::Idle,
            armed: true,
        }
    }

    pub fn settings(&self) -> &CrossfadeSettings {
        &self.settings
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    /// Applies to the next ramp; a running ramp keeps its length
    pub fn set_duration(&mut self, seconds: f64) -> bool {
        self.settings.set_duration(seconds)
    }

    pub fn set_steps(&mut self, steps: u32) {
        self.settings.steps = steps.max(1);
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Allow the trigger to fire again for the current track
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Whether the active track has just crossed into the fade window.
    ///
    /// True at most once per arming: the first report with
    /// `0 < remaining <= duration` while autoplay and crossfade are on.
    pub fn should_trigger(&self, autoplay: bool, remaining_seconds: f64) -> bool {
        autoplay
            && self.armed
            && self.state.is_idle()
            && self.settings.is_effective()
            && remaining_seconds > 0.0
            && remaining_seconds <= self.settings.duration_seconds
    }

    /// Preload `to` and start ramping from `from`.
    ///
    /// Rejected with `TransitionInProgress` unless idle. Disarms the trigger
    /// whatever the outcome, so a failing source is not retried every tick.
    pub fn begin<S: Scheduler + ?Sized>(
        &mut self,
        from: Track,
        to: Track,
        position_seconds: f64,
        remaining_seconds: f64,
        transport: &mut DualBufferTransport,
        scheduler: &mut S,
    ) -> Result<BeginOutcome> {
        if !self.state.is_idle() {
            return Err(PlaybackError::TransitionInProgress);
        }
        self.armed = false;

        transport.load_standby(&to)?;

        if transport.buffer(BufferRole::Standby).is_ready() {
            let duration_seconds = self.start_ramp(
                from,
                to,
                position_seconds,
                remaining_seconds,
                transport,
                scheduler,
            )?;
            Ok(BeginOutcome::Started { duration_seconds })
        } else {
            debug!(from = %from.id, to = %to.id, "Waiting for standby buffer");
            self.state = TransitionState::Preloading { from, next: to };
            Ok(BeginOutcome::Preloading)
        }
    }

    /// Standby reported it can play. Starts the ramp if one is pending.
    ///
    /// Returns the ramp length, or `None` when nothing was preloading.
    pub fn on_standby_ready<S: Scheduler + ?Sized>(
        &mut self,
        position_seconds: f64,
        remaining_seconds: f64,
        transport: &mut DualBufferTransport,
        scheduler: &mut S,
    ) -> Result<Option<f64>> {
        match std::mem::take(&mut self.state) {
            TransitionState::Preloading { from, next } => self
                .start_ramp(
                    from,
                    next,
                    position_seconds,
                    remaining_seconds,
                    transport,
                    scheduler,
                )
                .map(Some),
            other => {
                self.state = other;
                Ok(None)
            }
        }
    }

    /// Apply the next step for timer `id`
    pub fn on_timer<S: Scheduler + ?Sized>(
        &mut self,
        id: TimerId,
        transport: &mut DualBufferTransport,
        scheduler: &mut S,
    ) -> TimerOutcome {
        let (step, steps, interval) = match &mut self.state {
            TransitionState::Crossfading(fade) if fade.timer == id => {
                fade.step = (fade.step + 1).min(fade.steps);
                (fade.step, fade.steps, fade.step_interval())
            }
            _ => {
                debug!(timer = id.get(), "Ignoring stale crossfade timer");
                return TimerOutcome::Ignored;
            }
        };

        apply_step(transport, step, steps);

        if step >= steps {
            let incoming = self.state.incoming().cloned();
            return match (self.commit(transport, scheduler), incoming) {
                (Ok((from, to)), _) => TimerOutcome::Completed { from, to },
                (Err(e), Some(to)) => {
                    warn!(error = %e, "Crossfade could not be committed");
                    TimerOutcome::Failed {
                        to,
                        reason: e.to_string(),
                    }
                }
                (Err(_), None) => TimerOutcome::Ignored,
            };
        }

        let next_timer = scheduler.schedule(interval);
        if let TransitionState::Crossfading(fade) = &mut self.state {
            fade.timer = next_timer;
        }

        TimerOutcome::Stepped {
            progress: f64::from(step) / f64::from(steps),
        }
    }

    /// Finish the running ramp now: pause and restore the outgoing buffer,
    /// bring the incoming one to nominal, swap roles.
    pub fn commit<S: Scheduler + ?Sized>(
        &mut self,
        transport: &mut DualBufferTransport,
        scheduler: &mut S,
    ) -> Result<(Track, Track)> {
        let fade = match std::mem::take(&mut self.state) {
            TransitionState::Crossfading(fade) => fade,
            other => {
                self.state = other;
                return Err(PlaybackError::InvalidOperation(
                    "no crossfade in progress".into(),
                ));
            }
        };

        scheduler.cancel(fade.timer);
        transport.pause_role(BufferRole::Active);
        transport.restore_volumes();
        transport.swap_roles()?;
        self.armed = true;

        debug!(from = %fade.from.id, to = %fade.to.id, "Crossfade completed");
        Ok((fade.from, fade.to))
    }

    /// Tear down any transition.
    ///
    /// Stops the timer, pauses whatever was fading in, puts both buffers
    /// back at nominal volume and re-arms the trigger. Returns whether there
    /// was anything to cancel.
    pub fn cancel<S: Scheduler + ?Sized>(
        &mut self,
        transport: &mut DualBufferTransport,
        scheduler: &mut S,
    ) -> bool {
        match std::mem::take(&mut self.state) {
            TransitionState::Idle => false,
            TransitionState::Preloading { next, .. } => {
                debug!(next = %next.id, "Preload cancelled");
                transport.pause_role(BufferRole::Standby);
                transport.restore_volumes();
                self.armed = true;
                true
            }
            TransitionState::Crossfading(fade) => {
                debug!(from = %fade.from.id, to = %fade.to.id, step = fade.step, "Crossfade cancelled");
                scheduler.cancel(fade.timer);
                transport.pause_role(BufferRole::Standby);
                transport.restore_volumes();
                self.armed = true;
                true
            }
        }
    }

    /// Re-apply the current step after the nominal volume changed
    pub fn rescale(&self, transport: &mut DualBufferTransport) {
        if let TransitionState::Crossfading(fade) = &self.state {
            apply_step(transport, fade.step, fade.steps);
        }
    }

    fn start_ramp<S: Scheduler + ?Sized>(
        &mut self,
        from: Track,
        to: Track,
        position_seconds: f64,
        remaining_seconds: f64,
        transport: &mut DualBufferTransport,
        scheduler: &mut S,
    ) -> Result<f64> {
        let steps = self.settings.steps.max(1);
        let duration_seconds = self
            .settings
            .duration_seconds
            .min(remaining_seconds)
            .max(0.0);

        apply_step(transport, 0, steps);

        if let Err(e) = transport.play_role(BufferRole::Standby) {
            transport.pause_role(BufferRole::Standby);
            transport.restore_volumes();
            self.state = TransitionState::Idle;
            return Err(e);
        }

        let timer = scheduler.schedule(step_interval(duration_seconds, steps));

        debug!(
            from = %from.id,
            to = %to.id,
            duration_seconds,
            steps,
            "Crossfade started"
        );

        self.state = TransitionState::Crossfading(Crossfade {
            from,
            to,
            started_at_seconds: position_seconds,
            duration_seconds,
            step: 0,
            steps,
            timer,
        });

        Ok(duration_seconds)
    }
}

impl Default for CrossfadeCoordinator {
    fn default() -> Self {
        Self::new(CrossfadeSettings::default())
    }
}

/// Set both buffers for step `k` of `n`
fn apply_step(transport: &mut DualBufferTransport, step: u32, steps: u32) {
    let master = transport.nominal_volume();
    let k = step as f32 / steps.max(1) as f32;
    transport.set_volume(BufferRole::Active, master * (1.0 - k));
    transport.set_volume(BufferRole::Standby, master * k);
}

fn step_interval(duration_seconds: f64, steps: u32) -> Duration {
    Duration::try_from_secs_f64(duration_seconds / f64::from(steps.max(1))).unwrap_or_default()
}
