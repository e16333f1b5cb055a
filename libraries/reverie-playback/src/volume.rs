//! Master volume with mute
//!
//! Linear level in `[0, 1]`, applied directly as buffer gain.

/// Master volume controller
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Volume level (0.0-1.0)
    level: f32,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    ///
    /// Out-of-range levels are clamped; a non-finite level becomes 1.0.
    pub fn new(level: f32) -> Self {
        let level = if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            1.0
        };

        Self {
            level,
            muted: false,
        }
    }

    /// Set volume level (clamped to 0.0-1.0)
    ///
    /// Returns false and leaves the level alone for NaN or infinity.
    pub fn set_level(&mut self, level: f32) -> bool {
        if !level.is_finite() {
            return false;
        }
        self.level = level.clamp(0.0, 1.0);
        true
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Mute audio (preserves volume level)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Unmute audio (restores previous volume)
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Gain the buffers should play at
    ///
    /// Returns 0.0 if muted, otherwise the level.
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_volume() {
        let vol = Volume::new(0.8);
        assert_eq!(vol.level(), 0.8);
        assert!(!vol.is_muted());
        assert_eq!(Volume::default().level(), 1.0);
    }

    #[test]
    fn set_volume_level_clamps() {
        let mut vol = Volume::new(0.5);

        assert!(vol.set_level(0.75));
        assert_eq!(vol.level(), 0.75);

        vol.set_level(1.5);
        assert_eq!(vol.level(), 1.0);

        vol.set_level(-0.2);
        assert_eq!(vol.level(), 0.0);
    }

    #[test]
    fn non_finite_levels_are_ignored() {
        let mut vol = Volume::new(0.4);
        assert!(!vol.set_level(f32::NAN));
        assert!(!vol.set_level(f32::INFINITY));
        assert_eq!(vol.level(), 0.4);

        assert_eq!(Volume::new(f32::NAN).level(), 1.0);
    }

    #[test]
    fn mute_preserves_level() {
        let mut vol = Volume::new(0.8);

        vol.mute();
        assert!(vol.is_muted());
        assert_eq!(vol.level(), 0.8);
        assert_eq!(vol.gain(), 0.0);

        vol.toggle_mute();
        assert!(!vol.is_muted());
        assert_eq!(vol.gain(), 0.8);
    }
}
