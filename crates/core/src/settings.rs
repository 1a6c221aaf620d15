//! Player settings
//!
//! Only `mode`, `hold_enabled` and `gravity_profile` change the simulation. The rest is
//! carried for the presentation and audio collaborators and persisted with the save blob.

use serde::{Deserialize, Serialize};

use crate::types::{GameMode, GravityProfile};

/// Clamp a volume to [0, 1]; NaN becomes silence
pub fn clamp_volume(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: GameMode,
    pub hold_enabled: bool,
    pub gravity_profile: GravityProfile,
    pub show_grid: bool,
    pub left_handed: bool,
    pub show_touch_nudges: bool,
    pub music_volume: f32,
    pub sfx_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Zen,
            hold_enabled: false,
            gravity_profile: GravityProfile::Slow,
            show_grid: true,
            left_handed: false,
            show_touch_nudges: true,
            music_volume: 0.25,
            sfx_volume: 0.5,
        }
    }
}

impl Settings {
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_hold(mut self, enabled: bool) -> Self {
        self.hold_enabled = enabled;
        self
    }

    pub fn with_gravity(mut self, profile: GravityProfile) -> Self {
        self.gravity_profile = profile;
        self
    }

    /// Copy with both volumes clamped
    pub fn clamped(&self) -> Self {
        Self {
            music_volume: clamp_volume(self.music_volume),
            sfx_volume: clamp_volume(self.sfx_volume),
            ..self.clone()
        }
    }
}
