//! Cosmetic animation clocks
//!
//! None of these affect game rules. They decay on every update, paused or not, and are
//! reset on restore.

use serde::{Deserialize, Serialize};

use crate::types::{AVALANCHE_ANIM_SECS, LINE_CLEAR_FADE_SECS, LOCK_PULSE_SECS, RISE_ANIM_SECS};

/// A one-shot timer reporting progress in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    elapsed: f32,
    duration: f32,
    active: bool,
}

impl Transition {
    pub const fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            active: false,
        }
    }

    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.active = true;
    }

    /// Returns true on the update that finishes the transition
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.active = false;
            return true;
        }
        false
    }

    /// 1.0 when idle
    pub fn progress(&self) -> f32 {
        if !self.active || self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.active = false;
    }
}

/// Fade of one cleared row, keyed by its pre-clear grid row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineClearFade {
    pub row: usize,
    pub elapsed: f32,
}

impl LineClearFade {
    pub fn progress(&self) -> f32 {
        (self.elapsed / LINE_CLEAR_FADE_SECS).clamp(0.0, 1.0)
    }
}

/// Snapshot of every animation ratio the renderer needs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationProgress {
    /// Remaining lock flash intensity, 1.0 right after a lock and 0.0 once faded
    pub lock_pulse: f32,
    /// `(row, progress)` per fading row
    pub line_clears: Vec<(usize, f32)>,
    pub avalanche: f32,
    /// Largest drop of the running avalanche animation
    pub avalanche_distance: u32,
    pub rise: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animations {
    lock_pulse: f32,
    line_clears: Vec<LineClearFade>,
    avalanche: Transition,
    avalanche_distance: u32,
    rise: Transition,
}

impl Animations {
    pub fn new() -> Self {
        Self {
            lock_pulse: 0.0,
            line_clears: Vec::new(),
            avalanche: Transition::new(AVALANCHE_ANIM_SECS),
            avalanche_distance: 0,
            rise: Transition::new(RISE_ANIM_SECS),
        }
    }

    pub fn pulse_lock(&mut self) {
        self.lock_pulse = LOCK_PULSE_SECS;
    }

    pub fn push_line_clear(&mut self, row: usize) {
        self.line_clears.push(LineClearFade { row, elapsed: 0.0 });
    }

    pub fn start_avalanche(&mut self, max_drop: u32) {
        self.avalanche_distance = max_drop;
        self.avalanche.start();
    }

    pub fn start_rise(&mut self) {
        self.rise.start();
    }

    /// Decay every clock. Returns true when the avalanche animation just finished, at which
    /// point the grid's drop distances are stale.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.lock_pulse > 0.0 {
            self.lock_pulse = (self.lock_pulse - dt).max(0.0);
        }
        for fade in self.line_clears.iter_mut() {
            fade.elapsed += dt;
        }
        self.line_clears
            .retain(|fade| fade.elapsed < LINE_CLEAR_FADE_SECS);
        self.rise.update(dt);
        let finished = self.avalanche.update(dt);
        if finished {
            self.avalanche_distance = 0;
        }
        finished
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn line_clears(&self) -> &[LineClearFade] {
        &self.line_clears
    }

    pub fn avalanche_active(&self) -> bool {
        self.avalanche.is_active()
    }

    pub fn progress(&self) -> AnimationProgress {
        AnimationProgress {
            lock_pulse: self.lock_pulse / LOCK_PULSE_SECS,
            line_clears: self
                .line_clears
                .iter()
                .map(|fade| (fade.row, fade.progress()))
                .collect(),
            avalanche: self.avalanche.progress(),
            avalanche_distance: self.avalanche_distance,
            rise: self.rise.progress(),
        }
    }
}

impl Default for Animations {
    fn default() -> Self {
        Self::new()
    }
}
