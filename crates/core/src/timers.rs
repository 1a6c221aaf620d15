//! Timers module - scheduling state of the simulation
//!
//! Gravity, lock delay, garbage rise and the Classic-Relax difficulty ramp all live here.
//! [`crate::GameState`] only touches them through the transition methods below.
//!
//! Units: gravity and lock timers are milliseconds, everything else is seconds.

use crate::types::{
    GravityProfile, CLASSIC_DIFFICULTY_STEP_SECS, CLASSIC_RISE_DECREMENT_SECS, LOCK_DELAY_MS,
    MAX_DIFFICULTY_STEPS, MIN_RISE_INTERVAL_SECS, RISE_DELAY_BONUS_SECS, RISE_INTERVAL_SECS,
    RISE_RESUME_MIN_SECS,
};

/// Rise interval after `steps` difficulty steps, clamped to the floor
pub fn rise_interval_for(steps: u32) -> f32 {
    (RISE_INTERVAL_SECS - steps as f32 * CLASSIC_RISE_DECREMENT_SECS).max(MIN_RISE_INTERVAL_SECS)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timers {
    /// Accumulated gravity time (ms)
    pub gravity_ms: f32,
    pub gravity_interval_ms: f32,
    /// Lock countdown (ms), meaningful while `lock_pending`
    pub lock_ms: f32,
    pub lock_pending: bool,
    /// Seconds until the next rise
    pub rise_secs: f32,
    pub rise_interval_secs: f32,
    pub rise_suspended: bool,
    /// Unpaused session time
    pub elapsed_secs: f32,
    pub difficulty_secs: f32,
    pub difficulty_steps: u32,
}

impl Timers {
    pub fn new(profile: GravityProfile) -> Self {
        Self {
            gravity_ms: 0.0,
            gravity_interval_ms: profile.interval_ms(),
            lock_ms: LOCK_DELAY_MS,
            lock_pending: false,
            rise_secs: RISE_INTERVAL_SECS,
            rise_interval_secs: RISE_INTERVAL_SECS,
            rise_suspended: false,
            elapsed_secs: 0.0,
            difficulty_secs: 0.0,
            difficulty_steps: 0,
        }
    }

    pub fn set_gravity_profile(&mut self, profile: GravityProfile) {
        self.gravity_interval_ms = profile.interval_ms();
    }

    pub fn recompute_rise_interval(&mut self) {
        self.rise_interval_secs = rise_interval_for(self.difficulty_steps);
    }

    /// Cancel a pending lock
    pub fn reset_lock(&mut self) {
        self.lock_pending = false;
        self.lock_ms = LOCK_DELAY_MS;
    }

    /// Start the lock countdown unless it is already running
    pub fn arm_lock(&mut self) {
        if !self.lock_pending {
            self.lock_pending = true;
            self.lock_ms = LOCK_DELAY_MS;
        }
    }

    /// Fresh piece: gravity and lock start over
    pub fn reset_piece_timers(&mut self) {
        self.reset_lock();
        self.gravity_ms = 0.0;
    }

    pub fn accumulate_gravity(&mut self, dt: f32) {
        self.gravity_ms += dt * 1000.0;
    }

    /// Consume one gravity interval if enough time has accumulated
    pub fn take_gravity_step(&mut self) -> bool {
        if self.gravity_interval_ms > 0.0 && self.gravity_ms >= self.gravity_interval_ms {
            self.gravity_ms -= self.gravity_interval_ms;
            return true;
        }
        false
    }

    /// Fraction of the current gravity interval already elapsed
    pub fn gravity_progress(&self) -> f32 {
        if self.gravity_interval_ms <= 0.0 {
            return 0.0;
        }
        self.gravity_ms / self.gravity_interval_ms
    }

    /// Advance the lock countdown. Returns true when the piece must lock now.
    pub fn tick_lock(&mut self, dt: f32, can_descend: bool) -> bool {
        if can_descend {
            self.reset_lock();
            return false;
        }
        self.arm_lock();
        self.lock_ms -= dt * 1000.0;
        self.lock_ms <= 0.0
    }

    /// Classic-Relax ramp. Returns true when a new difficulty step was reached.
    pub fn advance_difficulty(&mut self, dt: f32) -> bool {
        self.difficulty_secs += dt;
        if self.difficulty_secs < CLASSIC_DIFFICULTY_STEP_SECS {
            return false;
        }
        self.difficulty_secs -= CLASSIC_DIFFICULTY_STEP_SECS;
        self.difficulty_steps = (self.difficulty_steps + 1).min(MAX_DIFFICULTY_STEPS);
        self.recompute_rise_interval();
        true
    }

    /// Resume a suspended rise once the hidden rows are clear. Returns true if it resumed.
    pub fn try_resume_rise(&mut self, hidden_rows_clear: bool) -> bool {
        if !self.rise_suspended || !hidden_rows_clear {
            return false;
        }
        self.rise_suspended = false;
        self.rise_secs = self.rise_secs.max(RISE_RESUME_MIN_SECS);
        true
    }

    pub fn countdown_rise(&mut self, dt: f32) {
        self.rise_secs -= dt;
    }

    pub fn rise_due(&self) -> bool {
        self.rise_secs <= 0.0
    }

    /// Schedule the next rise after a clean push
    pub fn rearm_rise(&mut self) {
        self.rise_secs += self.rise_interval_secs;
    }

    /// Restart the countdown after a push that overflowed
    pub fn restart_rise(&mut self) {
        self.rise_secs = self.rise_interval_secs;
    }

    /// Multi-line clear reward
    pub fn grant_rise_bonus(&mut self) {
        self.rise_secs += RISE_DELAY_BONUS_SECS;
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new(GravityProfile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rise_interval_clamps_to_floor() {
        assert_eq!(rise_interval_for(0), 6.0);
        assert_eq!(rise_interval_for(3), 4.5);
        assert_eq!(rise_interval_for(7), 2.5);
        assert_eq!(rise_interval_for(20), 2.5);
    }

    #[test]
    fn test_gravity_steps_consume_interval() {
        let mut timers = Timers::new(GravityProfile::Fast);
        timers.accumulate_gravity(1.2);
        assert!(timers.take_gravity_step());
        assert!(timers.take_gravity_step());
        assert!(!timers.take_gravity_step());
        assert!((timers.gravity_ms - 200.0).abs() < 1e-3);
        assert!((timers.gravity_progress() - 0.4).abs() < 1e-4);
    }

    #[test]
    fn test_lock_countdown_resets_when_piece_can_fall() {
        let mut timers = Timers::default();
        assert!(!timers.tick_lock(0.3, false));
        assert!(timers.lock_pending);
        assert!((timers.lock_ms - 200.0).abs() < 1e-3);

        assert!(!timers.tick_lock(0.1, true));
        assert!(!timers.lock_pending);
        assert_eq!(timers.lock_ms, LOCK_DELAY_MS);

        assert!(!timers.tick_lock(0.3, false));
        assert!(timers.tick_lock(0.25, false));
    }

    #[test]
    fn test_difficulty_ramp_caps() {
        let mut timers = Timers::default();
        for _ in 0..20 {
            timers.advance_difficulty(CLASSIC_DIFFICULTY_STEP_SECS);
        }
        assert_eq!(timers.difficulty_steps, MAX_DIFFICULTY_STEPS);
        assert_eq!(timers.rise_interval_secs, MIN_RISE_INTERVAL_SECS);
    }

    #[test]
    fn test_resume_rise_keeps_minimum_countdown() {
        let mut timers = Timers::default();
        timers.rise_suspended = true;
        timers.rise_secs = 0.1;
        assert!(!timers.try_resume_rise(false));
        assert!(timers.try_resume_rise(true));
        assert!(!timers.rise_suspended);
        assert_eq!(timers.rise_secs, RISE_RESUME_MIN_SECS);
    }
}
