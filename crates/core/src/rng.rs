//! RNG module - small deterministic generator
//!
//! The bag shuffle and the garbage rows both draw from this LCG so that a seed plus an input
//! sequence fully determines a session. The state is a single `u32` and is persisted with the
//! save blob.

/// 32-bit linear congruential generator (Numerical Recipes multiplier and increment)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Seed a generator; zero is remapped to one
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    /// Resume from a previously captured [`SimpleRng::state`]
    pub fn from_state(state: u32) -> Self {
        Self::new(state)
    }

    /// Advance and return the raw state
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Value in `[0, max)`
    ///
    /// Maps through the high bits; the low bits of a power-of-two LCG are weak.
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Uniform float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// In-place Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for upper in (1..slice.len()).rev() {
            let pick = self.next_range(upper as u32 + 1) as usize;
            slice.swap(upper, pick);
        }
    }

    /// Current state (for persistence)
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Derive an independent stream from this one without advancing it
    pub fn fork(&self, salt: u32) -> Self {
        let mut derived = Self::new(self.state ^ salt.rotate_left(16));
        derived.next_u32();
        derived
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}
