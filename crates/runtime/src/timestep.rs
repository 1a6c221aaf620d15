//! Fixed-timestep accumulator
//!
//! Wall-clock frame deltas go in, a whole number of fixed simulation steps come out. Each
//! frame is clamped before it reaches the accumulator so a long stall (a debugger break, a
//! suspended laptop) replays at most `max_frame` worth of steps.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    step: f32,
    max_frame: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(step: f32, max_frame: f32) -> Self {
        assert!(step > 0.0, "timestep must be positive");
        Self {
            step,
            max_frame: max_frame.max(step),
            accumulator: 0.0,
        }
    }

    /// Feed one frame and return how many fixed steps to run
    pub fn advance(&mut self, frame_secs: f32) -> u32 {
        let frame = if frame_secs.is_finite() {
            frame_secs.clamp(0.0, self.max_frame)
        } else {
            0.0
        };
        self.accumulator += frame;
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    /// Leftover fraction of a step, for render interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn max_frame(&self) -> f32 {
        self.max_frame
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(blockrise_types::TICK_SECS, blockrise_types::MAX_FRAME_SECS)
    }
}
