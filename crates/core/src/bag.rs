//! Bag module - 7-bag shape randomizer
//!
//! Each bag contains one of each shape, shuffled. Draws drain the bag until it is empty, then
//! a fresh permutation is generated. The refill order is resampled every time, never rotated.

use std::collections::VecDeque;

use crate::rng::SimpleRng;
use crate::types::ShapeKind;

/// 7-bag shape generator
#[derive(Debug, Clone)]
pub struct PieceBag {
    /// Remaining shapes of the current bag, front first
    queue: VecDeque<ShapeKind>,
    /// RNG for shuffling
    rng: SimpleRng,
}

impl PieceBag {
    /// Create a new bag with the given seed
    pub fn new(seed: u32) -> Self {
        Self::with_rng(SimpleRng::new(seed))
    }

    pub fn with_rng(rng: SimpleRng) -> Self {
        let mut bag = Self {
            queue: VecDeque::with_capacity(ShapeKind::ALL.len()),
            rng,
        };
        bag.refill();
        bag
    }

    /// Generate a new shuffled bag
    fn refill(&mut self) {
        let mut fresh = ShapeKind::ALL;
        self.rng.shuffle(&mut fresh);
        self.queue.extend(fresh);
    }

    /// Draw the next shape, refilling first if the bag is empty
    pub fn next(&mut self) -> ShapeKind {
        if self.queue.is_empty() {
            self.refill();
        }
        match self.queue.pop_front() {
            Some(kind) => kind,
            // refill always pushes seven shapes
            None => ShapeKind::I,
        }
    }

    /// Peek at the next `count` shapes without consuming them
    ///
    /// Past the end of the current bag this previews the refill a cloned RNG would produce,
    /// which is exactly what [`PieceBag::next`] will deal.
    pub fn preview(&self, count: usize) -> Vec<ShapeKind> {
        let mut out: Vec<ShapeKind> = self.queue.iter().copied().take(count).collect();
        let mut rng = self.rng.clone();
        while out.len() < count {
            let mut fresh = ShapeKind::ALL;
            rng.shuffle(&mut fresh);
            out.extend(fresh.iter().copied().take(count - out.len()));
        }
        out
    }

    /// Shapes left in the current bag, front first
    pub fn remaining(&self) -> impl Iterator<Item = ShapeKind> + '_ {
        self.queue.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Comma-joined shape names of the remaining bag
    pub fn serialize(&self) -> String {
        self.queue
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Replace the remaining bag from a [`PieceBag::serialize`] list
    ///
    /// Unknown names are skipped. An empty result stays empty until the next draw refills it.
    /// Returns how many tokens were rejected.
    pub fn restore(&mut self, serialized: &str) -> usize {
        self.queue.clear();
        let mut rejected = 0;
        for token in serialized.split(',').filter(|t| !t.trim().is_empty()) {
            match ShapeKind::from_str(token) {
                Some(kind) if self.queue.len() < ShapeKind::ALL.len() => self.queue.push_back(kind),
                _ => rejected += 1,
            }
        }
        rejected
    }

    /// Get the current RNG state (for persistence)
    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    pub fn set_rng_state(&mut self, state: u32) {
        self.rng = SimpleRng::from_state(state);
    }
}

impl Default for PieceBag {
    fn default() -> Self {
        Self::new(1)
    }
}
