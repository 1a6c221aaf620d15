//! Avalanche module - line clears, floating-cluster gravity and chain scoring
//!
//! Invoked once per lock. Each chain stage clears every full row at once, then lets the
//! unsupported cells fall:
//!
//! 1. BFS from every occupied bottom-row cell through 4-connected occupied neighbours marks
//!    the grounded support structure.
//! 2. Every other occupied cell belongs to a floating cluster (a 4-connected component).
//! 3. Each cluster falls as a rigid body by the smallest per-column gap beneath its cells,
//!    measured against a snapshot of pre-move occupancy with the cluster's own cells removed.
//! 4. All clusters move together; the step repeats until nothing floats, so the board is
//!    settled when the stage ends.
//!
//! The stage loop runs until a pass finds no full rows; the multiplier grows by one per stage.
//! A lock that clears nothing still gets one settling pass so overhangs left by the piece fall.
//!
//! All scratch buffers are sized to the grid once and reused, so the lock path does not
//! allocate beyond the returned [`Resolution`].

use arrayvec::ArrayVec;

use crate::grid::Grid;
use crate::types::{Cell, EMPTY_CELL};

/// Base points for `lines` rows cleared in one stage, before the chain multiplier
///
/// | Lines | Points |
/// |-------|--------|
/// | 1 | 100 |
/// | 2 | 300 |
/// | 3 | 500 |
/// | 4 | 800 |
/// | n | 100 × n |
pub fn base_line_score(lines: usize) -> u64 {
    match lines {
        1 => 100,
        2 => 300,
        3 => 500,
        4 => 800,
        n => 100 * n as u64,
    }
}

/// Points for one chain stage
pub fn stage_score(lines: usize, chain: u32) -> u64 {
    base_line_score(lines) * chain as u64
}

/// One clear stage of a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStage {
    /// Rows cleared in this stage, ascending (pre-clear indices)
    pub rows: Vec<usize>,
    pub multiplier: u32,
    pub score: u64,
}

/// Outcome of [`AvalancheEngine::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub total_lines: u32,
    pub score_gained: u64,
    /// Multiplier of the last productive stage, or the starting value if nothing cleared
    pub last_chain: u32,
    pub chain_stages: Vec<ChainStage>,
    pub any_drop: bool,
    pub max_drop: u32,
}

impl Resolution {
    fn empty(start_chain: u32) -> Self {
        Self {
            total_lines: 0,
            score_gained: 0,
            last_chain: start_chain,
            chain_stages: Vec::new(),
            any_drop: false,
            max_drop: 0,
        }
    }

    /// Row lists per stage, in clear order
    pub fn stage_rows(&self) -> impl Iterator<Item = &[usize]> {
        self.chain_stages.iter().map(|stage| stage.rows.as_slice())
    }

    pub fn is_chain(&self) -> bool {
        self.chain_stages.len() > 1
    }
}

#[derive(Debug, Clone, Copy)]
struct ClusterSpan {
    start: usize,
    end: usize,
    distance: u32,
}

/// Reusable BFS arena for resolving locks on one grid size
#[derive(Debug, Clone)]
pub struct AvalancheEngine {
    cols: usize,
    rows: usize,
    grounded: Vec<bool>,
    visited: Vec<bool>,
    occupied: Vec<bool>,
    /// BFS queue with manual head/tail indices
    queue: Vec<u32>,
    /// Floating cells grouped by cluster; `clusters` holds the spans
    members: Vec<u32>,
    clusters: Vec<ClusterSpan>,
    /// Values lifted off the grid while a cluster moves: (cell, prior drop distance)
    carried: Vec<(Cell, u32)>,
}

impl AvalancheEngine {
    pub fn new(cols: usize, rows: usize) -> Self {
        let size = cols * rows;
        Self {
            cols,
            rows,
            grounded: vec![false; size],
            visited: vec![false; size],
            occupied: vec![false; size],
            queue: vec![0; size],
            members: Vec::with_capacity(size),
            clusters: Vec::with_capacity(size),
            carried: Vec::with_capacity(size),
        }
    }

    pub fn for_grid(grid: &Grid) -> Self {
        Self::new(grid.cols(), grid.rows())
    }

    fn fit_to(&mut self, grid: &Grid) {
        if self.cols != grid.cols() || self.rows != grid.rows() {
            *self = Self::for_grid(grid);
        }
    }

    /// Clear full rows and drop floating clusters until the board is stable
    pub fn resolve(&mut self, grid: &mut Grid, start_chain: u32) -> Resolution {
        self.fit_to(grid);
        grid.clear_drop_distances();

        let mut result = Resolution::empty(start_chain);
        let mut chain = start_chain;
        let mut settled_without_clear = false;

        loop {
            let full_rows = grid.gather_full_rows();
            if full_rows.is_empty() {
                if result.chain_stages.is_empty() && !settled_without_clear {
                    settled_without_clear = true;
                    let dropped = self.settle(grid);
                    if dropped > 0 {
                        result.any_drop = true;
                        result.max_drop = result.max_drop.max(dropped);
                        // The settle may have completed rows
                        continue;
                    }
                }
                break;
            }

            let score = stage_score(full_rows.len(), chain);
            result.total_lines += full_rows.len() as u32;
            result.score_gained += score;
            result.last_chain = chain;

            grid.clear_rows(&full_rows);
            result.chain_stages.push(ChainStage {
                rows: full_rows,
                multiplier: chain,
                score,
            });

            let dropped = self.settle(grid);
            if dropped > 0 {
                result.any_drop = true;
                result.max_drop = result.max_drop.max(dropped);
            }
            chain += 1;
        }

        result
    }

    /// Run gravity steps until nothing floats; returns the largest accumulated drop
    fn settle(&mut self, grid: &mut Grid) -> u32 {
        let mut max_drop = 0;
        while let Some(step_max) = self.gravity_step(grid) {
            max_drop = max_drop.max(step_max);
        }
        max_drop
    }

    /// One simultaneous gravity step. `None` when no cluster moved.
    fn gravity_step(&mut self, grid: &mut Grid) -> Option<u32> {
        let cols = self.cols;
        let rows = self.rows;
        let size = cols * rows;
        let cells = grid.cells();

        self.grounded.fill(false);
        self.visited.fill(false);

        // Grounded support: flood from the bottom row
        let mut head = 0usize;
        let mut tail = 0usize;
        let bottom = (rows - 1) * cols;
        for idx in bottom..size {
            if cells[idx] != EMPTY_CELL {
                self.grounded[idx] = true;
                self.queue[tail] = idx as u32;
                tail += 1;
            }
        }
        while head < tail {
            let current = self.queue[head] as usize;
            head += 1;
            for n in neighbours(current, cols, rows) {
                if cells[n] != EMPTY_CELL && !self.grounded[n] {
                    self.grounded[n] = true;
                    self.queue[tail] = n as u32;
                    tail += 1;
                }
            }
        }

        // Floating clusters
        self.members.clear();
        self.clusters.clear();
        for idx in 0..size {
            if cells[idx] == EMPTY_CELL || self.grounded[idx] || self.visited[idx] {
                continue;
            }
            let start = self.members.len();
            self.visited[idx] = true;
            self.members.push(idx as u32);
            let mut read = start;
            while read < self.members.len() {
                let current = self.members[read] as usize;
                read += 1;
                for n in neighbours(current, cols, rows) {
                    if cells[n] != EMPTY_CELL && !self.grounded[n] && !self.visited[n] {
                        self.visited[n] = true;
                        self.members.push(n as u32);
                    }
                }
            }
            self.clusters.push(ClusterSpan {
                start,
                end: self.members.len(),
                distance: 0,
            });
        }
        if self.clusters.is_empty() {
            return None;
        }

        for (slot, &cell) in self.occupied.iter_mut().zip(cells) {
            *slot = cell != EMPTY_CELL;
        }
        for span in self.clusters.iter_mut() {
            span.distance = fall_distance(
                &self.members[span.start..span.end],
                &mut self.occupied,
                cols,
                rows,
            );
        }

        // Targets were empty (or the cluster's own) in the snapshot, so applying clusters one
        // after another is the same as moving them together.
        let mut step_max = 0;
        for span in &self.clusters {
            if span.distance == 0 {
                continue;
            }
            let cluster = &self.members[span.start..span.end];
            self.carried.clear();
            for &idx in cluster {
                let idx = idx as usize;
                let value = grid.cells()[idx];
                let prior = grid.drop_distances()[idx];
                self.carried.push((value, prior));
                grid.cells_mut()[idx] = EMPTY_CELL;
                grid.drop_distances_mut()[idx] = 0;
            }
            for (&idx, &(value, prior)) in cluster.iter().zip(&self.carried) {
                let target = idx as usize + span.distance as usize * cols;
                let total = prior + span.distance;
                grid.cells_mut()[target] = value;
                grid.drop_distances_mut()[target] = total;
                step_max = step_max.max(total);
            }
        }

        if step_max == 0 {
            None
        } else {
            Some(step_max)
        }
    }
}

/// 4-connected in-bounds neighbours of a flat index
fn neighbours(idx: usize, cols: usize, rows: usize) -> ArrayVec<usize, 4> {
    let col = idx % cols;
    let row = idx / cols;
    let mut out = ArrayVec::new();
    if col > 0 {
        out.push(idx - 1);
    }
    if col + 1 < cols {
        out.push(idx + 1);
    }
    if row > 0 {
        out.push(idx - cols);
    }
    if row + 1 < rows {
        out.push(idx + cols);
    }
    out
}

/// Rows a rigid cluster can fall before any of its cells meets the floor or another cell
fn fall_distance(cluster: &[u32], occupied: &mut [bool], cols: usize, rows: usize) -> u32 {
    for &idx in cluster {
        occupied[idx as usize] = false;
    }
    let mut min_distance = u32::MAX;
    for &idx in cluster {
        let idx = idx as usize;
        let col = idx % cols;
        let mut drop = 0u32;
        let mut next_row = idx / cols + 1;
        while next_row < rows && !occupied[next_row * cols + col] {
            drop += 1;
            next_row += 1;
        }
        min_distance = min_distance.min(drop);
    }
    for &idx in cluster {
        occupied[idx as usize] = true;
    }
    if min_distance == u32::MAX {
        0
    } else {
        min_distance
    }
}

/// Convenience wrapper that builds a one-off engine for `grid`
pub fn resolve(grid: &mut Grid, start_chain: u32) -> Resolution {
    AvalancheEngine::for_grid(grid).resolve(grid, start_chain)
}
