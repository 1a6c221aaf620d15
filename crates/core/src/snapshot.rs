//! Snapshot types exchanged with the host
//!
//! [`SaveBlob`] is the flat persistence contract. Every field defaults when absent so older
//! or hand-edited saves still load. [`RenderView`] is an owned, read-only projection for
//! the renderer; building one never borrows the live state past the call.

use serde::{Deserialize, Serialize};

use crate::animation::AnimationProgress;
use crate::game_state::Phase;
use crate::settings::Settings;
use crate::tetromino::ShapeCells;
use crate::types::{Cell, GameMode, Rotation, ShapeKind, HIDDEN_ROWS, OUT_OF_BOUNDS};

/// Format revision written into new saves
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveBlob {
    pub version: u32,
    /// Row-major comma-joined cell values, hidden rows included
    pub grid: String,
    pub active_type: Option<String>,
    pub active_x: i32,
    pub active_y: i32,
    pub active_rotation: i32,
    pub hold_type: Option<String>,
    pub hold_used: bool,
    /// Comma-joined shape names, front first
    pub next_queue: String,
    pub bag_state: String,
    pub score: u64,
    pub total_lines: u32,
    pub chain: u32,
    pub rise_interval: f32,
    pub rise_timer: f32,
    pub gravity_timer: f32,
    pub lock_timer: f32,
    pub lock_pending: bool,
    pub time_since_start: f32,
    pub difficulty_steps: u32,
    pub difficulty_timer: f32,
    pub rise_suspended: bool,
    pub game_mode: String,
    pub is_paused: bool,
    pub game_over: bool,
    pub best_zen: u64,
    pub best_classic: u64,
    pub settings: Settings,
    /// Generator states; absent in saves that predate them
    pub bag_rng: Option<u32>,
    pub garbage_rng: Option<u32>,
}

/// Active piece as seen by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveView {
    pub kind: ShapeKind,
    pub rotation: Rotation,
    pub x: i32,
    pub y: i32,
    /// Absolute grid cells (hidden rows included)
    pub cells: ShapeCells,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderView {
    pub cols: usize,
    pub visible_rows: usize,
    /// Visible rows only, row-major
    pub cells: Vec<Cell>,
    /// Drop distances for the visible rows
    pub drop_distances: Vec<u32>,
    pub active: Option<ActiveView>,
    pub hold: Option<ShapeKind>,
    pub hold_used: bool,
    pub preview: Vec<ShapeKind>,
    pub score: u64,
    pub lines: u32,
    pub chain: u32,
    pub best_score: u64,
    pub mode: GameMode,
    pub phase: Phase,
    pub paused: bool,
    pub game_over: bool,
    pub settings_open: bool,
    pub rise_suspended: bool,
    pub rise_countdown: f32,
    pub rise_interval: f32,
    pub gravity_progress: f32,
    pub animations: AnimationProgress,
}

impl RenderView {
    /// Cell by visible coordinates; [`OUT_OF_BOUNDS`] outside
    pub fn visible_cell(&self, col: i32, row: i32) -> Cell {
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.visible_rows {
            return OUT_OF_BOUNDS;
        }
        self.cells[row as usize * self.cols + col as usize]
    }

    /// Active cells translated to visible rows; cells in the hidden band come out negative
    pub fn active_visible_cells(&self) -> Option<ShapeCells> {
        self.active
            .map(|active| active.cells.map(|(c, r)| (c, r - HIDDEN_ROWS as i32)))
    }

    /// Text dump of the bottom `rows` visible rows with the active piece drawn as `@`
    pub fn ascii(&self, rows: usize) -> String {
        let rows = rows.min(self.visible_rows);
        let active = self.active_visible_cells();
        let mut out = String::with_capacity((self.cols + 1) * rows);
        for row in self.visible_rows - rows..self.visible_rows {
            for col in 0..self.cols {
                let here = (col as i32, row as i32);
                let ch = if active.map_or(false, |cells| cells.contains(&here)) {
                    '@'
                } else {
                    match self.visible_cell(col as i32, row as i32) {
                        0 => '.',
                        8 => '#',
                        v => char::from_digit(v as u32, 10).unwrap_or('?'),
                    }
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            cols: 0,
            visible_rows: 0,
            cells: Vec::new(),
            drop_distances: Vec::new(),
            active: None,
            hold: None,
            hold_used: false,
            preview: Vec::new(),
            score: 0,
            lines: 0,
            chain: 1,
            best_score: 0,
            mode: GameMode::default(),
            phase: Phase::Spawning,
            paused: false,
            game_over: false,
            settings_open: false,
            rise_suspended: false,
            rise_countdown: 0.0,
            rise_interval: 0.0,
            gravity_progress: 0.0,
            animations: AnimationProgress::default(),
        }
    }
}
