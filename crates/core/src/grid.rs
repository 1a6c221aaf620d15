//! Grid module - manages the playfield cell buffer
//!
//! The grid is `cols x rows` where the top [`HIDDEN_ROWS`] rows sit above the visible
//! playfield and act as the overflow detector. Uses flat row-major storage
//! (`row * cols + col`); the buffer size never changes after construction.
//!
//! A parallel buffer records how far each cell last fell during an avalanche. It is only
//! bookkeeping for the renderer's drop interpolation and never affects game rules.

use crate::rng::SimpleRng;
use crate::tetromino::cells_at;
use crate::types::{
    Cell, Rotation, ShapeKind, BOARD_COLS, BOARD_TOTAL_ROWS, EMPTY_CELL, GARBAGE_CELL,
    GARBAGE_FILL_CHANCE, HIDDEN_ROWS, MAX_CELL, OUT_OF_BOUNDS,
};

/// Result of pushing a garbage row in from the bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiseOutcome {
    /// Whether the hidden band held any cell before or after the push
    pub overflowed: bool,
    /// The synthesized bottom row
    pub row: Vec<Cell>,
}

/// The playfield - flat array storage plus drop-distance bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    /// Flat array of cells, row-major order (row * cols + col)
    cells: Vec<Cell>,
    /// Rows fallen by the cell now at this index during the last avalanche
    drop_distances: Vec<u32>,
}

impl Grid {
    /// Create a new empty grid with the default dimensions
    pub fn new() -> Self {
        Self::with_size(BOARD_COLS, BOARD_TOTAL_ROWS)
    }

    /// Create an empty grid with `rows` total rows (hidden rows included)
    pub fn with_size(cols: usize, rows: usize) -> Self {
        assert!(cols > 0, "grid needs at least one column");
        assert!(rows > HIDDEN_ROWS, "grid needs rows below the hidden band");
        Self {
            cols,
            rows,
            cells: vec![EMPTY_CELL; cols * rows],
            drop_distances: vec![0; cols * rows],
        }
    }

    /// Calculate flat index from (col, row) coordinates
    #[inline(always)]
    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return None;
        }
        Some(row as usize * self.cols + col as usize)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total rows, hidden band included
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn hidden_rows(&self) -> usize {
        HIDDEN_ROWS
    }

    pub fn visible_rows(&self) -> usize {
        self.rows - HIDDEN_ROWS
    }

    /// Get cell at (col, row); [`OUT_OF_BOUNDS`] outside the grid
    pub fn get(&self, col: i32, row: i32) -> Cell {
        match self.index(col, row) {
            Some(idx) => self.cells[idx],
            None => OUT_OF_BOUNDS,
        }
    }

    /// Set cell at (col, row). Writes outside the grid are ignored.
    pub fn set(&mut self, col: i32, row: i32, value: Cell) {
        if let Some(idx) = self.index(col, row) {
            self.cells[idx] = value;
        }
    }

    /// Read a cell by visible row (row 0 is the first row under the hidden band)
    pub fn visible_cell(&self, col: i32, visible_row: i32) -> Cell {
        self.get(col, visible_row + HIDDEN_ROWS as i32)
    }

    pub fn is_occupied(&self, col: i32, row: i32) -> bool {
        self.get(col, row) > EMPTY_CELL
    }

    /// Whether a shape fits with its origin at `(base_x, base_y)`
    ///
    /// Columns must lie in `[0, cols)` and rows below `rows`. Rows above the grid (negative)
    /// are always free so pieces can spawn partly above the board.
    pub fn can_place(&self, kind: ShapeKind, base_x: i32, base_y: i32, rotation: Rotation) -> bool {
        cells_at(kind, rotation, base_x, base_y)
            .iter()
            .all(|&(col, row)| {
                if col < 0 || col as usize >= self.cols {
                    return false;
                }
                if row < 0 {
                    return true;
                }
                (row as usize) < self.rows
                    && self.cells[row as usize * self.cols + col as usize] == EMPTY_CELL
            })
    }

    /// Write a shape's cells into the grid; cells outside the grid are dropped
    pub fn add_piece(&mut self, kind: ShapeKind, base_x: i32, base_y: i32, rotation: Rotation) {
        for (col, row) in cells_at(kind, rotation, base_x, base_y) {
            self.set(col, row, kind.color_id());
        }
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, row: usize) -> bool {
        if row >= self.rows {
            return false;
        }
        let start = row * self.cols;
        self.cells[start..start + self.cols]
            .iter()
            .all(|&cell| cell != EMPTY_CELL)
    }

    /// Indices of every full row, ascending
    pub fn gather_full_rows(&self) -> Vec<usize> {
        (0..self.rows).filter(|&row| self.is_row_full(row)).collect()
    }

    /// Remove the given rows and compact the survivors downward
    ///
    /// Surviving rows keep their relative order; vacated rows at the top are zero-filled.
    /// Resets the drop-distance buffer.
    pub fn clear_rows(&mut self, rows_to_clear: &[usize]) {
        if rows_to_clear.is_empty() {
            return;
        }
        let width = self.cols;
        let mut write_row = self.rows;

        // Scan from bottom to top, copying survivors down to the write position
        for read_row in (0..self.rows).rev() {
            if rows_to_clear.contains(&read_row) {
                continue;
            }
            write_row -= 1;
            if write_row != read_row {
                let src = read_row * width;
                self.cells.copy_within(src..src + width, write_row * width);
            }
        }

        self.cells[..write_row * width].fill(EMPTY_CELL);
        self.drop_distances.fill(0);
    }

    /// Push every row up by one and synthesize a garbage row at the bottom
    ///
    /// The new row has one guaranteed gap; every other column is garbage with probability
    /// [`GARBAGE_FILL_CHANCE`]. Row 0 is discarded. `overflowed` is true if the hidden band
    /// held anything before the push or holds anything after it.
    pub fn rise_with_garbage(&mut self, rng: &mut SimpleRng) -> RiseOutcome {
        let width = self.cols;
        let gap = rng.next_range(width as u32) as usize;
        let mut row: Vec<Cell> = (0..width)
            .map(|col| {
                if col != gap && rng.next_f32() < GARBAGE_FILL_CHANCE {
                    GARBAGE_CELL
                } else {
                    EMPTY_CELL
                }
            })
            .collect();
        if row.iter().all(|&cell| cell != EMPTY_CELL) {
            let forced = rng.next_range(width as u32) as usize;
            row[forced] = EMPTY_CELL;
        }

        let overflow_before = self.has_overflow();

        self.cells.copy_within(width.., 0);
        let bottom = (self.rows - 1) * width;
        self.cells[bottom..].copy_from_slice(&row);
        self.drop_distances.fill(0);

        RiseOutcome {
            overflowed: overflow_before || self.has_overflow(),
            row,
        }
    }

    /// Whether any hidden-band cell is occupied
    pub fn has_overflow(&self) -> bool {
        self.cells[..HIDDEN_ROWS * self.cols]
            .iter()
            .any(|&cell| cell != EMPTY_CELL)
    }

    pub fn hidden_rows_clear(&self) -> bool {
        !self.has_overflow()
    }

    /// Record how far the cell now at (col, row) fell
    pub fn mark_drop_distance(&mut self, col: i32, row: i32, distance: u32) {
        if let Some(idx) = self.index(col, row) {
            self.drop_distances[idx] = distance;
        }
    }

    /// Rows fallen by the cell at (col, row) during the last avalanche
    pub fn drop_distance(&self, col: i32, row: i32) -> u32 {
        self.index(col, row)
            .map(|idx| self.drop_distances[idx])
            .unwrap_or(0)
    }

    pub fn clear_drop_distances(&mut self) {
        self.drop_distances.fill(0);
    }

    /// Clear the entire grid
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_CELL);
        self.drop_distances.fill(0);
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub(crate) fn drop_distances_mut(&mut self) -> &mut [u32] {
        &mut self.drop_distances
    }

    pub fn drop_distances(&self) -> &[u32] {
        &self.drop_distances
    }

    /// Flat comma-joined row-major dump
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 2);
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&cell.to_string());
        }
        out
    }

    /// Load a [`Grid::serialize`] dump
    ///
    /// Zero-fills first. Extra tokens are ignored, missing tokens leave empty cells and
    /// unparsable or out-of-range tokens become empty. Returns how many tokens were rejected.
    pub fn restore(&mut self, serialized: &str) -> usize {
        self.clear();
        if serialized.is_empty() {
            return 0;
        }
        let mut rejected = 0;
        for (slot, token) in self.cells.iter_mut().zip(serialized.split(',')) {
            match token.trim().parse::<i32>() {
                Ok(value) if (0..=MAX_CELL as i32).contains(&value) => *slot = value as Cell,
                _ => rejected += 1,
            }
        }
        rejected
    }

    /// Build from text rows: `.` is empty, a digit is that cell value
    ///
    /// Rows are aligned to the bottom of the grid.
    pub fn from_rows(cols: usize, rows: usize, art: &[&str]) -> Self {
        let mut grid = Self::with_size(cols, rows);
        let top = rows - art.len();
        for (r, line) in art.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let value = ch.to_digit(10).map(|d| d as Cell).unwrap_or(EMPTY_CELL);
                grid.set(c as i32, (top + r) as i32, value);
            }
        }
        grid
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}
