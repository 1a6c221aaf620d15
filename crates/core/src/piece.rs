//! Piece module - the active falling shape
//!
//! Movement and rotation only ever commit a pose the grid accepts; a refused move leaves the
//! piece untouched.

use crate::grid::Grid;
use crate::tetromino::{cells_at, ShapeCells};
use crate::types::{Rotation, ShapeKind};

/// Kick offsets tried in order when rotating: in place, right, left, two right, two left,
/// then one row down.
pub const ROTATION_KICKS: [(i32, i32); 6] = [(0, 0), (1, 0), (-1, 0), (2, 0), (-2, 0), (0, 1)];

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: ShapeKind,
    pub rotation: Rotation,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Create a piece in its spawn orientation
    pub fn new(kind: ShapeKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            x,
            y,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Absolute cells covered by the piece
    pub fn cells(&self) -> ShapeCells {
        cells_at(self.kind, self.rotation, self.x, self.y)
    }

    /// Whether the current pose fits the grid
    pub fn fits(&self, grid: &Grid) -> bool {
        grid.can_place(self.kind, self.x, self.y, self.rotation)
    }

    /// Whether the piece could move one row down
    pub fn can_descend(&self, grid: &Grid) -> bool {
        grid.can_place(self.kind, self.x, self.y + 1, self.rotation)
    }

    /// Translate by (dx, dy) if the destination fits
    pub fn move_by(&mut self, dx: i32, dy: i32, grid: &Grid) -> bool {
        if grid.can_place(self.kind, self.x + dx, self.y + dy, self.rotation) {
            self.x += dx;
            self.y += dy;
            return true;
        }
        false
    }

    pub fn move_down(&mut self, grid: &Grid) -> bool {
        self.move_by(0, 1, grid)
    }

    /// Rotate clockwise, trying [`ROTATION_KICKS`] in order
    ///
    /// Returns false with the pose unchanged when no kick fits.
    pub fn rotate_clockwise(&mut self, grid: &Grid) -> bool {
        let next = self.rotation.rotate_cw();
        for (dx, dy) in ROTATION_KICKS {
            if grid.can_place(self.kind, self.x + dx, self.y + dy, next) {
                self.x += dx;
                self.y += dy;
                self.rotation = next;
                return true;
            }
        }
        false
    }
}
