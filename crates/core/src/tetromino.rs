//! Tetromino module - static rotation-cell table for the seven shapes
//!
//! Every shape has exactly four rotation states inside a 4x4 box. Offsets are `(dx, dy)`
//! relative to the piece origin, with `dy` growing downward.

use crate::types::{Rotation, ShapeKind};

/// Offset of a single cell relative to piece origin
pub type CellOffset = (i32, i32);

/// Shape of a piece - 4 cell offsets from piece origin
pub type ShapeCells = [CellOffset; 4];

/// Rotation states per shape
pub const ROTATION_COUNT: usize = 4;

/// Shape table indexed by `[ShapeKind::index()][Rotation::index()]`
const SHAPES: [[ShapeCells; ROTATION_COUNT]; 7] = [
    // I
    [
        [(0, 1), (1, 1), (2, 1), (3, 1)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 2), (1, 2), (2, 2), (3, 2)],
        [(1, 0), (1, 1), (1, 2), (1, 3)],
    ],
    // J
    [
        [(0, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (2, 2)],
        [(1, 0), (1, 1), (0, 2), (1, 2)],
    ],
    // L
    [
        [(2, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 1), (1, 1), (2, 1), (0, 2)],
        [(0, 0), (1, 0), (1, 1), (1, 2)],
    ],
    // O
    [
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
    ],
    // S
    [
        [(1, 0), (2, 0), (0, 1), (1, 1)],
        [(1, 0), (1, 1), (2, 1), (2, 2)],
        [(1, 1), (2, 1), (0, 2), (1, 2)],
        [(0, 0), (0, 1), (1, 1), (1, 2)],
    ],
    // T
    [
        [(1, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (2, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (1, 2)],
        [(1, 0), (0, 1), (1, 1), (1, 2)],
    ],
    // Z
    [
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(2, 0), (1, 1), (2, 1), (1, 2)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
        [(1, 0), (0, 1), (1, 1), (0, 2)],
    ],
];

/// Get the cell offsets for a shape kind and rotation
pub fn shape_cells(kind: ShapeKind, rotation: Rotation) -> ShapeCells {
    SHAPES[kind.index()][rotation.index()]
}

/// Absolute grid cells for a shape placed with its origin at `(x, y)`
pub fn cells_at(kind: ShapeKind, rotation: Rotation, x: i32, y: i32) -> ShapeCells {
    shape_cells(kind, rotation).map(|(dx, dy)| (x + dx, y + dy))
}
