//! Grid, piece and bag tests against the public facade

use blockrise::core::{Grid, Piece, PieceBag, SimpleRng};
use blockrise::types::{
    Rotation, ShapeKind, BOARD_COLS, BOARD_TOTAL_ROWS, EMPTY_CELL, GARBAGE_CELL, HIDDEN_ROWS,
    OUT_OF_BOUNDS,
};

#[test]
fn test_grid_new_empty() {
    let grid = Grid::new();
    assert_eq!(grid.cols(), BOARD_COLS);
    assert_eq!(grid.rows(), BOARD_TOTAL_ROWS);
    assert_eq!(grid.hidden_rows(), HIDDEN_ROWS);
    assert!(grid.cells().iter().all(|&c| c == EMPTY_CELL));
    assert!(grid.hidden_rows_clear());
}

#[test]
fn test_grid_out_of_bounds_reads() {
    let grid = Grid::with_size(24, 80);
    assert_eq!(grid.get(-1, 0), OUT_OF_BOUNDS);
    assert_eq!(grid.get(0, -1), OUT_OF_BOUNDS);
    assert_eq!(grid.get(24, 0), OUT_OF_BOUNDS);
    assert_eq!(grid.get(0, 80), OUT_OF_BOUNDS);
}

#[test]
fn test_visible_cell_skips_hidden_band() {
    let mut grid = Grid::with_size(24, 80);
    grid.set(3, HIDDEN_ROWS as i32, 5);
    assert_eq!(grid.visible_cell(3, 0), 5);
    assert_eq!(grid.get(3, 0), EMPTY_CELL);
}

#[test]
fn test_clear_rows_compacts_survivors() {
    let mut grid = Grid::from_rows(4, 8, &["1...", "2222", ".3..", "4444"]);
    grid.clear_rows(&[5, 7]);
    assert_eq!(grid.get(0, 7), EMPTY_CELL);
    assert_eq!(grid.get(1, 7), 3);
    assert_eq!(grid.get(0, 6), 1);
    assert!(grid.gather_full_rows().is_empty());
    for row in 0..6 {
        assert!((0..4).all(|c| grid.get(c, row) == EMPTY_CELL));
    }
}

#[test]
fn test_rise_reports_prior_overflow() {
    let mut grid = Grid::with_size(24, 80);
    grid.set(7, 0, 2);
    let mut rng = SimpleRng::new(5);
    let outcome = grid.rise_with_garbage(&mut rng);
    assert!(outcome.overflowed);
}

#[test]
fn test_rise_row_has_a_gap() {
    let mut grid = Grid::with_size(24, 80);
    let mut rng = SimpleRng::new(11);
    for _ in 0..50 {
        let outcome = grid.rise_with_garbage(&mut rng);
        assert_eq!(outcome.row.len(), 24);
        assert!(outcome.row.contains(&EMPTY_CELL));
        assert!(outcome
            .row
            .iter()
            .all(|&c| c == EMPTY_CELL || c == GARBAGE_CELL));
        let bottom: Vec<_> = (0..24).map(|c| grid.get(c, 79)).collect();
        assert_eq!(bottom, outcome.row);
        grid.clear();
    }
}

#[test]
fn test_serialize_restore() {
    let mut grid = Grid::with_size(6, 10);
    grid.add_piece(ShapeKind::T, 1, 7, Rotation::South);
    grid.set(0, 9, GARBAGE_CELL);

    let mut copy = Grid::with_size(6, 10);
    assert_eq!(copy.restore(&grid.serialize()), 0);
    assert_eq!(copy.cells(), grid.cells());
}

#[test]
fn test_restore_rejects_bad_tokens() {
    let mut grid = Grid::with_size(2, 3);
    let rejected = grid.restore("1,x,9,-4,2");
    assert_eq!(rejected, 3);
    assert_eq!(grid.get(0, 0), 1);
    assert_eq!(grid.get(1, 0), EMPTY_CELL);
    assert_eq!(grid.get(0, 2), 2);
    assert_eq!(grid.get(1, 2), EMPTY_CELL);
}

#[test]
fn test_rotation_against_wall_without_kick_is_refused() {
    let mut grid = Grid::with_size(24, 80);
    for row in 0..80 {
        for col in 0..24 {
            grid.set(col, row, GARBAGE_CELL);
        }
    }
    // vertical I flush against the left wall, everything else packed
    let piece = Piece::new(ShapeKind::I, -1, 40).with_rotation(Rotation::West);
    for (col, row) in piece.cells() {
        assert_eq!(col, 0);
        grid.set(col, row, EMPTY_CELL);
    }
    assert!(piece.fits(&grid));

    let mut rotated = piece;
    assert!(!rotated.rotate_clockwise(&grid));
    assert_eq!(rotated, piece);
}

#[test]
fn test_rotation_uses_kick_near_wall() {
    let grid = Grid::with_size(24, 80);
    let mut piece = Piece::new(ShapeKind::I, -1, 40).with_rotation(Rotation::West);
    assert!(piece.rotate_clockwise(&grid));
    assert_eq!(piece.rotation, Rotation::North);
    assert!(piece.cells().iter().all(|&(c, _)| c >= 0));
}

#[test]
fn test_pieces_spawn_above_the_board() {
    let grid = Grid::with_size(24, 80);
    for kind in ShapeKind::ALL {
        let piece = Piece::new(kind, 10, -(HIDDEN_ROWS as i32));
        assert!(piece.fits(&grid), "{kind:?} should fit at spawn");
    }
}

#[test]
fn test_bag_deals_every_shape_per_cycle() {
    let mut bag = PieceBag::new(2024);
    for _ in 0..5 {
        let mut seen: Vec<_> = (0..7).map(|_| bag.next()).collect();
        seen.sort_by_key(|k| k.index());
        assert_eq!(seen, ShapeKind::ALL.to_vec());
    }
}

#[test]
fn test_bag_preview_matches_draws() {
    let mut bag = PieceBag::new(8);
    for _ in 0..3 {
        bag.next();
    }
    let preview = bag.preview(10);
    let drawn: Vec<_> = (0..10).map(|_| bag.next()).collect();
    assert_eq!(preview, drawn);
}

#[test]
fn test_bag_restore_skips_unknown_names() {
    let mut bag = PieceBag::new(1);
    assert_eq!(bag.restore("T,Q,I"), 1);
    assert_eq!(bag.remaining().collect::<Vec<_>>(), vec![ShapeKind::T, ShapeKind::I]);
}
