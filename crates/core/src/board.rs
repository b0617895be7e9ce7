//! Board module - manages a player's grid
//!
//! The board is a 10x20 grid where each cell can be empty or filled with a piece kind.
//! Uses a flat array for cache locality and zero-allocation line clears.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom).
//! Pieces may hang above the top edge (negative y) while they spawn.

use arrayvec::ArrayVec;

use crate::pieces::Piece;
use crate::types::{cell_id, Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// Upper bound on rows removed by one clear pass
pub const MAX_CLEARED_ROWS: usize = BOARD_HEIGHT as usize;

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * (BOARD_WIDTH as usize) + (x as usize))
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if position is occupied (within bounds and filled)
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// Check whether `piece` fits at its current shape and position.
    ///
    /// A filled mino is rejected when its column is outside `[0, width)`, when it
    /// sits on or below the floor, or when it lands on an occupied cell. Minos
    /// above the top edge (`y < 0`) are only checked horizontally.
    pub fn is_valid_position(&self, piece: &Piece) -> bool {
        piece.cells().all(|(x, y)| {
            if x < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
                return false;
            }
            y < 0 || !self.is_occupied(x, y)
        })
    }

    /// Write the piece's minos into the grid using its kind as cell value.
    ///
    /// Minos above the top edge are dropped. Returns the number of cells written.
    pub fn lock_piece(&mut self, piece: &Piece) -> usize {
        let mut written = 0;
        for (x, y) in piece.cells() {
            if y < 0 {
                continue;
            }
            if self.set(x, y, Some(piece.kind)) {
                written += 1;
            }
        }
        written
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        let start = y * BOARD_WIDTH as usize;
        let end = start + BOARD_WIDTH as usize;
        self.cells[start..end].iter().all(|cell| cell.is_some())
    }

    /// Clear all full rows and return the row indices that were cleared (sorted bottom to top)
    ///
    /// Remaining rows keep their relative order and settle at the bottom; empty rows
    /// are inserted at the top. A single lock can complete at most 4 rows, but the
    /// scan covers the whole board so a pre-filled grid is handled too.
    pub fn clear_full_rows(&mut self) -> ArrayVec<usize, MAX_CLEARED_ROWS> {
        let mut cleared_rows = ArrayVec::new();
        let width = BOARD_WIDTH as usize;
        let mut write_y = BOARD_HEIGHT as usize;

        for read_y in (0..BOARD_HEIGHT as usize).rev() {
            if self.is_row_full(read_y) {
                cleared_rows.push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src_start = read_y * width;
                    let dst_start = write_y * width;
                    self.cells
                        .copy_within(src_start..src_start + width, dst_start);
                }
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = None;
        }

        cleared_rows
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Rows of wire cell ids (`0` = empty, `1..=7` = piece kind).
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(BOARD_WIDTH as usize)
            .map(|row| row.iter().map(|&c| cell_id(c)).collect())
            .collect()
    }

    /// Fill an entire row, used to stage boards in tests and benches.
    pub fn fill_row(&mut self, y: i8, kind: PieceKind) {
        for x in 0..BOARD_WIDTH as i8 {
            self.set(x, y, Some(kind));
        }
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::Piece;

    #[test]
    fn test_board_index_calculation() {
        assert_eq!(Board::index(0, 0), Some(0));
        assert_eq!(Board::index(9, 0), Some(9));
        assert_eq!(Board::index(0, 1), Some(10));
        assert_eq!(Board::index(9, 19), Some(199));
        assert_eq!(Board::index(-1, 0), None);
        assert_eq!(Board::index(10, 0), None);
        assert_eq!(Board::index(0, 20), None);
    }

    #[test]
    fn test_piece_above_top_is_only_checked_horizontally() {
        let board = Board::new();
        let mut piece = Piece::new(PieceKind::I);
        // I occupies row 1 of its matrix; y = -2 keeps those minos above the top edge.
        piece.y = -2;
        assert!(board.is_valid_position(&piece));

        piece.x = -1;
        assert!(!board.is_valid_position(&piece));
    }

    #[test]
    fn test_lock_skips_negative_rows() {
        let mut board = Board::new();
        let mut piece = Piece::new(PieceKind::T);
        // T matrix rows 0 and 1 are filled; y = -1 keeps row 0 above the board.
        piece.y = -1;
        piece.x = 0;

        let written = board.lock_piece(&piece);
        assert_eq!(written, 3);
        assert!(board.cells()[..10].iter().filter(|c| c.is_some()).count() == 3);
    }

    #[test]
    fn test_clear_full_rows_preserves_order() {
        let mut board = Board::new();
        board.set(0, 17, Some(PieceKind::S));
        board.fill_row(18, PieceKind::I);
        board.set(3, 19, Some(PieceKind::Z));

        let cleared = board.clear_full_rows();
        assert_eq!(cleared.as_slice(), &[18]);
        assert_eq!(board.get(0, 18), Some(Some(PieceKind::S)));
        assert_eq!(board.get(3, 19), Some(Some(PieceKind::Z)));
        assert_eq!(board.get(0, 17), Some(None));
    }

    #[test]
    fn test_to_rows_uses_kind_ids() {
        let mut board = Board::new();
        board.set(2, 19, Some(PieceKind::O));
        let rows = board.to_rows();
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[19][2], PieceKind::O.id());
        assert_eq!(rows[0][0], 0);
    }
}
