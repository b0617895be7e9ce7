//! Pieces module - tetromino shape matrices and rotation
//!
//! Every kind is stored as a square 0/1 matrix (4x4 for I, 2x2 for O, 3x3 for
//! the rest). Rotation is a clockwise 90° turn of the whole matrix, with a fixed
//! list of horizontal kick offsets tried when the turned shape collides.

use crate::board::Board;
use crate::types::{PieceKind, BOARD_WIDTH, KICK_OFFSETS};

/// Largest matrix side among the seven kinds
pub const MAX_SHAPE_SIZE: usize = 4;

/// Square 0/1 matrix describing the filled cells of a piece.
///
/// Only the top-left `size x size` block of `cells` is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    size: u8,
    cells: [[u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    fn from_rows<const N: usize>(rows: [[u8; N]; N]) -> Self {
        let mut cells = [[0u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (y, row) in rows.iter().enumerate() {
            cells[y][..N].copy_from_slice(row);
        }
        Self {
            size: N as u8,
            cells,
        }
    }

    /// Side length of the matrix.
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Value at row `y`, column `x` (0 or 1).
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.size() || y >= self.size() {
            return 0;
        }
        self.cells[y][x]
    }

    /// Offsets `(dx, dy)` of the filled cells, row-major.
    pub fn filled(&self) -> impl Iterator<Item = (i8, i8)> + '_ {
        let n = self.size();
        (0..n).flat_map(move |y| {
            (0..n).filter_map(move |x| (self.cells[y][x] != 0).then_some((x as i8, y as i8)))
        })
    }

    /// The matrix as nested rows, for the wire.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        let n = self.size();
        self.cells[..n].iter().map(|row| row[..n].to_vec()).collect()
    }
}

/// Spawn-orientation shape for a piece kind.
pub fn get_shape(kind: PieceKind) -> Shape {
    match kind {
        PieceKind::I => Shape::from_rows([
            [0, 0, 0, 0],
            [1, 1, 1, 1],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
        ]),
        PieceKind::O => Shape::from_rows([[1, 1], [1, 1]]),
        PieceKind::T => Shape::from_rows([[0, 1, 0], [1, 1, 1], [0, 0, 0]]),
        PieceKind::S => Shape::from_rows([[0, 1, 1], [1, 1, 0], [0, 0, 0]]),
        PieceKind::Z => Shape::from_rows([[1, 1, 0], [0, 1, 1], [0, 0, 0]]),
        PieceKind::J => Shape::from_rows([[1, 0, 0], [1, 1, 1], [0, 0, 0]]),
        PieceKind::L => Shape::from_rows([[0, 0, 1], [1, 1, 1], [0, 0, 0]]),
    }
}

/// Rotate a square matrix 90° clockwise: `new[x][n-1-y] = old[y][x]`.
pub fn rotate_shape(shape: &Shape) -> Shape {
    let n = shape.size();
    let mut cells = [[0u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
    for y in 0..n {
        for x in 0..n {
            cells[x][n - 1 - y] = shape.cells[y][x];
        }
    }
    Shape {
        size: shape.size,
        cells,
    }
}

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    /// Column of the matrix's left edge on the board
    pub x: i8,
    /// Row of the matrix's top edge on the board
    pub y: i8,
}

impl Piece {
    /// Create a piece in spawn orientation, horizontally centered at the top row.
    pub fn new(kind: PieceKind) -> Self {
        let shape = get_shape(kind);
        Self {
            kind,
            shape,
            x: spawn_x(shape.size()),
            y: 0,
        }
    }

    /// Absolute board coordinates of the filled cells.
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> + '_ {
        self.shape
            .filled()
            .map(move |(dx, dy)| (self.x + dx, self.y + dy))
    }

    /// Copy of this piece shifted by `(dx, dy)`.
    pub fn moved(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Left column that centers a matrix of side `size` on the board.
pub fn spawn_x(size: usize) -> i8 {
    ((BOARD_WIDTH as usize).saturating_sub(size) / 2) as i8
}

/// Try to rotate a piece clockwise with horizontal wall kicks.
///
/// The O piece is returned unchanged. Other kinds try the rotated shape at each
/// of [`KICK_OFFSETS`] on the current row and take the first placement the board
/// accepts. Returns `None` when every offset collides.
pub fn try_rotate(piece: &Piece, board: &Board) -> Option<Piece> {
    if piece.kind == PieceKind::O {
        return Some(*piece);
    }

    let rotated = Piece {
        shape: rotate_shape(&piece.shape),
        ..*piece
    };

    KICK_OFFSETS
        .iter()
        .map(|&dx| rotated.moved(dx, 0))
        .find(|candidate| board.is_valid_position(candidate))
}
