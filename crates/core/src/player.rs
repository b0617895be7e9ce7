//! Player module - per-participant game state
//!
//! A player owns a board, at most one active piece, a score and a private
//! cursor into the room's shared piece sequence. Movement helpers only commit a
//! change after the board accepts the candidate placement.

use crate::board::Board;
use crate::pieces::{try_rotate, Piece};
use crate::scoring::line_clear_score;
use crate::types::PieceKind;

/// Identity of a participant as supplied by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
}

impl PlayerInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A watcher of the room; no board and no piece.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Spectator {
    pub id: String,
    pub name: String,
}

impl From<PlayerInfo> for Spectator {
    fn from(info: PlayerInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub is_host: bool,
    pub has_lost: bool,
    pub score: u32,
    pub board: Board,
    pub active_piece: Option<Piece>,
    /// Cursor into the room's shared piece sequence (monotonic)
    pub piece_index: usize,
    /// Room clock value of the last timed gravity step
    pub last_fall_ms: u64,
    /// One-tick soft drop request, cleared by every tick
    pub is_soft_dropping: bool,
}

impl Player {
    pub fn new(info: PlayerInfo, is_host: bool) -> Self {
        Self {
            id: info.id,
            name: info.name,
            is_host,
            has_lost: false,
            score: 0,
            board: Board::new(),
            active_piece: None,
            piece_index: 0,
            last_fall_ms: 0,
            is_soft_dropping: false,
        }
    }

    /// Place a freshly drawn piece at its spawn position.
    ///
    /// If the spawn placement collides the player tops out: `has_lost` is set
    /// and no piece is assigned. Returns whether the piece was placed.
    pub fn spawn(&mut self, kind: PieceKind) -> bool {
        let piece = Piece::new(kind);
        if self.board.is_valid_position(&piece) {
            self.active_piece = Some(piece);
            true
        } else {
            self.active_piece = None;
            self.has_lost = true;
            false
        }
    }

    /// Shift the active piece by `(dx, dy)` if the target placement is valid.
    pub fn try_move(&mut self, dx: i8, dy: i8) -> bool {
        let Some(active) = self.active_piece else {
            return false;
        };
        let candidate = active.moved(dx, dy);
        if self.board.is_valid_position(&candidate) {
            self.active_piece = Some(candidate);
            true
        } else {
            false
        }
    }

    /// Rotate clockwise with wall kicks; a fully blocked rotation is discarded.
    pub fn try_rotate(&mut self) -> bool {
        let Some(active) = self.active_piece else {
            return false;
        };
        match try_rotate(&active, &self.board) {
            Some(rotated) => {
                self.active_piece = Some(rotated);
                true
            }
            None => false,
        }
    }

    /// Move the active piece to the lowest row it can reach. Returns rows travelled.
    pub fn drop_to_floor(&mut self) -> u32 {
        let Some(active) = self.active_piece else {
            return 0;
        };
        let mut landed = active;
        let mut distance = 0;
        loop {
            let candidate = landed.moved(0, 1);
            if !self.board.is_valid_position(&candidate) {
                break;
            }
            landed = candidate;
            distance += 1;
        }
        self.active_piece = Some(landed);
        distance
    }

    /// Write the active piece into the board and release it.
    pub fn lock_piece(&mut self) -> bool {
        let Some(active) = self.active_piece.take() else {
            return false;
        };
        self.board.lock_piece(&active);
        true
    }

    /// Remove full rows and add their score. Returns the number of rows cleared.
    pub fn clear_completed_lines(&mut self) -> usize {
        let cleared = self.board.clear_full_rows().len();
        self.score = self.score.saturating_add(line_clear_score(cleared));
        cleared
    }

    /// Return to a fresh lobby state, keeping identity and host flag.
    pub fn reset(&mut self) {
        self.has_lost = false;
        self.score = 0;
        self.board.clear();
        self.active_piece = None;
        self.piece_index = 0;
        self.last_fall_ms = 0;
        self.is_soft_dropping = false;
    }
}
