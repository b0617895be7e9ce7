use crate::pieces::Piece;
use crate::player::{Player, Spectator};
use crate::types::{PieceKind, RoomStatus};

/// Observer view of one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub is_host: bool,
    pub has_lost: bool,
    pub score: u32,
    /// Rows of cell ids, top row first (`0` = empty)
    pub board: Vec<Vec<u8>>,
    pub active_piece: Option<Piece>,
    pub next_pieces: Vec<PieceKind>,
}

impl PlayerSnapshot {
    pub fn from_player(player: &Player, next_pieces: &[PieceKind]) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            is_host: player.is_host,
            has_lost: player.has_lost,
            score: player.score,
            board: player.board.to_rows(),
            active_piece: player.active_piece,
            next_pieces: next_pieces.to_vec(),
        }
    }
}

/// Complete, detached projection of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub status: RoomStatus,
    pub winner: Option<String>,
    pub players: Vec<PlayerSnapshot>,
    pub spectators: Vec<Spectator>,
}

impl RoomSnapshot {
    pub fn player(&self, id: &str) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn host(&self) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.is_host)
    }
}
