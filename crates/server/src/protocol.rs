//! Protocol module - line-delimited JSON messages
//!
//! Every line is one JSON object tagged by `"type"`. Field names are camelCase
//! on the wire. Enumerations from the types crate are carried as strings and
//! parsed case-insensitively.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{Piece, PlayerSnapshot, RoomSnapshot, Spectator};
use crate::leaderboard::LeaderboardEntry;
use crate::types::{Difficulty, PieceKind, PlayerAction};

// ============== Client -> Server Messages ==============

/// Inbound message from a connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    EnterLobbyBrowser,
    LeaveLobbyBrowser,
    #[serde(rename_all = "camelCase")]
    JoinGame {
        room_name: String,
        player_name: String,
        #[serde(default)]
        is_spectator: bool,
        #[serde(default, deserialize_with = "difficulty_opt::deserialize")]
        difficulty: Option<Difficulty>,
    },
    StartGame,
    PlayerAction {
        #[serde(deserialize_with = "action_str")]
        action: PlayerAction,
    },
    LeaveGame,
    RestartGame,
    GetLeaderboard {
        #[serde(default)]
        limit: Option<usize>,
    },
}

/// Parse one inbound line.
pub fn parse_message(line: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(line.trim())
}

// ============== Server -> Client Messages ==============

/// Outbound message to a connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    GameStateUpdate { state: GameStateWire },
    LobbiesListUpdate { lobbies: Vec<LobbyInfo> },
    LeaderboardUpdate { entries: Vec<LeaderboardEntry> },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize as one newline-terminated line.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// One joinable room in the lobby browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyInfo {
    pub room_name: String,
    pub host_name: String,
    pub player_count: usize,
}

/// Wire form of a room snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStateWire {
    pub status: &'static str,
    pub winner: Option<String>,
    pub players: Vec<PlayerWire>,
    pub spectators: Vec<SpectatorWire>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub id: String,
    pub name: String,
    pub is_host: bool,
    pub has_lost: bool,
    pub score: u32,
    pub board: Vec<Vec<u8>>,
    pub active_piece: Option<ActivePieceWire>,
    pub next_pieces: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivePieceWire {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub shape: Vec<Vec<u8>>,
    pub position: PositionWire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionWire {
    pub x: i8,
    pub y: i8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpectatorWire {
    pub id: String,
    pub name: String,
}

impl From<&Piece> for ActivePieceWire {
    fn from(piece: &Piece) -> Self {
        Self {
            kind: piece.kind.as_str(),
            shape: piece.shape.to_rows(),
            position: PositionWire {
                x: piece.x,
                y: piece.y,
            },
        }
    }
}

impl From<&PlayerSnapshot> for PlayerWire {
    fn from(p: &PlayerSnapshot) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            is_host: p.is_host,
            has_lost: p.has_lost,
            score: p.score,
            board: p.board.clone(),
            active_piece: p.active_piece.as_ref().map(ActivePieceWire::from),
            next_pieces: p.next_pieces.iter().map(PieceKind::as_str).collect(),
        }
    }
}

impl From<&Spectator> for SpectatorWire {
    fn from(s: &Spectator) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
        }
    }
}

impl From<&RoomSnapshot> for GameStateWire {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            status: snapshot.status.as_str(),
            winner: snapshot.winner.clone(),
            players: snapshot.players.iter().map(PlayerWire::from).collect(),
            spectators: snapshot.spectators.iter().map(SpectatorWire::from).collect(),
        }
    }
}

// ============== String codecs ==============

fn action_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PlayerAction, D::Error> {
    let s = String::deserialize(deserializer)?;
    PlayerAction::from_str(&s).ok_or_else(|| serde::de::Error::custom("unknown action"))
}

pub(crate) mod difficulty_str {
    use super::*;

    pub fn serialize<S: Serializer>(difficulty: &Difficulty, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(difficulty.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Difficulty, D::Error> {
        let s = String::deserialize(deserializer)?;
        Difficulty::from_str(&s).ok_or_else(|| serde::de::Error::custom("invalid difficulty"))
    }
}

mod difficulty_opt {
    use super::*;

    // `null` and a missing field both mean "room default"
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Difficulty>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) => Difficulty::from_str(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("invalid difficulty")),
        }
    }
}
