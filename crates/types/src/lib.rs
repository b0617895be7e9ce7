//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the room server.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core simulation, registry, wire protocol).
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19)
//!
//! Pieces spawn at `y = 0`, horizontally centered for their matrix size.
//!
//! # Timing
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_TICK_MS` | 50 | Room simulation tick |
//! | `Difficulty::Normal` | 1000 | Gravity interval (ms per row) |
//! | `Difficulty::Fast` | 500 | Gravity interval (ms per row) |
//! | `Difficulty::Hardcore` | 250 | Gravity interval (ms per row) |
//!
//! # Examples
//!
//! ```
//! use tetris_rooms_types::{PieceKind, PlayerAction, RoomStatus, BOARD_WIDTH, BOARD_HEIGHT};
//!
//! assert_eq!(PieceKind::T.as_str(), "T");
//! assert_eq!(PieceKind::T.id(), 3);
//!
//! let action = PlayerAction::from_str("hardDrop").unwrap();
//! assert_eq!(action, PlayerAction::HardDrop);
//!
//! assert_eq!(RoomStatus::Lobby.as_str(), "lobby");
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Default room tick interval in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 50;

/// Number of upcoming pieces exposed per player in snapshots.
pub const NEXT_PREVIEW: usize = 3;

/// Maximum number of players admitted into a single room.
pub const MAX_PLAYERS_PER_ROOM: usize = 8;

/// Horizontal offsets tried, in order, when a rotation collides.
pub const KICK_OFFSETS: [i8; 5] = [0, -1, 1, -2, 2];

/// Line clear scoring table (Classic Nintendo scoring)
///
/// Base points for clearing N lines at once:
/// - 0 lines: 0 points
/// - 1 line: 40 points
/// - 2 lines: 100 points
/// - 3 lines: 300 points
/// - 4 lines: 1200 points (Tetris!)
///
/// Clients classify feedback from these exact score deltas.
pub const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];

/// The seven tetromino piece kinds
///
/// - **I**: horizontal bar
/// - **O**: 2x2 square (never rotates)
/// - **T**: T-shaped
/// - **S**: S-shaped
/// - **Z**: Z-shaped (mirror of S)
/// - **J**: J-shaped
/// - **L**: L-shaped (mirror of J)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// All kinds in canonical bag order.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Uppercase letter used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::O => "O",
            PieceKind::T => "T",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::J => "J",
            PieceKind::L => "L",
        }
    }

    /// Non-zero board cell identifier for this kind (1..=7).
    pub fn id(&self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::O => 2,
            PieceKind::T => 3,
            PieceKind::S => 4,
            PieceKind::Z => 5,
            PieceKind::J => 6,
            PieceKind::L => 7,
        }
    }
}

/// A cell on the game board
///
/// - `None`: Empty cell
/// - `Some(PieceKind)`: Cell filled by a locked piece of that kind
pub type Cell = Option<PieceKind>;

/// Wire identifier for a board cell (`0` = empty).
pub fn cell_id(cell: Cell) -> u8 {
    cell.map(|k| k.id()).unwrap_or(0)
}

/// Player intents delivered through `playerAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Rotate piece 90° clockwise, with horizontal wall kicks
    Rotate,
    /// Request one extra gravity step on the next tick
    SoftDrop,
    /// Drop to the lowest valid row and lock immediately
    HardDrop,
}

impl PlayerAction {
    /// Parse action from its camelCase wire name (case-insensitive)
    ///
    /// ```
    /// use tetris_rooms_types::PlayerAction;
    ///
    /// assert_eq!(PlayerAction::from_str("moveLeft"), Some(PlayerAction::MoveLeft));
    /// assert_eq!(PlayerAction::from_str("ROTATE"), Some(PlayerAction::Rotate));
    /// assert_eq!(PlayerAction::from_str("hold"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(PlayerAction::MoveLeft),
            "moveright" => Some(PlayerAction::MoveRight),
            "rotate" => Some(PlayerAction::Rotate),
            "softdrop" => Some(PlayerAction::SoftDrop),
            "harddrop" => Some(PlayerAction::HardDrop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerAction::MoveLeft => "moveLeft",
            PlayerAction::MoveRight => "moveRight",
            PlayerAction::Rotate => "rotate",
            PlayerAction::SoftDrop => "softDrop",
            PlayerAction::HardDrop => "hardDrop",
        }
    }
}

/// Room lifecycle: `Lobby -> Playing -> Finished`, back to `Lobby` only via restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomStatus {
    Lobby,
    Playing,
    Finished,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Lobby => "lobby",
            RoomStatus::Playing => "playing",
            RoomStatus::Finished => "finished",
        }
    }
}

/// Room difficulty, fixed by the room creator.
///
/// Controls gravity and the leaderboard ranking weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    #[default]
    Normal,
    Fast,
    Hardcore,
}

impl Difficulty {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(Difficulty::Normal),
            "fast" => Some(Difficulty::Fast),
            "hardcore" => Some(Difficulty::Hardcore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Normal => "normal",
            Difficulty::Fast => "fast",
            Difficulty::Hardcore => "hardcore",
        }
    }

    /// Gravity interval in milliseconds per row.
    pub fn fall_interval_ms(&self) -> u64 {
        match self {
            Difficulty::Normal => 1000,
            Difficulty::Fast => 500,
            Difficulty::Hardcore => 250,
        }
    }

    /// Leaderboard weight as a `(numerator, denominator)` pair.
    pub fn score_weight(&self) -> (u64, u64) {
        match self {
            Difficulty::Normal => (1, 1),
            Difficulty::Fast => (3, 2),
            Difficulty::Hardcore => (2, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_scores_match_classic_table() {
        assert_eq!(LINE_SCORES[1], 40);
        assert_eq!(LINE_SCORES[2], 100);
        assert_eq!(LINE_SCORES[3], 300);
        assert_eq!(LINE_SCORES[4], 1200);
    }

    #[test]
    fn piece_ids_are_distinct_and_non_zero() {
        let mut ids: Vec<u8> = PieceKind::ALL.iter().map(|k| k.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 7);
        assert!(ids.iter().all(|&id| id != 0));
        assert_eq!(cell_id(None), 0);
        assert_eq!(cell_id(Some(PieceKind::L)), 7);
    }

    #[test]
    fn action_names_roundtrip() {
        for action in [
            PlayerAction::MoveLeft,
            PlayerAction::MoveRight,
            PlayerAction::Rotate,
            PlayerAction::SoftDrop,
            PlayerAction::HardDrop,
        ] {
            assert_eq!(PlayerAction::from_str(action.as_str()), Some(action));
        }
    }

    #[test]
    fn difficulty_defaults_and_weights() {
        assert_eq!(Difficulty::default(), Difficulty::Normal);
        assert_eq!(Difficulty::from_str("HARDCORE"), Some(Difficulty::Hardcore));
        assert_eq!(Difficulty::Fast.score_weight(), (3, 2));
        assert!(Difficulty::Hardcore.fall_interval_ms() < Difficulty::Normal.fall_interval_ms());
    }
}
