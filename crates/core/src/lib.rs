//! Core game logic module - pure, deterministic, and testable
//!
//! This crate contains the rules of a multiplayer room: boards, pieces, the shared
//! bag randomizer, scoring, players and the room state machine. It has **zero
//! dependencies** on networking, logging or I/O, which keeps it:
//!
//! - **Deterministic**: seeded sequences and an injected clock reproduce games
//! - **Testable**: every rule is exercised by unit tests
//! - **Serializable by projection**: [`Room::snapshot`] detaches observer state
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 grid with collision detection and line clearing
//! - [`pieces`]: tetromino matrices, clockwise rotation and wall kicks
//! - [`rng`]: shared append-only 7-bag sequence with per-player cursors
//! - [`scoring`]: classic 40/100/300/1200 line clear table
//! - [`player`]: per-participant state (board, piece, score, timers)
//! - [`room`]: lobby/playing/finished state machine, ticks and actions
//! - [`snapshot`]: observer projection of a room
//!
//! # Example
//!
//! ```
//! use tetris_rooms_core::{PieceSequence, PlayerInfo, Room};
//! use tetris_rooms_types::{Difficulty, PlayerAction, RoomStatus};
//!
//! let mut room = Room::new(
//!     PlayerInfo::new("a", "Alice"),
//!     PieceSequence::with_seed(7),
//!     Difficulty::Normal,
//! );
//! assert!(room.add_player(PlayerInfo::new("b", "Bob")));
//! assert!(room.start_game(0));
//!
//! room.handle_player_action("a", PlayerAction::HardDrop);
//! let snapshot = room.tick(1000);
//! assert_eq!(snapshot.status, RoomStatus::Playing);
//! ```

pub mod board;
pub mod pieces;
pub mod player;
pub mod rng;
pub mod room;
pub mod scoring;
pub mod snapshot;

pub use tetris_rooms_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use pieces::{get_shape, rotate_shape, try_rotate, Piece, Shape};
pub use player::{Player, PlayerInfo, Spectator};
pub use rng::PieceSequence;
pub use room::{FinalScore, Room};
pub use scoring::line_clear_score;
pub use snapshot::{PlayerSnapshot, RoomSnapshot};
