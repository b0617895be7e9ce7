//! Room server - named multiplayer rooms over TCP with a JSON line protocol
//!
//! Each room runs as its own tokio task that owns the game state and a tick
//! timer. Connections talk to rooms only through the room's command inbox, so
//! ticks and player input for one room are applied strictly in order while
//! separate rooms run independently.
//!
//! # Protocol Overview
//!
//! One JSON object per line, tagged by `type`:
//!
//! ## Client → Server
//!
//! - **enterLobbyBrowser** / **leaveLobbyBrowser**: subscribe to joinable rooms
//! - **joinGame**: `{roomName, playerName, isSpectator, difficulty?}`
//! - **startGame** / **restartGame**: host only
//! - **playerAction**: `{action}` with `moveLeft`, `moveRight`, `rotate`, `softDrop`, `hardDrop`
//! - **leaveGame**: leave the current room
//! - **getLeaderboard**: `{limit?}`
//!
//! ## Server → Client
//!
//! - **gameStateUpdate**: full room snapshot after every change and tick
//! - **lobbiesListUpdate**: rooms still in the lobby
//! - **leaderboardUpdate**: ranked scores
//! - **error**: `{message}` sent to the requester only
//!
//! # Environment Variables
//!
//! - `TETRIS_HOST`: Bind address (default: "127.0.0.1")
//! - `TETRIS_PORT`: Port number (default: 7777)
//! - `TETRIS_TICK_MS`: Room tick interval in milliseconds (default: 50)
//! - `TETRIS_LEADERBOARD_PATH`: JSON leaderboard file (default: in-memory)
//! - `TETRIS_LEADERBOARD_LIMIT`: Default `getLeaderboard` size (default: 10)
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"joinGame","roomName":"r1","playerName":"Alice","isSpectator":false}
//! Server -> Client: {"type":"gameStateUpdate","state":{"status":"lobby","winner":null,"players":[...],"spectators":[]}}
//! Client -> Server: {"type":"startGame"}
//! Client -> Server: {"type":"playerAction","action":"hardDrop"}
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7777
//! {"type":"joinGame","roomName":"r1","playerName":"test","isSpectator":false}
//! ```

pub mod error;
pub mod leaderboard;
pub mod protocol;
pub mod registry;
pub mod room_task;
pub mod server;

pub use tetris_rooms_core as core;
pub use tetris_rooms_types as types;

pub use error::JoinError;
pub use leaderboard::{FileLeaderboard, LeaderboardEntry, LeaderboardStore, MemoryLeaderboard, NewScore};
pub use registry::{RoomHandle, RoomRegistry, RoomSummary};
pub use server::{run_server, ServerConfig};
