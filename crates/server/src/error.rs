//! Errors reported back to the requesting connection.

use thiserror::Error;

/// Why a `joinGame` request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    /// Spectators can only watch an existing room.
    #[error("room does not exist")]
    RoomNotFound,
    #[error("game already started or room is full")]
    RoomClosed,
    #[error("already in a room")]
    AlreadyInRoom,
}
