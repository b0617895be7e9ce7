//! Tetris rooms (workspace facade crate).
//!
//! Re-exports the member crates as `tetris_rooms::{core, server, types}` while the
//! implementation lives in dedicated crates under `crates/`.

pub use tetris_rooms_core as core;
pub use tetris_rooms_server as server;
pub use tetris_rooms_types as types;
