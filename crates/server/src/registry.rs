//! Registry module - named rooms shared by every connection
//!
//! Maps a room name to the handle of the task that owns the room. Creation is
//! insert-if-absent under one lock, and removal is keyed by a generation id so
//! a room that tears itself down never evicts a newer room with the same name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};

use crate::protocol::LobbyInfo;
use crate::room_task::RoomCommand;
use crate::types::RoomStatus;

/// Lobby-browser view of a room, published by its task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub status: RoomStatus,
    pub host_name: String,
    pub player_count: usize,
}

/// Cloneable address of a running room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    tx: mpsc::UnboundedSender<RoomCommand>,
    summary: watch::Receiver<RoomSummary>,
    generation: u64,
}

impl RoomHandle {
    pub fn new(
        tx: mpsc::UnboundedSender<RoomCommand>,
        summary: watch::Receiver<RoomSummary>,
        generation: u64,
    ) -> Self {
        Self {
            tx,
            summary,
            generation,
        }
    }

    /// Queue a command. Fails once the room task has exited.
    pub fn send(&self, cmd: RoomCommand) -> Result<(), RoomCommand> {
        self.tx.send(cmd).map_err(|e| e.0)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn summary(&self) -> RoomSummary {
        self.summary.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, RoomHandle>>,
    next_generation: AtomicU64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, RoomHandle>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Option<RoomHandle> {
        self.rooms().get(name).cloned()
    }

    /// Return the room called `name`, creating it with `make` if absent.
    ///
    /// `make` receives the generation id of the new room and runs under the
    /// registry lock. The flag is `true` when the room was created.
    pub fn get_or_create<F>(&self, name: &str, make: F) -> (RoomHandle, bool)
    where
        F: FnOnce(u64) -> RoomHandle,
    {
        let mut rooms = self.rooms();
        if let Some(handle) = rooms.get(name) {
            return (handle.clone(), false);
        }
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let handle = make(generation);
        rooms.insert(name.to_string(), handle.clone());
        (handle, true)
    }

    /// Remove `name` only if it is still the room of `generation`.
    pub fn remove_if_current(&self, name: &str, generation: u64) -> bool {
        let mut rooms = self.rooms();
        match rooms.get(name) {
            Some(handle) if handle.generation == generation => {
                rooms.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Joinable rooms, sorted by name.
    pub fn lobbies(&self) -> Vec<LobbyInfo> {
        let mut lobbies: Vec<LobbyInfo> = self
            .rooms()
            .iter()
            .filter_map(|(name, handle)| {
                let summary = handle.summary.borrow();
                (summary.status == RoomStatus::Lobby).then(|| LobbyInfo {
                    room_name: name.clone(),
                    host_name: summary.host_name.clone(),
                    player_count: summary.player_count,
                })
            })
            .collect();
        lobbies.sort_by(|a, b| a.room_name.cmp(&b.room_name));
        lobbies
    }

    pub fn len(&self) -> usize {
        self.rooms().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms().is_empty()
    }
}
