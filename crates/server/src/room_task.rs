//! Room task - one actor per room
//!
//! The task owns the [`Room`], its member connections and the tick timer.
//! Commands arrive through an unbounded inbox and are applied one at a time,
//! interleaved with ticks, so the room never sees concurrent mutation. The
//! timer is only polled while the room is playing.
//!
//! After every change the task:
//!
//! - broadcasts `gameStateUpdate` to every player and spectator
//! - publishes a fresh [`RoomSummary`] and wakes the lobby browser when it changed
//! - submits final scores to the leaderboard on the transition into `finished`
//!
//! The task removes itself from the registry and exits when its last player
//! leaves.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch, Notify};
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::{FinalScore, PieceSequence, PlayerInfo, Room, RoomSnapshot};
use crate::error::JoinError;
use crate::leaderboard::{LeaderboardStore, NewScore};
use crate::protocol::{GameStateWire, ServerMessage};
use crate::registry::{RoomHandle, RoomRegistry, RoomSummary};
use crate::types::{Difficulty, PlayerAction, RoomStatus};

/// Outbound line channel of one connection.
pub type LineSender = mpsc::UnboundedSender<String>;

/// Messages accepted by a room task.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        member: PlayerInfo,
        spectator: bool,
        tx: LineSender,
        reply: oneshot::Sender<Result<(), JoinError>>,
    },
    Start {
        conn_id: String,
    },
    Action {
        conn_id: String,
        action: PlayerAction,
    },
    Leave {
        conn_id: String,
    },
    Restart {
        conn_id: String,
    },
}

/// Shared services every room task needs.
pub struct RoomContext<L> {
    pub registry: Arc<RoomRegistry>,
    pub leaderboard: Arc<L>,
    pub lobby_notify: Arc<Notify>,
    pub tick: Duration,
}

impl<L> Clone for RoomContext<L> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            leaderboard: Arc::clone(&self.leaderboard),
            lobby_notify: Arc::clone(&self.lobby_notify),
            tick: self.tick,
        }
    }
}

/// Creation parameters of a room.
pub struct RoomSpec {
    pub name: String,
    pub generation: u64,
    pub host: PlayerInfo,
    pub host_tx: LineSender,
    pub difficulty: Difficulty,
}

/// Spawn the task for a new room whose first player is `spec.host`.
pub fn spawn_room<L: LeaderboardStore>(ctx: RoomContext<L>, spec: RoomSpec) -> RoomHandle {
    let RoomSpec {
        name,
        generation,
        host,
        host_tx,
        difficulty,
    } = spec;

    let host_id = host.id.clone();
    let room = Room::new(host, PieceSequence::from_entropy(), difficulty);
    let (summary_tx, summary_rx) = watch::channel(summarize(&room));
    let (tx, rx) = mpsc::unbounded_channel();

    let mut members = HashMap::new();
    members.insert(host_id, host_tx);

    let task = RoomTask {
        name,
        generation,
        room,
        members,
        summary_tx,
        clock: Instant::now(),
        ctx,
    };
    tokio::spawn(task.run(rx));

    RoomHandle::new(tx, summary_rx, generation)
}

fn summarize(room: &Room) -> RoomSummary {
    RoomSummary {
        status: room.status(),
        host_name: room.host_name().unwrap_or_default().to_string(),
        player_count: room.players().len(),
    }
}

struct RoomTask<L> {
    name: String,
    generation: u64,
    room: Room,
    /// Every connection that receives state updates, players and spectators
    members: HashMap<String, LineSender>,
    summary_tx: watch::Sender<RoomSummary>,
    /// Origin of the room clock handed to the game
    clock: Instant,
    ctx: RoomContext<L>,
}

enum Flow {
    Continue,
    Empty,
}

impl<L: LeaderboardStore> RoomTask<L> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RoomCommand>) {
        tracing::info!(room = %self.name, difficulty = self.room.difficulty().as_str(), "Room created");
        self.broadcast(&self.room.snapshot());
        self.ctx.lobby_notify.notify_one();

        let mut ticker = tokio::time::interval(self.ctx.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let playing = self.room.status() == RoomStatus::Playing;
            tokio::select! {
                cmd = rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    let started = matches!(cmd, RoomCommand::Start { .. });
                    if let Flow::Empty = self.handle(cmd) {
                        break;
                    }
                    if started && self.room.status() == RoomStatus::Playing {
                        ticker.reset();
                    }
                }
                _ = ticker.tick(), if playing => {
                    let before = self.room.status();
                    let snapshot = self.room.tick(self.now_ms());
                    self.after_change(before, &snapshot);
                }
            }
        }

        self.ctx.registry.remove_if_current(&self.name, self.generation);
        self.ctx.lobby_notify.notify_one();
        tracing::info!(room = %self.name, "Room closed");
    }

    fn now_ms(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    fn handle(&mut self, cmd: RoomCommand) -> Flow {
        let before = self.room.status();
        match cmd {
            RoomCommand::Join {
                member,
                spectator,
                tx,
                reply,
            } => {
                let conn_id = member.id.clone();
                let admitted = if spectator {
                    self.room.add_spectator(member)
                } else {
                    self.room.add_player(member)
                };
                if !admitted {
                    let _ = reply.send(Err(JoinError::RoomClosed));
                    return Flow::Continue;
                }
                tracing::debug!(room = %self.name, conn = %conn_id, spectator, "Member joined");
                self.members.insert(conn_id, tx);
                let _ = reply.send(Ok(()));
            }
            RoomCommand::Start { conn_id } => {
                if !self.room.is_host(&conn_id) || !self.room.start_game(self.now_ms()) {
                    return Flow::Continue;
                }
                tracing::info!(room = %self.name, players = self.room.players().len(), "Game started");
            }
            RoomCommand::Action { conn_id, action } => {
                let snapshot = self.room.handle_player_action(&conn_id, action);
                self.after_change(before, &snapshot);
                return Flow::Continue;
            }
            RoomCommand::Leave { conn_id } => {
                self.members.remove(&conn_id);
                if self.room.has_player(&conn_id) {
                    if self.room.remove_player(&conn_id) == 0 {
                        return Flow::Empty;
                    }
                } else if !self.room.remove_spectator(&conn_id) {
                    return Flow::Continue;
                }
                tracing::debug!(room = %self.name, conn = %conn_id, "Member left");
            }
            RoomCommand::Restart { conn_id } => {
                if !self.room.is_host(&conn_id) || !self.room.restart() {
                    return Flow::Continue;
                }
                tracing::info!(room = %self.name, "Room restarted");
            }
        }

        let snapshot = self.room.snapshot();
        self.after_change(before, &snapshot);
        Flow::Continue
    }

    fn after_change(&mut self, before: RoomStatus, snapshot: &RoomSnapshot) {
        if before != RoomStatus::Finished && snapshot.status == RoomStatus::Finished {
            tracing::info!(
                room = %self.name,
                winner = snapshot.winner.as_deref().unwrap_or("-"),
                "Game finished"
            );
            self.submit_scores();
        }
        self.broadcast(snapshot);
        self.publish_summary();
    }

    fn broadcast(&self, snapshot: &RoomSnapshot) {
        let msg = ServerMessage::GameStateUpdate {
            state: GameStateWire::from(snapshot),
        };
        let line = match msg.to_line() {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(room = %self.name, error = %e, "Failed to encode state");
                return;
            }
        };
        for tx in self.members.values() {
            // A closed channel means the connection is going away; its leave follows.
            let _ = tx.send(line.clone());
        }
    }

    fn publish_summary(&self) {
        let next = summarize(&self.room);
        let changed = self.summary_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            self.ctx.lobby_notify.notify_one();
        }
    }

    fn submit_scores(&self) {
        let difficulty = self.room.difficulty();
        for FinalScore { name, score } in self.room.final_scores() {
            let store = Arc::clone(&self.ctx.leaderboard);
            let room = self.name.clone();
            tokio::spawn(async move {
                if let Err(e) = store
                    .add_score(NewScore {
                        name,
                        score,
                        difficulty,
                    })
                    .await
                {
                    tracing::warn!(room = %room, error = %e, "Failed to record score");
                }
            });
        }
    }
}
