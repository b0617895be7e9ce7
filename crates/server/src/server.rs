//! TCP server for room clients
//!
//! Accepts connections, assigns each a `conn-<n>` id and runs one reader loop
//! plus one writer task per connection. Game commands are forwarded to the
//! owning room task; lobby-browser and leaderboard requests are answered here.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, Notify, RwLock};

use crate::core::PlayerInfo;
use crate::error::JoinError;
use crate::leaderboard::LeaderboardStore;
use crate::protocol::{parse_message, ClientMessage, ServerMessage};
use crate::registry::{RoomHandle, RoomRegistry};
use crate::room_task::{spawn_room, LineSender, RoomCommand, RoomContext, RoomSpec};
use crate::types::{Difficulty, DEFAULT_TICK_MS};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tick_ms: u64,
    /// JSON leaderboard file; in-memory when unset
    pub leaderboard_path: Option<String>,
    /// Entries returned by `getLeaderboard` without an explicit limit
    pub leaderboard_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            tick_ms: DEFAULT_TICK_MS,
            leaderboard_path: None,
            leaderboard_limit: 10,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let host = env::var("TETRIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("TETRIS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7777);

        let tick_ms = env::var("TETRIS_TICK_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&ms| ms > 0)
            .unwrap_or(DEFAULT_TICK_MS);

        let leaderboard_path = env::var("TETRIS_LEADERBOARD_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        let leaderboard_limit = env::var("TETRIS_LEADERBOARD_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self {
            host,
            port,
            tick_ms,
            leaderboard_path,
            leaderboard_limit,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// Handle to a connected client
struct ClientHandle {
    tx: LineSender,
    in_lobby_browser: bool,
    room: Option<RoomHandle>,
}

/// Shared server state
struct ServerState<L> {
    config: ServerConfig,
    rooms: RoomContext<L>,
    clients: RwLock<HashMap<String, ClientHandle>>,
}

/// Start the TCP server.
///
/// `ready_tx` receives the bound address once the listener is up.
pub async fn run_server<L: LeaderboardStore>(
    config: ServerConfig,
    leaderboard: Arc<L>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let bound = listener.local_addr()?;
    tracing::info!(addr = %bound, "Room server listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState {
        rooms: RoomContext {
            registry: Arc::new(RoomRegistry::new()),
            leaderboard,
            lobby_notify: Arc::new(Notify::new()),
            tick: Duration::from_millis(config.tick_ms),
        },
        config,
        clients: RwLock::new(HashMap::new()),
    });

    // Lobby browser refresher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                state.rooms.lobby_notify.notified().await;
                broadcast_lobbies(&state).await;
            }
        });
    }

    let mut conn_counter = 0u64;
    loop {
        let (socket, addr) = listener.accept().await?;
        conn_counter += 1;
        let conn_id = format!("conn-{}", conn_counter);

        tracing::info!(conn = %conn_id, %addr, "Client connected");

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, conn_id.clone(), state).await {
                tracing::warn!(conn = %conn_id, error = %e, "Client error");
            }
            tracing::info!(conn = %conn_id, "Client disconnected");
        });
    }
}

async fn broadcast_lobbies<L>(state: &ServerState<L>) {
    let lobbies = state.rooms.registry.lobbies();
    let line = match (ServerMessage::LobbiesListUpdate { lobbies }).to_line() {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode lobbies");
            return;
        }
    };
    let clients = state.clients.read().await;
    for c in clients.values().filter(|c| c.in_lobby_browser) {
        let _ = c.tx.send(line.clone());
    }
    tracing::debug!("Broadcasted lobbies list");
}

fn send(tx: &LineSender, msg: ServerMessage) {
    match msg.to_line() {
        Ok(line) => {
            let _ = tx.send(line);
        }
        Err(e) => tracing::warn!(error = %e, "Failed to encode message"),
    }
}

/// Handle a single client connection
async fn handle_client<L: LeaderboardStore>(
    socket: TcpStream,
    conn_id: String,
    state: Arc<ServerState<L>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut lines = BufReader::new(reader).lines();

    // Channel to send lines to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    {
        let mut clients = state.clients.write().await;
        clients.insert(
            conn_id.clone(),
            ClientHandle {
                tx: tx.clone(),
                in_lobby_browser: false,
                room: None,
            },
        );
    }

    // Spawn task to write lines to client
    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let result = read_loop(&mut lines, &conn_id, &tx, &state).await;

    // Clean up: leave the room and forget the client.
    let room = {
        let mut clients = state.clients.write().await;
        clients.remove(&conn_id).and_then(|c| c.room)
    };
    if let Some(room) = room {
        let _ = room.send(RoomCommand::Leave {
            conn_id: conn_id.clone(),
        });
    }

    // Room tasks drop their copy of the sender once they process the leave.
    drop(tx);
    let _ = write_task.await;

    result
}

async fn read_loop<L: LeaderboardStore, R>(
    lines: &mut tokio::io::Lines<R>,
    conn_id: &str,
    tx: &LineSender,
    state: &Arc<ServerState<L>>,
) -> anyhow::Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let msg = match parse_message(trimmed) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(conn = %conn_id, error = %e, "Invalid message");
                send(tx, ServerMessage::error("invalid message"));
                continue;
            }
        };

        match msg {
            ClientMessage::EnterLobbyBrowser => {
                set_lobby_browser(state, conn_id, true).await;
                let lobbies = state.rooms.registry.lobbies();
                send(tx, ServerMessage::LobbiesListUpdate { lobbies });
            }
            ClientMessage::LeaveLobbyBrowser => {
                set_lobby_browser(state, conn_id, false).await;
            }
            ClientMessage::JoinGame {
                room_name,
                player_name,
                is_spectator,
                difficulty,
            } => {
                tracing::info!(
                    conn = %conn_id,
                    room = %room_name,
                    player = %player_name,
                    spectator = is_spectator,
                    "Join requested"
                );
                let request = JoinRequest {
                    room_name,
                    player: PlayerInfo::new(conn_id, player_name),
                    is_spectator,
                    difficulty: difficulty.unwrap_or_default(),
                };
                if let Err(e) = join_game(state, request, tx).await {
                    send(tx, ServerMessage::error(e.to_string()));
                }
            }
            ClientMessage::StartGame => {
                forward(state, conn_id, RoomCommand::Start {
                    conn_id: conn_id.to_string(),
                })
                .await;
            }
            ClientMessage::PlayerAction { action } => {
                forward(state, conn_id, RoomCommand::Action {
                    conn_id: conn_id.to_string(),
                    action,
                })
                .await;
            }
            ClientMessage::LeaveGame => {
                let room = {
                    let mut clients = state.clients.write().await;
                    clients.get_mut(conn_id).and_then(|c| c.room.take())
                };
                if let Some(room) = room {
                    let _ = room.send(RoomCommand::Leave {
                        conn_id: conn_id.to_string(),
                    });
                }
            }
            ClientMessage::RestartGame => {
                forward(state, conn_id, RoomCommand::Restart {
                    conn_id: conn_id.to_string(),
                })
                .await;
            }
            ClientMessage::GetLeaderboard { limit } => {
                let limit = limit.unwrap_or(state.config.leaderboard_limit);
                match state.rooms.leaderboard.leaderboard(limit).await {
                    Ok(entries) => send(tx, ServerMessage::LeaderboardUpdate { entries }),
                    Err(e) => {
                        tracing::warn!(conn = %conn_id, error = %e, "Leaderboard read failed");
                        send(tx, ServerMessage::error("leaderboard unavailable"));
                    }
                }
            }
        }
    }

    Ok(())
}

async fn set_lobby_browser<L>(state: &ServerState<L>, conn_id: &str, on: bool) {
    let mut clients = state.clients.write().await;
    if let Some(c) = clients.get_mut(conn_id) {
        c.in_lobby_browser = on;
    }
}

/// The live room of a connection; a room that already shut down counts as none.
async fn current_room<L>(state: &ServerState<L>, conn_id: &str) -> Option<RoomHandle> {
    let clients = state.clients.read().await;
    clients
        .get(conn_id)
        .and_then(|c| c.room.clone())
        .filter(|room| !room.is_closed())
}

async fn forward<L>(state: &ServerState<L>, conn_id: &str, cmd: RoomCommand) {
    if let Some(room) = current_room(state, conn_id).await {
        let _ = room.send(cmd);
    }
}

struct JoinRequest {
    room_name: String,
    player: PlayerInfo,
    is_spectator: bool,
    difficulty: Difficulty,
}

enum JoinAttempt {
    Joined,
    Rejected(JoinError),
    /// The room task exited between lookup and join
    Gone,
}

async fn join_game<L: LeaderboardStore>(
    state: &Arc<ServerState<L>>,
    request: JoinRequest,
    tx: &LineSender,
) -> Result<(), JoinError> {
    let conn_id = request.player.id.clone();
    if current_room(state, &conn_id).await.is_some() {
        return Err(JoinError::AlreadyInRoom);
    }

    let registry = &state.rooms.registry;
    let handle = loop {
        if request.is_spectator {
            let handle = registry.get(&request.room_name).ok_or(JoinError::RoomNotFound)?;
            match request_join(&handle, request.player.clone(), true, tx).await {
                JoinAttempt::Joined => break handle,
                JoinAttempt::Rejected(e) => return Err(e),
                JoinAttempt::Gone => return Err(JoinError::RoomNotFound),
            }
        }

        let (handle, created) = registry.get_or_create(&request.room_name, |generation| {
            spawn_room(
                state.rooms.clone(),
                RoomSpec {
                    name: request.room_name.clone(),
                    generation,
                    host: request.player.clone(),
                    host_tx: tx.clone(),
                    difficulty: request.difficulty,
                },
            )
        });
        if created {
            break handle;
        }
        match request_join(&handle, request.player.clone(), false, tx).await {
            JoinAttempt::Joined => break handle,
            JoinAttempt::Rejected(e) => return Err(e),
            JoinAttempt::Gone => {
                registry.remove_if_current(&request.room_name, handle.generation());
            }
        }
    };

    let mut clients = state.clients.write().await;
    if let Some(c) = clients.get_mut(&conn_id) {
        c.room = Some(handle);
    }
    Ok(())
}

async fn request_join(
    handle: &RoomHandle,
    member: PlayerInfo,
    spectator: bool,
    tx: &LineSender,
) -> JoinAttempt {
    let (reply, reply_rx) = oneshot::channel();
    let cmd = RoomCommand::Join {
        member,
        spectator,
        tx: tx.clone(),
        reply,
    };
    if handle.send(cmd).is_err() {
        return JoinAttempt::Gone;
    }
    match reply_rx.await {
        Ok(Ok(())) => JoinAttempt::Joined,
        Ok(Err(e)) => JoinAttempt::Rejected(e),
        Err(_) => JoinAttempt::Gone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_binds_ephemeral_port() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 0);
        assert_eq!(config.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:0");
    }

    #[test]
    fn test_invalid_host_is_an_error() {
        let config = ServerConfig {
            host: "not an address".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
