//! Room module - the per-room game state machine
//!
//! A room moves `Lobby -> Playing -> Finished` (and back to `Lobby` only through
//! an explicit restart). It owns the roster, the spectators and the shared piece
//! sequence. Nothing here blocks or performs I/O: callers serialize `tick` and
//! `handle_player_action` and broadcast the snapshots they return.
//!
//! Time is injected as a millisecond room clock (`now_ms`) so gravity stays
//! deterministic under test.

use crate::player::{Player, PlayerInfo, Spectator};
use crate::rng::PieceSequence;
use crate::snapshot::{PlayerSnapshot, RoomSnapshot};
use crate::types::{Difficulty, PlayerAction, RoomStatus, MAX_PLAYERS_PER_ROOM, NEXT_PREVIEW};

/// Final score of one player, reported when a game finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalScore {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct Room {
    status: RoomStatus,
    players: Vec<Player>,
    spectators: Vec<Spectator>,
    winner: Option<String>,
    /// Name of the player who topped out most recently in this game
    last_topped_out: Option<String>,
    sequence: PieceSequence,
    difficulty: Difficulty,
}

impl Room {
    /// Create a lobby whose only player is the host.
    pub fn new(host: PlayerInfo, sequence: PieceSequence, difficulty: Difficulty) -> Self {
        Self {
            status: RoomStatus::Lobby,
            players: vec![Player::new(host, true)],
            spectators: Vec::new(),
            winner: None,
            last_topped_out: None,
            sequence,
            difficulty,
        }
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn spectators(&self) -> &[Spectator] {
        &self.spectators
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn sequence(&self) -> &PieceSequence {
        &self.sequence
    }

    /// Roster order decides privileges: the first player is the host.
    pub fn is_host(&self, id: &str) -> bool {
        self.players.first().is_some_and(|p| p.id == id)
    }

    pub fn host_name(&self) -> Option<&str> {
        self.players.first().map(|p| p.name.as_str())
    }

    pub fn has_player(&self, id: &str) -> bool {
        self.player_index(id).is_some()
    }

    pub fn has_spectator(&self, id: &str) -> bool {
        self.spectators.iter().any(|s| s.id == id)
    }

    fn player_index(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Append a non-host player. Only succeeds in the lobby.
    pub fn add_player(&mut self, info: PlayerInfo) -> bool {
        if self.status != RoomStatus::Lobby
            || self.players.len() >= MAX_PLAYERS_PER_ROOM
            || self.has_player(&info.id)
        {
            return false;
        }
        self.players.push(Player::new(info, false));
        true
    }

    /// Add a spectator. Idempotent by id and allowed in every status.
    pub fn add_spectator(&mut self, info: PlayerInfo) -> bool {
        if !self.has_spectator(&info.id) {
            self.spectators.push(Spectator::from(info));
        }
        true
    }

    /// Remove a player, migrating host and deciding the winner if needed.
    ///
    /// Returns the number of players left so the caller can tear the room down.
    pub fn remove_player(&mut self, id: &str) -> usize {
        let Some(idx) = self.player_index(id) else {
            return self.players.len();
        };
        let removed = self.players.remove(idx);

        if removed.is_host {
            if let Some(first) = self.players.first_mut() {
                first.is_host = true;
            }
        }

        if self.status == RoomStatus::Playing {
            match self.players.len() {
                1 => {
                    let name = self.players[0].name.clone();
                    self.finish(Some(name));
                }
                n if n >= 2 => self.check_last_standing(),
                _ => {}
            }
        }

        self.players.len()
    }

    pub fn remove_spectator(&mut self, id: &str) -> bool {
        let before = self.spectators.len();
        self.spectators.retain(|s| s.id != id);
        self.spectators.len() != before
    }

    /// Deal every player a first piece and enter `Playing`.
    pub fn start_game(&mut self, now_ms: u64) -> bool {
        if self.status != RoomStatus::Lobby {
            return false;
        }
        self.status = RoomStatus::Playing;
        self.last_topped_out = None;
        for idx in 0..self.players.len() {
            self.players[idx].last_fall_ms = now_ms;
            if !self.assign_next_piece(idx) {
                self.top_out(idx);
            }
        }
        true
    }

    /// Return a started or finished room to the lobby with fresh players.
    pub fn restart(&mut self) -> bool {
        if self.status == RoomStatus::Lobby {
            return false;
        }
        self.status = RoomStatus::Lobby;
        self.winner = None;
        self.last_topped_out = None;
        self.sequence.reset();
        for player in &mut self.players {
            player.reset();
        }
        true
    }

    /// Advance gravity by one room tick.
    ///
    /// Always returns the full snapshot, so observers also see terminal states.
    pub fn tick(&mut self, now_ms: u64) -> RoomSnapshot {
        if self.status == RoomStatus::Playing {
            for idx in 0..self.players.len() {
                if self.status == RoomStatus::Playing {
                    self.apply_gravity(idx, now_ms);
                }
                self.players[idx].is_soft_dropping = false;
            }
        }
        self.snapshot()
    }

    /// Apply one player intent. Invalid intents leave the state untouched.
    pub fn handle_player_action(&mut self, id: &str, action: PlayerAction) -> RoomSnapshot {
        if self.status != RoomStatus::Playing {
            return self.snapshot();
        }
        let Some(idx) = self.player_index(id) else {
            return self.snapshot();
        };
        let player = &mut self.players[idx];
        if player.has_lost || player.active_piece.is_none() {
            return self.snapshot();
        }

        match action {
            PlayerAction::MoveLeft => {
                player.try_move(-1, 0);
            }
            PlayerAction::MoveRight => {
                player.try_move(1, 0);
            }
            PlayerAction::Rotate => {
                player.try_rotate();
            }
            PlayerAction::SoftDrop => player.is_soft_dropping = true,
            PlayerAction::HardDrop => {
                player.drop_to_floor();
                self.settle_piece(idx);
            }
        }

        self.snapshot()
    }

    /// Pure projection of the room; safe in every status.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            status: self.status,
            winner: self.winner.clone(),
            players: self
                .players
                .iter()
                .map(|p| {
                    PlayerSnapshot::from_player(p, self.sequence.peek(p.piece_index, NEXT_PREVIEW))
                })
                .collect(),
            spectators: self.spectators.clone(),
        }
    }

    /// Scores of the current roster, in roster order.
    pub fn final_scores(&self) -> Vec<FinalScore> {
        self.players
            .iter()
            .map(|p| FinalScore {
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }

    fn apply_gravity(&mut self, idx: usize, now_ms: u64) {
        let interval = self.difficulty.fall_interval_ms();
        let player = &mut self.players[idx];
        if player.has_lost || player.active_piece.is_none() {
            return;
        }

        let timed = now_ms.saturating_sub(player.last_fall_ms) >= interval;
        if !timed && !player.is_soft_dropping {
            return;
        }
        if timed {
            player.last_fall_ms = now_ms;
        }

        if !player.try_move(0, 1) {
            self.settle_piece(idx);
        }
    }

    /// Lock the active piece, clear lines, score, and deal the next piece.
    fn settle_piece(&mut self, idx: usize) {
        let player = &mut self.players[idx];
        player.lock_piece();
        player.clear_completed_lines();
        if !self.assign_next_piece(idx) {
            self.top_out(idx);
        }
    }

    fn top_out(&mut self, idx: usize) {
        self.last_topped_out = Some(self.players[idx].name.clone());
        self.check_last_standing();
    }

    /// Draw from the shared sequence and spawn. False when the spawn is blocked.
    fn assign_next_piece(&mut self, idx: usize) -> bool {
        let player = &mut self.players[idx];
        let kind = self.sequence.piece_for_cursor(&mut player.piece_index);
        self.sequence.ensure_len(player.piece_index + NEXT_PREVIEW);
        player.spawn(kind)
    }

    /// Finish the game when at most one player is still alive.
    ///
    /// With nobody alive the most recent top-out wins.
    fn check_last_standing(&mut self) {
        if self.status != RoomStatus::Playing {
            return;
        }
        let alive: Vec<usize> = (0..self.players.len())
            .filter(|&i| !self.players[i].has_lost)
            .collect();

        match alive.as_slice() {
            [] => {
                let winner = self.last_topped_out.clone();
                self.finish(winner);
            }
            [last] if self.players.len() >= 2 => {
                let name = self.players[*last].name.clone();
                self.finish(Some(name));
            }
            _ => {}
        }
    }

    fn finish(&mut self, winner: Option<String>) {
        self.status = RoomStatus::Finished;
        self.winner = winner;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PieceKind, BOARD_HEIGHT};

    fn lobby() -> Room {
        Room::new(
            PlayerInfo::new("alice", "Alice"),
            PieceSequence::with_seed(42),
            Difficulty::Normal,
        )
    }

    #[test]
    fn test_new_room_has_single_host() {
        let room = lobby();
        assert_eq!(room.status(), RoomStatus::Lobby);
        assert_eq!(room.players().len(), 1);
        assert!(room.players()[0].is_host);
        assert!(room.winner().is_none());
    }

    #[test]
    fn test_add_player_rejected_after_start() {
        let mut room = lobby();
        assert!(room.add_player(PlayerInfo::new("bob", "Bob")));
        assert!(room.start_game(0));
        assert!(!room.add_player(PlayerInfo::new("carol", "Carol")));
        assert_eq!(room.players().len(), 2);
    }

    #[test]
    fn test_add_player_rejects_duplicate_and_full_rooms() {
        let mut room = lobby();
        assert!(!room.add_player(PlayerInfo::new("alice", "Again")));
        for i in 1..MAX_PLAYERS_PER_ROOM {
            assert!(room.add_player(PlayerInfo::new(format!("p{i}"), format!("P{i}"))));
        }
        assert!(!room.add_player(PlayerInfo::new("late", "Late")));
    }

    #[test]
    fn test_spectators_are_idempotent() {
        let mut room = lobby();
        room.add_spectator(PlayerInfo::new("s1", "Watcher"));
        room.add_spectator(PlayerInfo::new("s1", "Watcher"));
        assert_eq!(room.spectators().len(), 1);
        assert!(room.remove_spectator("s1"));
        assert!(!room.remove_spectator("s1"));
    }

    #[test]
    fn test_start_deals_centered_pieces() {
        let mut room = lobby();
        room.add_player(PlayerInfo::new("bob", "Bob"));
        room.start_game(0);
        for p in room.players() {
            let piece = p.active_piece.expect("piece dealt");
            assert_eq!(piece.y, 0);
            assert_eq!(piece.x, crate::pieces::spawn_x(piece.shape.size()));
            assert_eq!(p.piece_index, 1);
        }
        // Both players read index 0 of the same sequence.
        assert_eq!(
            room.players()[0].active_piece.unwrap().kind,
            room.players()[1].active_piece.unwrap().kind
        );
    }

    #[test]
    fn test_tick_waits_for_fall_interval() {
        let mut room = lobby();
        room.start_game(0);
        let y0 = room.players()[0].active_piece.unwrap().y;

        room.tick(999);
        assert_eq!(room.players()[0].active_piece.unwrap().y, y0);

        room.tick(1000);
        assert_eq!(room.players()[0].active_piece.unwrap().y, y0 + 1);
        assert_eq!(room.players()[0].last_fall_ms, 1000);
    }

    #[test]
    fn test_soft_drop_is_single_tick() {
        let mut room = lobby();
        room.start_game(0);
        let y0 = room.players()[0].active_piece.unwrap().y;

        room.handle_player_action("alice", PlayerAction::SoftDrop);
        assert!(room.players()[0].is_soft_dropping);
        room.tick(10);
        assert_eq!(room.players()[0].active_piece.unwrap().y, y0 + 1);
        assert!(!room.players()[0].is_soft_dropping);

        room.tick(20);
        assert_eq!(room.players()[0].active_piece.unwrap().y, y0 + 1);
    }

    #[test]
    fn test_gravity_locks_on_floor() {
        let mut room = lobby();
        room.start_game(0);
        let mut now = 0;
        // Enough timed falls to land any piece and lock it.
        for _ in 0..=BOARD_HEIGHT as u64 {
            now += 1000;
            room.tick(now);
        }
        let player = &room.players()[0];
        assert!(player.board.cells().iter().any(|c| c.is_some()));
        assert_eq!(player.piece_index, 2);
    }

    #[test]
    fn test_hard_drop_locks_and_deals_next() {
        let mut room = lobby();
        room.start_game(0);
        let before = room.players()[0].piece_index;
        let kind = room.players()[0].active_piece.unwrap().kind;

        room.handle_player_action("alice", PlayerAction::HardDrop);

        let player = &room.players()[0];
        assert_eq!(player.piece_index, before + 1);
        assert!(player.active_piece.is_some());
        let locked = player.board.cells().iter().filter(|c| **c == Some(kind)).count();
        assert_eq!(locked, 4);
    }

    #[test]
    fn test_actions_ignored_outside_playing() {
        let mut room = lobby();
        let before = room.snapshot();
        let after = room.handle_player_action("alice", PlayerAction::HardDrop);
        assert_eq!(before, after);
    }

    #[test]
    fn test_remove_host_migrates_in_roster_order() {
        let mut room = lobby();
        room.add_player(PlayerInfo::new("bob", "Bob"));
        room.add_player(PlayerInfo::new("carol", "Carol"));

        assert_eq!(room.remove_player("alice"), 2);
        assert!(room.players()[0].is_host);
        assert_eq!(room.players()[0].name, "Bob");
        assert!(!room.players()[1].is_host);
        assert!(room.is_host("bob"));
    }

    #[test]
    fn test_remove_to_single_player_finishes_game() {
        let mut room = lobby();
        room.add_player(PlayerInfo::new("bob", "Bob"));
        room.add_player(PlayerInfo::new("carol", "Carol"));
        room.start_game(0);

        room.remove_player("carol");
        assert_eq!(room.status(), RoomStatus::Playing);

        room.remove_player("bob");
        assert_eq!(room.status(), RoomStatus::Finished);
        assert_eq!(room.winner(), Some("Alice"));
    }

    #[test]
    fn test_remove_unknown_player_is_noop() {
        let mut room = lobby();
        assert_eq!(room.remove_player("nobody"), 1);
    }

    /// Fill rows 2.. except column 0 so a freshly spawned piece cannot fall.
    fn wall_in_spawn(player: &mut Player) {
        for y in 2..BOARD_HEIGHT as i8 {
            for x in 1..10 {
                player.board.set(x, y, Some(PieceKind::I));
            }
        }
    }

    #[test]
    fn test_top_out_finishes_two_player_game() {
        let mut room = lobby();
        room.add_player(PlayerInfo::new("bob", "Bob"));
        room.start_game(0);
        wall_in_spawn(&mut room.players[1]);

        // Every kind covers (4, 1) at spawn, so the next piece cannot fit.
        room.handle_player_action("bob", PlayerAction::HardDrop);

        assert!(room.players()[1].has_lost);
        assert!(room.players()[1].active_piece.is_none());
        assert_eq!(room.status(), RoomStatus::Finished);
        assert_eq!(room.winner(), Some("Alice"));
    }

    #[test]
    fn test_solo_top_out_finishes_with_last_player() {
        let mut room = lobby();
        room.start_game(0);
        wall_in_spawn(&mut room.players[0]);

        room.handle_player_action("alice", PlayerAction::HardDrop);

        assert!(room.players()[0].has_lost);
        assert_eq!(room.status(), RoomStatus::Finished);
        assert_eq!(room.winner(), Some("Alice"));
    }

    #[test]
    fn test_last_alive_leaving_awards_latest_top_out() {
        let mut room = lobby();
        room.add_player(PlayerInfo::new("bob", "Bob"));
        room.add_player(PlayerInfo::new("carol", "Carol"));
        room.add_player(PlayerInfo::new("dave", "Dave"));
        room.start_game(0);

        wall_in_spawn(&mut room.players[1]);
        room.handle_player_action("bob", PlayerAction::HardDrop);
        assert!(room.players()[1].has_lost);
        assert_eq!(room.status(), RoomStatus::Playing);

        // Staged directly: Dave and then Carol top out while Alice is still alive.
        room.players[3].has_lost = true;
        room.players[2].has_lost = true;
        room.last_topped_out = Some("Carol".to_string());
        room.remove_player("alice");

        assert_eq!(room.status(), RoomStatus::Finished);
        assert_eq!(room.winner(), Some("Carol"));
    }

    #[test]
    fn test_restart_returns_to_lobby() {
        let mut room = lobby();
        room.add_player(PlayerInfo::new("bob", "Bob"));
        room.start_game(0);
        room.handle_player_action("alice", PlayerAction::HardDrop);
        room.remove_player("bob");
        assert_eq!(room.status(), RoomStatus::Finished);

        assert!(room.restart());
        assert_eq!(room.status(), RoomStatus::Lobby);
        assert!(room.winner().is_none());
        assert!(room.sequence().is_empty());
        let alice = &room.players()[0];
        assert_eq!(alice.piece_index, 0);
        assert!(alice.active_piece.is_none());
        assert!(room.add_player(PlayerInfo::new("dave", "Dave")));
        assert!(!room.restart());
    }

    #[test]
    fn test_snapshot_preview_follows_cursor() {
        let mut room = lobby();
        room.start_game(0);
        let snap = room.snapshot();
        let alice = snap.player("alice").unwrap();
        assert_eq!(alice.next_pieces.len(), NEXT_PREVIEW);
        assert_eq!(alice.next_pieces, room.sequence().peek(1, NEXT_PREVIEW));
    }
}
