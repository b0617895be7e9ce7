//! Leaderboard module - cross-room score persistence
//!
//! Scores are appended when a game finishes and read back ordered by their
//! difficulty-weighted value. Two stores are provided: an in-memory one and a
//! JSON file that is loaded once at boot and rewritten on every append.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::types::Difficulty;

/// A score submitted at the end of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub name: String,
    pub score: u32,
    pub difficulty: Difficulty,
}

/// A stored leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    #[serde(with = "crate::protocol::difficulty_str")]
    pub difficulty: Difficulty,
    /// Submission time, serialized as RFC 3339 UTC
    pub date: DateTime<Utc>,
    pub weighted_score: u64,
}

impl LeaderboardEntry {
    fn from_new(score: NewScore, date: DateTime<Utc>) -> Self {
        Self {
            weighted_score: weighted_score(score.score, score.difficulty),
            name: score.name,
            score: score.score,
            difficulty: score.difficulty,
            date,
        }
    }
}

/// Score scaled by the difficulty weight, truncated to an integer.
///
/// ```
/// use tetris_rooms_server::leaderboard::weighted_score;
/// use tetris_rooms_server::types::Difficulty;
///
/// assert_eq!(weighted_score(101, Difficulty::Fast), 151);
/// assert_eq!(weighted_score(100, Difficulty::Hardcore), 200);
/// ```
pub fn weighted_score(score: u32, difficulty: Difficulty) -> u64 {
    let (num, den) = difficulty.score_weight();
    u64::from(score) * num / den
}

/// Asynchronous score storage shared by every room.
pub trait LeaderboardStore: Send + Sync + 'static {
    /// Record a score. Non-positive scores are ignored.
    fn add_score(&self, score: NewScore) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// At most `limit` entries, highest weighted score first.
    fn leaderboard(
        &self,
        limit: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<LeaderboardEntry>>> + Send;
}

fn ranked(entries: &[LeaderboardEntry], limit: usize) -> Vec<LeaderboardEntry> {
    let mut out = entries.to_vec();
    // Stable sort: equal weights keep submission order.
    out.sort_by(|a, b| b.weighted_score.cmp(&a.weighted_score));
    out.truncate(limit);
    out
}

/// Leaderboard kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryLeaderboard {
    entries: RwLock<Vec<LeaderboardEntry>>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaderboardStore for MemoryLeaderboard {
    async fn add_score(&self, score: NewScore) -> anyhow::Result<()> {
        if score.score == 0 {
            return Ok(());
        }
        let entry = LeaderboardEntry::from_new(score, Utc::now());
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> anyhow::Result<Vec<LeaderboardEntry>> {
        Ok(ranked(&self.entries.read().await, limit))
    }
}

/// Leaderboard persisted as a JSON array on disk.
#[derive(Debug)]
pub struct FileLeaderboard {
    path: PathBuf,
    entries: RwLock<Vec<LeaderboardEntry>>,
}

impl FileLeaderboard {
    /// Load the file, starting empty when it does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("invalid leaderboard file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read leaderboard file {}", path.display()))
            }
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LeaderboardStore for FileLeaderboard {
    async fn add_score(&self, score: NewScore) -> anyhow::Result<()> {
        if score.score == 0 {
            return Ok(());
        }
        let entry = LeaderboardEntry::from_new(score, Utc::now());

        // The write lock is held across the file write so appends stay ordered.
        let mut entries = self.entries.write().await;
        entries.push(entry);
        let json = serde_json::to_vec_pretty(&*entries)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("failed to write leaderboard file {}", self.path.display()))
    }

    async fn leaderboard(&self, limit: usize) -> anyhow::Result<Vec<LeaderboardEntry>> {
        Ok(ranked(&self.entries.read().await, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(name: &str, score: u32, difficulty: Difficulty) -> NewScore {
        NewScore {
            name: name.to_string(),
            score,
            difficulty,
        }
    }

    #[test]
    fn test_entry_date_is_rfc3339_utc() {
        use chrono::TimeZone;

        let date = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        let entry = LeaderboardEntry::from_new(score("Alice", 101, Difficulty::Fast), date);
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["date"], "2023-11-14T22:13:20Z");
        assert_eq!(v["weightedScore"], 151);

        let back: LeaderboardEntry = serde_json::from_value(v).unwrap();
        assert_eq!(back, entry);
    }

    #[tokio::test]
    async fn test_zero_scores_are_ignored() {
        let board = MemoryLeaderboard::new();
        board.add_score(score("Alice", 0, Difficulty::Normal)).await.unwrap();
        assert!(board.leaderboard(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ordering_uses_weighted_score() {
        let board = MemoryLeaderboard::new();
        board.add_score(score("normal", 1000, Difficulty::Normal)).await.unwrap();
        board.add_score(score("fast", 700, Difficulty::Fast)).await.unwrap();
        board.add_score(score("hardcore", 600, Difficulty::Hardcore)).await.unwrap();

        let entries = board.leaderboard(10).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["hardcore", "fast", "normal"]);
        assert_eq!(entries[0].weighted_score, 1200);
        assert_eq!(entries[1].weighted_score, 1050);
        assert_eq!(entries[1].score, 700);
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let board = MemoryLeaderboard::new();
        for i in 1..=5 {
            board.add_score(score("p", i * 40, Difficulty::Normal)).await.unwrap();
        }
        let entries = board.leaderboard(2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].score, 200);
    }

    #[tokio::test]
    async fn test_file_store_persists_entries() {
        let path = std::env::temp_dir().join(format!(
            "tetris-rooms-leaderboard-{}-{}.json",
            std::process::id(),
            line!()
        ));
        let _ = tokio::fs::remove_file(&path).await;

        {
            let board = FileLeaderboard::open(&path).await.unwrap();
            board.add_score(score("Alice", 1200, Difficulty::Hardcore)).await.unwrap();
            board.add_score(score("Bob", 0, Difficulty::Normal)).await.unwrap();
        }

        let reopened = FileLeaderboard::open(&path).await.unwrap();
        let entries = reopened.leaderboard(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Alice");
        assert_eq!(entries[0].difficulty, Difficulty::Hardcore);
        assert_eq!(entries[0].weighted_score, 2400);
        assert!(entries[0].date <= Utc::now());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_fatal() {
        let path = std::env::temp_dir().join(format!(
            "tetris-rooms-leaderboard-{}-{}.json",
            std::process::id(),
            line!()
        ));
        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(FileLeaderboard::open(&path).await.is_err());
        let _ = tokio::fs::remove_file(&path).await;
    }
}
