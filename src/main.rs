//! Room server runner (default binary).
//!
//! Reads configuration from the environment, initialises logging and serves
//! rooms until the process is stopped. `RUST_LOG` controls verbosity
//! (default `info`).

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use tetris_rooms::server::{run_server, FileLeaderboard, MemoryLeaderboard, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .compact()
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        tick_ms = config.tick_ms,
        "Tetris room server starting"
    );

    match config.leaderboard_path.clone() {
        Some(path) => {
            let leaderboard = FileLeaderboard::open(&path).await?;
            tracing::info!(path = %leaderboard.path().display(), "Using file leaderboard");
            run_server(config, Arc::new(leaderboard), None).await
        }
        None => {
            tracing::info!("Using in-memory leaderboard");
            run_server(config, Arc::new(MemoryLeaderboard::new()), None).await
        }
    }
}
