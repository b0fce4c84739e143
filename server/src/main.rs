use std::env;

use anyhow::{Context, Result};
use server::game_server::{GameServer, GameServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if exists
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let ws_port = env::var("ARENA_WS_PORT").unwrap_or_else(|_| "8080".to_string());
    let ws_addr = format!("0.0.0.0:{}", ws_port);

    let game_server = GameServer::start(GameServerConfig { ws_addr }).await?;
    info!("WebSocket server listening on: {}", game_server.ws_addr());

    // Wait for shutdown signal
    info!("Server started. Waiting for shutdown signal (Ctrl+C)...");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Received shutdown signal. Shutting down gracefully...");
    game_server.shutdown().await?;

    info!("Server shut down successfully");
    Ok(())
}
