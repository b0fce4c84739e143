use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use common::constants::TICK_INTERVAL_MS;
use common::game::{GameWorld, Inbound, Outbound};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::connections::PlayerConnections;
use crate::ws_server;

/// Everything the gateway and the tick loop share. The world sits behind a
/// single mutex: one writer at a time, per-message handlers and the tick
/// never interleave mid-update.
pub struct Shared {
    pub world: Mutex<GameWorld>,
    pub connections: PlayerConnections,
    pub shutdown: CancellationToken,
    pub connection_count: AtomicUsize,
    /// Deadline of the currently armed round-timer wakeup, 0 when none.
    armed_wakeup_ms: AtomicI64,
}

/// Configuration for a game server instance
pub struct GameServerConfig {
    /// WebSocket server address (e.g., "127.0.0.1:8080")
    pub ws_addr: String,
}

/// A running server: WebSocket gateway plus the background tick loop.
pub struct GameServer {
    ws_addr: String,
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
}

impl GameServer {
    /// Create and start a new game server instance
    pub async fn start(config: GameServerConfig) -> Result<Self> {
        let now_ms = Utc::now().timestamp_millis();
        let shared = Arc::new(Shared {
            world: Mutex::new(GameWorld::new(now_ms)),
            connections: PlayerConnections::new(),
            shutdown: CancellationToken::new(),
            connection_count: AtomicUsize::new(0),
            armed_wakeup_ms: AtomicI64::new(0),
        });

        let listener = TcpListener::bind(&config.ws_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.ws_addr))?;
        let ws_addr = listener
            .local_addr()
            .context("Failed to read bound address")?
            .to_string();

        let mut handles = Vec::new();

        info!("Starting WebSocket server on {}", ws_addr);
        let ws_shared = shared.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = ws_server::run_websocket_server(listener, ws_shared).await {
                error!("WebSocket server error: {}", e);
            }
        }));

        info!("Starting simulation tick loop");
        let tick_shared = shared.clone();
        handles.push(tokio::spawn(async move {
            run_tick_loop(tick_shared).await;
        }));

        Ok(Self {
            ws_addr,
            shared,
            handles,
        })
    }

    /// The actually bound WebSocket address (useful with port 0).
    pub fn ws_addr(&self) -> &str {
        &self.ws_addr
    }

    pub async fn connection_count(&self) -> usize {
        self.shared.connection_count.load(Ordering::Relaxed)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Starting graceful shutdown of game server");
        self.shared.shutdown.cancel();

        while let Some(handle) = self.handles.pop() {
            match tokio::time::timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Task panicked during shutdown: {:?}", e),
                Err(_) => error!("Task shutdown timed out"),
            }
        }

        info!("Game server shut down gracefully");
        Ok(())
    }
}

/// Helper to start a server on an ephemeral port for tests.
pub async fn start_test_server() -> Result<GameServer> {
    GameServer::start(GameServerConfig {
        ws_addr: "127.0.0.1:0".to_string(),
    })
    .await
}

/// Once-per-second background pass: server clock, round timers, round
/// starts, inactivity reaping.
async fn run_tick_loop(shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = shared.shutdown.cancelled() => {
                info!("Tick loop shutting down");
                break;
            }

            _ = interval.tick() => {
                let now_ms = Utc::now().timestamp_millis();
                let (out, deadline) = {
                    let mut world = shared.world.lock().await;
                    (world.tick(now_ms), world.next_deadline_ms())
                };
                dispatch(&shared, out).await;
                if let Some(at) = deadline {
                    arm_wakeup(&shared, at);
                }
            }
        }
    }
}

/// Run one inbound event through the world and fan out the results.
pub async fn drive(shared: &Arc<Shared>, event: Inbound) {
    let now_ms = Utc::now().timestamp_millis();
    let (out, deadline) = {
        let mut world = shared.world.lock().await;
        (world.handle(event, now_ms), world.next_deadline_ms())
    };
    dispatch(shared, out).await;
    if let Some(at) = deadline {
        arm_wakeup(shared, at);
    }
}

/// Debounced round re-evaluation after a disconnect.
pub async fn recheck(shared: &Arc<Shared>) {
    let now_ms = Utc::now().timestamp_millis();
    let (out, deadline) = {
        let mut world = shared.world.lock().await;
        (world.recheck(now_ms), world.next_deadline_ms())
    };
    dispatch(shared, out).await;
    if let Some(at) = deadline {
        arm_wakeup(shared, at);
    }
}

async fn dispatch(shared: &Arc<Shared>, out: Vec<Outbound>) {
    for delivery in out {
        match delivery {
            Outbound::Broadcast(message) => shared.connections.broadcast(&message).await,
            Outbound::To(id, message) => shared.connections.send_to(id, &message).await,
            Outbound::Close(id) => shared.connections.close(id).await,
        }
    }
}

/// Arm a one-shot wakeup so a pending round timer fires on the dot instead
/// of waiting for the next whole-second tick. Only re-arms when the new
/// deadline is earlier than the one already pending.
fn arm_wakeup(shared: &Arc<Shared>, deadline_ms: i64) {
    let armed = shared.armed_wakeup_ms.load(Ordering::Acquire);
    if armed != 0 && armed <= deadline_ms {
        return;
    }
    shared.armed_wakeup_ms.store(deadline_ms, Ordering::Release);

    let shared = shared.clone();
    tokio::spawn(async move {
        let now_ms = Utc::now().timestamp_millis();
        let wait = (deadline_ms - now_ms).max(0) as u64 + 20;
        tokio::select! {
            biased;
            _ = shared.shutdown.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_millis(wait)) => {}
        }
        shared.armed_wakeup_ms.store(0, Ordering::Release);

        let now_ms = Utc::now().timestamp_millis();
        let (out, next) = {
            let mut world = shared.world.lock().await;
            (world.tick(now_ms), world.next_deadline_ms())
        };
        dispatch(&shared, out).await;
        if let Some(at) = next {
            arm_wakeup(&shared, at);
        }
    });
}
