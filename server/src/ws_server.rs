use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use common::constants::DISCONNECT_DEBOUNCE_MS;
use common::game::Inbound;
use common::protocol::{ClientMessage, ServerMessage};
use common::session::PlayerId;

use crate::game_server::{self, Shared};

#[derive(Debug, Error)]
#[error("WebSocket server error: {0}")]
pub struct WsServeError(#[from] std::io::Error);

/// The gateway router: the WebSocket endpoint, a health probe, and
/// permissive CORS so browser preflights pass.
pub fn router(shared: Arc<Shared>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket_handler))
        .layer(cors)
        .with_state(shared)
}

/// Serve the gateway until the shutdown token fires.
pub async fn run_websocket_server(
    listener: TcpListener,
    shared: Arc<Shared>,
) -> Result<(), WsServeError> {
    let token = shared.shutdown.clone();
    axum::serve(listener, router(shared))
        .with_graceful_shutdown(async move {
            token.cancelled().await;
            info!("WebSocket server received shutdown signal");
        })
        .await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

/// WebSocket upgrade handler. Plain requests that cannot upgrade get a 500.
async fn websocket_handler(
    ws: Option<WebSocketUpgrade>,
    State(shared): State<Arc<Shared>>,
) -> Response {
    let Some(ws) = ws else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "WebSocket upgrade required").into_response();
    };

    let count = shared.connection_count.fetch_add(1, Ordering::Relaxed) + 1;
    debug!("WebSocket connection opened, total connections: {}", count);

    ws.on_upgrade(move |socket| async move {
        handle_socket(socket, shared.clone()).await;
        let count = shared.connection_count.fetch_sub(1, Ordering::Relaxed) - 1;
        debug!("WebSocket connection closed, total connections: {}", count);
    })
    .into_response()
}

/// One connection's lifetime: create the session, pump inbound frames into
/// the world, tear the session down on close.
async fn handle_socket(socket: WebSocket, shared: Arc<Shared>) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(256);

    let id = PlayerId::random();
    let token = shared.shutdown.child_token();
    shared.connections.register(id, tx, token.clone()).await;

    // Forward task: serialize outbound messages onto the socket.
    let forward_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize outbound message: {}", e);
                    continue;
                }
            };
            if ws_sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_sink.send(Message::Close(None)).await;
    });

    info!(player = %id, "WebSocket connection established");
    game_server::drive(&shared, Inbound::Connect(id)).await;

    loop {
        tokio::select! {
            biased;

            // Reaper or shutdown pulled the plug on this connection.
            _ = token.cancelled() => {
                break;
            }

            frame = ws_stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(message) => {
                                game_server::drive(&shared, Inbound::Message(id, message)).await;
                            }
                            Err(e) => {
                                // Malformed payloads are reported to the
                                // sender only; the connection stays up.
                                debug!(player = %id, "Malformed message: {}", e);
                                shared
                                    .connections
                                    .send_to(
                                        id,
                                        &ServerMessage::Error {
                                            message: format!("Malformed message: {e}"),
                                        },
                                    )
                                    .await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(player = %id, "Client closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(player = %id, "WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    shared.connections.unregister(id).await;
    game_server::drive(&shared, Inbound::Disconnect(id)).await;
    forward_task.abort();
    info!(player = %id, "WebSocket connection closed");

    // Let the removal settle, then re-evaluate the round state.
    let debounced = shared.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(DISCONNECT_DEBOUNCE_MS)).await;
        game_server::recheck(&debounced).await;
    });
}
