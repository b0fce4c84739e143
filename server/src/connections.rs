use std::collections::HashMap;

use common::protocol::ServerMessage;
use common::session::PlayerId;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One player's outbound socket half: the channel feeding the forward task
/// plus the token that tears the connection down.
struct Connection {
    sender: mpsc::Sender<ServerMessage>,
    token: CancellationToken,
}

/// Maps player ids to their live WebSocket connections.
#[derive(Default)]
pub struct PlayerConnections {
    connections: RwLock<HashMap<PlayerId, Connection>>,
}

impl PlayerConnections {
    pub fn new() -> Self {
        PlayerConnections::default()
    }

    pub async fn register(
        &self,
        id: PlayerId,
        sender: mpsc::Sender<ServerMessage>,
        token: CancellationToken,
    ) {
        let mut connections = self.connections.write().await;
        connections.insert(id, Connection { sender, token });
    }

    pub async fn unregister(&self, id: PlayerId) {
        let mut connections = self.connections.write().await;
        connections.remove(&id);
    }

    /// Unicast. Messages for closed or backed-up connections are dropped:
    /// a fresher snapshot is always on the way.
    pub async fn send_to(&self, id: PlayerId, message: &ServerMessage) {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            deliver(id, connection, message);
        }
    }

    /// Fan a message out to every connected player.
    pub async fn broadcast(&self, message: &ServerMessage) {
        let connections = self.connections.read().await;
        for (id, connection) in connections.iter() {
            deliver(*id, connection, message);
        }
    }

    /// Forcibly close a player's connection (inactivity reaping).
    pub async fn close(&self, id: PlayerId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.remove(&id) {
            connection.token.cancel();
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }
}

fn deliver(id: PlayerId, connection: &Connection, message: &ServerMessage) {
    use mpsc::error::TrySendError;
    match connection.sender.try_send(message.clone()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(player = %id, "outbound channel full, dropping message");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(player = %id, "dropping message for closed connection");
        }
    }
}
