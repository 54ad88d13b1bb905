use crate::config::ServerConfig;
use crate::signaling::{ConnectionTable, RelayRouter, SignalingOutput};
use roomlink_core::{ClientMessage, IceServerConfig, ParticipantId, ServerMessage, SignalingError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

struct SignalingInner {
    connections: Arc<ConnectionTable>,
    ice_servers: Vec<IceServerConfig>,
}

/// Shared state behind the WebSocket endpoint: live connections plus the
/// relay router that works on top of them.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    router: RelayRouter,
}

impl SignalingService {
    pub fn new(config: &ServerConfig) -> Self {
        let connections = Arc::new(ConnectionTable::new());
        let router = RelayRouter::new(connections.clone(), config.topology);

        Self {
            inner: Arc::new(SignalingInner {
                connections,
                ice_servers: config.ice_servers.clone(),
            }),
            router,
        }
    }

    pub fn router(&self) -> &RelayRouter {
        &self.router
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    /// Registers a new connection and queues its `Welcome` and `IceConfig`.
    pub async fn connect(
        &self,
        participant_id: ParticipantId,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.inner.connections.add_peer(participant_id.clone(), tx);

        let welcome = ServerMessage::Welcome {
            participant_id: participant_id.clone(),
        };
        let ice = ServerMessage::IceConfig {
            ice_servers: self.get_ice_servers(),
        };
        for msg in [welcome, ice] {
            self.inner.connections.send(&participant_id, msg).await;
        }

        info!(
            "Participant {} connected ({} online)",
            participant_id,
            self.inner.connections.len()
        );
    }

    pub async fn disconnect(&self, participant_id: &ParticipantId) {
        self.inner.connections.remove_peer(participant_id);
        self.router.on_disconnect(participant_id).await;
    }

    /// Parses one text frame. Malformed frames are logged and skipped.
    pub async fn handle_text(&self, participant_id: &ParticipantId, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle_message(participant_id, msg).await,
            Err(e) => warn!("Invalid ClientMessage from {}: {}", participant_id, e),
        }
    }

    pub async fn handle_message(&self, participant_id: &ParticipantId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join { room } => {
                if let Err(e) = self.router.on_join(participant_id, &room).await {
                    self.reject(participant_id, e).await;
                }
            }
            ClientMessage::Leave { room } => {
                if let Err(e) = self.router.on_leave(participant_id, &room).await {
                    self.reject(participant_id, e).await;
                }
            }
            ClientMessage::Signal { to, payload } => {
                if let Err(e) = self.router.relay(participant_id, &to, payload).await {
                    self.reject(participant_id, e).await;
                }
            }
        }
    }

    async fn reject(&self, participant_id: &ParticipantId, error: SignalingError) {
        warn!("Rejected request from {}: {}", participant_id, error);
        let msg = ServerMessage::Error {
            kind: error.kind(),
            message: error.to_string(),
        };
        self.inner.connections.send(participant_id, msg).await;
    }
}
