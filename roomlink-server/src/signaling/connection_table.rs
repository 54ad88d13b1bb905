use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use dashmap::DashMap;
use roomlink_core::{ParticipantId, ServerMessage};
use tokio::sync::mpsc;
use tracing::warn;

/// Outbound queues of the currently connected participants.
///
/// Each participant has a single queue drained by one writer task, so
/// messages to the same target keep the order they were queued in.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<ServerMessage>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_peer(&self, participant_id: ParticipantId, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.peers.insert(participant_id, tx);
    }

    pub fn remove_peer(&self, participant_id: &ParticipantId) {
        self.peers.remove(participant_id);
    }

    pub fn is_connected(&self, participant_id: &ParticipantId) -> bool {
        self.peers.contains_key(participant_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[async_trait]
impl SignalingOutput for ConnectionTable {
    async fn send(&self, participant_id: &ParticipantId, msg: ServerMessage) -> bool {
        let Some(peer) = self.peers.get(participant_id) else {
            return false;
        };
        if peer.send(msg).is_err() {
            warn!("Outbound queue of {} is closed", participant_id);
            return false;
        }
        true
    }
}
