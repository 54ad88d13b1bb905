use async_trait::async_trait;
use roomlink_core::{ParticipantId, ServerMessage};

/// Delivery side of the signaling server, implemented by whatever holds the
/// live connections (the WebSocket table in production, mocks in tests).
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue `msg` for `participant_id`.
    ///
    /// Returns `false` when the participant has no live connection.
    async fn send(&self, participant_id: &ParticipantId, msg: ServerMessage) -> bool;
}
