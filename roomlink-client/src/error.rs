use roomlink_core::SignalingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to signaling server: {0}")]
    Connect(String),

    #[error("unexpected handshake frame: {0}")]
    Handshake(String),

    #[error("signaling connection closed")]
    ConnectionClosed,

    #[error("mesh orchestrator stopped")]
    OrchestratorStopped,

    #[error(transparent)]
    Signaling(#[from] SignalingError),
}
