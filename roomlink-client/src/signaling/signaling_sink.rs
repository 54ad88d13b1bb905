use crate::error::ClientError;
use async_trait::async_trait;
use roomlink_core::ClientMessage;

/// Outbound half of the signaling channel.
#[async_trait]
pub trait SignalingSink: Send + Sync {
    async fn send(&self, msg: ClientMessage) -> Result<(), ClientError>;
}
