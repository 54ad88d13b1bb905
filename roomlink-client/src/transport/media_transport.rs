use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use roomlink_core::{CandidatePayload, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpType {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Media capability for a single peer link.
///
/// Gathered candidates, remote media and link state come back through the
/// event channel handed to [`MediaTransportFactory::create`].
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Builds an answer to `remote`, which has already been applied.
    async fn create_answer(&self, remote: &SessionDescription) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: CandidatePayload) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait MediaTransportFactory: Send + Sync {
    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>>;
}
