use crate::transport::StreamHandle;
use async_trait::async_trait;
use roomlink_core::{ParticipantId, SignalingError};
use tokio::sync::mpsc;

/// Callbacks for whatever presents the mesh to the user.
#[async_trait]
pub trait MeshObserver: Send + Sync + 'static {
    async fn on_participant_list_changed(&self, participants: &[ParticipantId]);

    async fn on_remote_media_available(&self, participant_id: &ParticipantId, stream: StreamHandle);

    /// The link to one participant failed; the rest of the mesh is unaffected.
    async fn on_session_failed(&self, participant_id: &ParticipantId, error: &SignalingError);
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeshEvent {
    ParticipantsChanged(Vec<ParticipantId>),
    RemoteMedia(ParticipantId, StreamHandle),
    SessionFailed(ParticipantId, SignalingError),
}

/// Forwards every callback as a [`MeshEvent`].
#[async_trait]
impl MeshObserver for mpsc::UnboundedSender<MeshEvent> {
    async fn on_participant_list_changed(&self, participants: &[ParticipantId]) {
        let _ = self.send(MeshEvent::ParticipantsChanged(participants.to_vec()));
    }

    async fn on_remote_media_available(&self, participant_id: &ParticipantId, stream: StreamHandle) {
        let _ = self.send(MeshEvent::RemoteMedia(participant_id.clone(), stream));
    }

    async fn on_session_failed(&self, participant_id: &ParticipantId, error: &SignalingError) {
        let _ = self.send(MeshEvent::SessionFailed(participant_id.clone(), error.clone()));
    }
}
