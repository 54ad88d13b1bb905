use crate::error::ClientError;
use crate::negotiation::{NegotiationState, Role};
use roomlink_core::{ParticipantId, RoomId};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub(crate) enum MeshCommand {
    Join(RoomId),
    Leave,
    Snapshot(oneshot::Sender<MeshSnapshot>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub remote: ParticipantId,
    pub role: Role,
    pub state: NegotiationState,
}

/// Point-in-time view of an orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeshSnapshot {
    pub room: Option<RoomId>,
    pub participants: Vec<ParticipantId>,
    /// Sorted by remote id.
    pub sessions: Vec<SessionInfo>,
}

/// Controls a running [`MeshOrchestrator`](crate::MeshOrchestrator).
#[derive(Debug, Clone)]
pub struct MeshHandle {
    local: ParticipantId,
    commands: mpsc::UnboundedSender<MeshCommand>,
}

impl MeshHandle {
    pub(crate) fn new(local: ParticipantId, commands: mpsc::UnboundedSender<MeshCommand>) -> Self {
        Self { local, commands }
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.local
    }

    /// Joins `room`, leaving the current room first if it differs.
    pub fn join_room(&self, room: RoomId) -> Result<(), ClientError> {
        room.validate()?;
        self.command(MeshCommand::Join(room))
    }

    pub fn leave_room(&self) -> Result<(), ClientError> {
        self.command(MeshCommand::Leave)
    }

    pub async fn snapshot(&self) -> Result<MeshSnapshot, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.command(MeshCommand::Snapshot(tx))?;
        rx.await.map_err(|_| ClientError::OrchestratorStopped)
    }

    fn command(&self, command: MeshCommand) -> Result<(), ClientError> {
        self.commands
            .send(command)
            .map_err(|_| ClientError::OrchestratorStopped)
    }
}
