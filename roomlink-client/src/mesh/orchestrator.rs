use crate::mesh::mesh_handle::MeshCommand;
use crate::mesh::{MeshHandle, MeshObserver, MeshSnapshot, SessionInfo};
use crate::negotiation::{PeerSession, SessionContext, SessionId, SessionReport};
use crate::signaling::SignalingSink;
use crate::transport::MediaTransportFactory;
use roomlink_core::{
    ClientMessage, ParticipantId, RoomId, Roster, ServerMessage, SignalPayload, SignalingError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Keeps one negotiation session per other participant in the current room.
pub struct MeshOrchestrator {
    local: ParticipantId,
    room: Option<RoomId>,
    /// Version of the last roster applied for `room`.
    roster_version: Option<u64>,
    participants: Vec<ParticipantId>,
    sessions: HashMap<ParticipantId, PeerSession>,
    next_session_id: SessionId,
    context: SessionContext,
    observer: Arc<dyn MeshObserver>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    report_rx: mpsc::UnboundedReceiver<SessionReport>,
    command_rx: mpsc::UnboundedReceiver<MeshCommand>,
}

impl MeshOrchestrator {
    pub fn new(
        local: ParticipantId,
        inbound: mpsc::UnboundedReceiver<ServerMessage>,
        signaling: Arc<dyn SignalingSink>,
        factory: Arc<dyn MediaTransportFactory>,
        observer: Arc<dyn MeshObserver>,
    ) -> (Self, MeshHandle) {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            local: local.clone(),
            room: None,
            roster_version: None,
            participants: Vec::new(),
            sessions: HashMap::new(),
            next_session_id: 1,
            context: SessionContext {
                local: local.clone(),
                factory,
                signaling,
                reports: report_tx,
            },
            observer,
            inbound,
            report_rx,
            command_rx,
        };

        (orchestrator, MeshHandle::new(local, command_tx))
    }

    /// Starts the event loop on a new task.
    pub fn spawn(
        local: ParticipantId,
        inbound: mpsc::UnboundedReceiver<ServerMessage>,
        signaling: Arc<dyn SignalingSink>,
        factory: Arc<dyn MediaTransportFactory>,
        observer: Arc<dyn MeshObserver>,
    ) -> (MeshHandle, JoinHandle<()>) {
        let (orchestrator, handle) = Self::new(local, inbound, signaling, factory, observer);
        (handle, tokio::spawn(orchestrator.run()))
    }

    /// Runs until the signaling connection closes.
    pub async fn run(mut self) {
        info!("Mesh for participant {} started", self.local);

        loop {
            tokio::select! {
                msg = self.inbound.recv() => {
                    match msg {
                        Some(msg) => self.handle_server_message(msg).await,
                        None => {
                            info!("Signaling connection closed, stopping mesh");
                            break;
                        }
                    }
                }

                Some(report) = self.report_rx.recv() => self.handle_report(report).await,

                Some(command) = self.command_rx.recv() => self.handle_command(command).await,
            }
        }

        self.close_all_sessions();
        info!("Mesh for participant {} finished", self.local);
    }

    async fn handle_command(&mut self, command: MeshCommand) {
        match command {
            MeshCommand::Join(room) => {
                if let Some(current) = self.room.take() {
                    if current != room {
                        self.leave(current).await;
                    }
                }
                info!("Joining room '{}'", room);
                self.room = Some(room.clone());
                self.send(ClientMessage::Join { room }).await;
            }
            MeshCommand::Leave => match self.room.take() {
                Some(room) => self.leave(room).await,
                None => debug!("Leave requested outside of any room"),
            },
            MeshCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome { .. } | ServerMessage::IceConfig { .. } => {
                debug!("Ignoring repeated handshake frame");
            }
            ServerMessage::Roster(roster) => self.apply_roster(roster).await,
            ServerMessage::PeerJoined {
                room,
                participant_id,
            } => {
                if !self.is_current_room(&room) || participant_id == self.local {
                    return;
                }
                if !self.participants.contains(&participant_id) {
                    self.participants.push(participant_id.clone());
                }
                if !self.sessions.contains_key(&participant_id) {
                    self.track(participant_id);
                }
                self.observer
                    .on_participant_list_changed(&self.participants)
                    .await;
            }
            ServerMessage::PeerLeft {
                room,
                participant_id,
            } => {
                if !self.is_current_room(&room) {
                    return;
                }
                self.participants.retain(|id| id != &participant_id);
                self.untrack(&participant_id);
                self.observer
                    .on_participant_list_changed(&self.participants)
                    .await;
            }
            ServerMessage::Signal { from, payload } => self.route_signal(from, payload),
            ServerMessage::Error { kind, message } => {
                warn!("Signaling server rejected a request ({:?}): {}", kind, message);
            }
        }
    }

    /// Reconciles sessions with a full roster. Older rosters are ignored.
    async fn apply_roster(&mut self, roster: Roster) {
        if !self.is_current_room(&roster.room) {
            debug!("Ignoring roster for room '{}'", roster.room);
            return;
        }
        if self
            .roster_version
            .is_some_and(|applied| roster.version <= applied)
        {
            debug!("Ignoring stale roster v{}", roster.version);
            return;
        }
        if !roster.contains(&self.local) {
            debug!("Ignoring roster v{} without the local participant", roster.version);
            return;
        }

        self.roster_version = Some(roster.version);

        let mut participants: Vec<ParticipantId> = Vec::with_capacity(roster.participants.len());
        for id in roster.participants {
            if !participants.contains(&id) {
                participants.push(id);
            }
        }

        let departed: Vec<ParticipantId> = self
            .sessions
            .keys()
            .filter(|id| !participants.contains(id))
            .cloned()
            .collect();
        for id in departed {
            self.untrack(&id);
        }

        for id in &participants {
            if id != &self.local && !self.sessions.contains_key(id) {
                self.track(id.clone());
            }
        }

        self.participants = participants;
        self.observer
            .on_participant_list_changed(&self.participants)
            .await;
    }

    fn route_signal(&self, from: ParticipantId, payload: SignalPayload) {
        match self.sessions.get(&from) {
            Some(session) => session.deliver(payload),
            None => warn!(
                "Ignoring {}",
                SignalingError::ProtocolViolation(format!(
                    "{} from {} without a session",
                    payload.kind(),
                    from
                ))
            ),
        }
    }

    async fn handle_report(&mut self, report: SessionReport) {
        match report {
            SessionReport::RemoteMedia {
                session_id,
                remote,
                stream,
            } => {
                if self.is_current_session(&remote, session_id) {
                    info!("Remote media {} available from {}", stream, remote);
                    self.observer
                        .on_remote_media_available(&remote, stream)
                        .await;
                }
            }
            SessionReport::Failed {
                session_id,
                remote,
                error,
            } => {
                if self.is_current_session(&remote, session_id) {
                    self.sessions.remove(&remote);
                    self.observer.on_session_failed(&remote, &error).await;
                }
            }
        }
    }

    async fn leave(&mut self, room: RoomId) {
        info!("Leaving room '{}'", room);
        self.close_all_sessions();
        self.participants.clear();
        self.roster_version = None;
        self.send(ClientMessage::Leave { room }).await;
        self.observer.on_participant_list_changed(&[]).await;
    }

    fn track(&mut self, remote: ParticipantId) {
        let id = self.next_session_id;
        self.next_session_id += 1;

        let session = PeerSession::spawn(id, remote.clone(), self.context.clone());
        info!("Opening session with {} as {}", remote, session.role());
        session.start();
        self.sessions.insert(remote, session);
    }

    fn untrack(&mut self, remote: &ParticipantId) {
        if let Some(session) = self.sessions.remove(remote) {
            info!("Closing session with {}", remote);
            session.close();
        }
    }

    fn close_all_sessions(&mut self) {
        for (remote, session) in self.sessions.drain() {
            debug!("Closing session with {}", remote);
            session.close();
        }
    }

    fn is_current_room(&self, room: &RoomId) -> bool {
        self.room.as_ref() == Some(room)
    }

    fn is_current_session(&self, remote: &ParticipantId, session_id: SessionId) -> bool {
        self.sessions
            .get(remote)
            .is_some_and(|session| session.id() == session_id)
    }

    fn snapshot(&self) -> MeshSnapshot {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .values()
            .map(|session| SessionInfo {
                remote: session.remote().clone(),
                role: session.role(),
                state: session.state(),
            })
            .collect();
        sessions.sort_by(|a, b| a.remote.cmp(&b.remote));

        MeshSnapshot {
            room: self.room.clone(),
            participants: self.participants.clone(),
            sessions,
        }
    }

    async fn send(&self, msg: ClientMessage) {
        if let Err(e) = self.context.signaling.send(msg).await {
            error!("Failed to reach signaling server: {}", e);
        }
    }
}
