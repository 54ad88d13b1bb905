use crate::negotiation::{CandidateBuffer, NegotiationState, Role};
use crate::signaling::SignalingSink;
use crate::transport::{
    MediaTransport, MediaTransportFactory, SessionDescription, StreamHandle, TransportEvent,
};
use roomlink_core::{CandidatePayload, ClientMessage, ParticipantId, SignalPayload, SignalingError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Distinguishes a session from an earlier one with the same remote.
pub type SessionId = u64;

/// What a session tells its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReport {
    RemoteMedia {
        session_id: SessionId,
        remote: ParticipantId,
        stream: StreamHandle,
    },
    /// The session has already shut itself down.
    Failed {
        session_id: SessionId,
        remote: ParticipantId,
        error: SignalingError,
    },
}

/// Collaborators shared by every session of one participant.
#[derive(Clone)]
pub struct SessionContext {
    pub local: ParticipantId,
    pub factory: Arc<dyn MediaTransportFactory>,
    pub signaling: Arc<dyn SignalingSink>,
    pub reports: mpsc::UnboundedSender<SessionReport>,
}

#[derive(Debug)]
enum SessionCommand {
    Start,
    Signal(SignalPayload),
}

/// Handle to the negotiation actor for one remote participant.
///
/// Dropping the handle closes the session.
#[derive(Debug)]
pub struct PeerSession {
    id: SessionId,
    remote: ParticipantId,
    role: Role,
    commands: mpsc::UnboundedSender<SessionCommand>,
    state: watch::Receiver<NegotiationState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PeerSession {
    pub fn spawn(id: SessionId, remote: ParticipantId, context: SessionContext) -> Self {
        let role = Role::for_pair(&context.local, &remote);
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(NegotiationState::Idle);
        let cancel = CancellationToken::new();

        debug!("Spawning session {} with {} as {}", id, remote, role);

        let task = tokio::spawn(run_session(
            id,
            remote.clone(),
            role,
            context,
            commands_rx,
            state_tx,
            cancel.clone(),
        ));

        Self {
            id,
            remote,
            role,
            commands,
            state,
            cancel,
            task,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<NegotiationState> {
        self.state.clone()
    }

    /// Sends the offer if this side initiates; a responder keeps waiting.
    pub fn start(&self) {
        self.command(SessionCommand::Start);
    }

    /// Queues a payload relayed from the remote participant.
    pub fn deliver(&self, payload: SignalPayload) {
        self.command(SessionCommand::Signal(payload));
    }

    /// Cancels any in-flight capability call and releases the transport.
    /// Safe to call more than once.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Closes the session and waits until the transport is released.
    pub async fn shutdown(mut self) {
        self.close();
        let _ = (&mut self.task).await;
    }

    fn command(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            debug!("Session {} with {} already finished", self.id, self.remote);
        }
    }
}

impl Drop for PeerSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum Interrupt {
    Cancelled,
    Failed(SignalingError),
}

enum Input {
    Command(SessionCommand),
    Transport(TransportEvent),
    Stop,
}

async fn run_session(
    id: SessionId,
    remote: ParticipantId,
    role: Role,
    context: SessionContext,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    state_tx: watch::Sender<NegotiationState>,
    cancel: CancellationToken,
) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let created = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            state_tx.send_replace(NegotiationState::Closed);
            return;
        }
        created = context.factory.create(&remote, events_tx) => created,
    };

    let transport = match created {
        Ok(transport) => transport,
        Err(e) => {
            let error = SignalingError::CapabilityFailure(format!("create transport: {e:#}"));
            warn!("Session with {} failed: {}", remote, error);
            state_tx.send_replace(NegotiationState::Closed);
            let _ = context.reports.send(SessionReport::Failed {
                session_id: id,
                remote,
                error,
            });
            return;
        }
    };

    let actor = SessionActor {
        id,
        remote,
        role,
        state: NegotiationState::Idle,
        state_tx,
        buffer: CandidateBuffer::new(),
        local_set: false,
        remote_set: false,
        transport,
        signaling: context.signaling,
        reports: context.reports,
        cancel,
    };
    actor.run(commands, events_rx).await;
}

struct SessionActor {
    id: SessionId,
    remote: ParticipantId,
    role: Role,
    state: NegotiationState,
    state_tx: watch::Sender<NegotiationState>,
    buffer: CandidateBuffer,
    local_set: bool,
    remote_set: bool,
    transport: Arc<dyn MediaTransport>,
    signaling: Arc<dyn SignalingSink>,
    reports: mpsc::UnboundedSender<SessionReport>,
    cancel: CancellationToken,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        loop {
            let input = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Input::Stop,
                command = commands.recv() => match command {
                    Some(command) => Input::Command(command),
                    None => Input::Stop,
                },
                Some(event) = events.recv() => Input::Transport(event),
            };

            let step = match input {
                Input::Command(SessionCommand::Start) => self.start().await,
                Input::Command(SessionCommand::Signal(payload)) => self.on_signal(payload).await,
                Input::Transport(event) => self.on_transport_event(event).await,
                Input::Stop => Err(Interrupt::Cancelled),
            };

            match step {
                Ok(()) => {}
                Err(Interrupt::Cancelled) => break,
                Err(Interrupt::Failed(error)) => {
                    warn!("Session with {} failed: {}", self.remote, error);
                    let _ = self.reports.send(SessionReport::Failed {
                        session_id: self.id,
                        remote: self.remote.clone(),
                        error,
                    });
                    break;
                }
            }
        }

        self.shutdown().await;
    }

    async fn start(&mut self) -> Result<(), Interrupt> {
        if self.role == Role::Responder {
            debug!("Waiting for an offer from {}", self.remote);
            return Ok(());
        }
        if self.state != NegotiationState::Idle {
            debug!("Session with {} already started", self.remote);
            return Ok(());
        }

        let offer = self
            .call("create offer", self.transport.create_offer())
            .await?;
        self.call(
            "apply local offer",
            self.transport.set_local_description(offer.clone()),
        )
        .await?;
        self.local_set = true;

        self.set_state(NegotiationState::OfferSent);
        self.emit(SignalPayload::Offer { sdp: offer.sdp }).await;
        Ok(())
    }

    async fn on_signal(&mut self, payload: SignalPayload) -> Result<(), Interrupt> {
        match payload {
            SignalPayload::Offer { sdp } => self.on_offer(sdp).await,
            SignalPayload::Answer { sdp } => self.on_answer(sdp).await,
            SignalPayload::Candidate(candidate) => self.on_remote_candidate(candidate).await,
        }
    }

    async fn on_offer(&mut self, sdp: String) -> Result<(), Interrupt> {
        if self.role != Role::Responder || self.state != NegotiationState::Idle {
            self.ignore(format!(
                "offer from {} while {} as {}",
                self.remote, self.state, self.role
            ));
            return Ok(());
        }

        let offer = SessionDescription::offer(sdp);
        self.call(
            "apply remote offer",
            self.transport.set_remote_description(offer.clone()),
        )
        .await?;
        self.remote_set = true;

        let answer = self
            .call("create answer", self.transport.create_answer(&offer))
            .await?;
        self.call(
            "apply local answer",
            self.transport.set_local_description(answer.clone()),
        )
        .await?;
        self.local_set = true;

        self.set_state(NegotiationState::AnswerSent);
        self.emit(SignalPayload::Answer { sdp: answer.sdp }).await;
        self.flush_candidates().await
    }

    async fn on_answer(&mut self, sdp: String) -> Result<(), Interrupt> {
        if self.state != NegotiationState::OfferSent {
            self.ignore(format!("answer from {} while {}", self.remote, self.state));
            return Ok(());
        }

        self.set_state(NegotiationState::AnswerPending);
        self.call(
            "apply remote answer",
            self.transport
                .set_remote_description(SessionDescription::answer(sdp)),
        )
        .await?;
        self.remote_set = true;

        self.flush_candidates().await?;
        self.set_state(NegotiationState::Connected);
        Ok(())
    }

    async fn on_remote_candidate(&mut self, candidate: CandidatePayload) -> Result<(), Interrupt> {
        if self.local_set && self.remote_set {
            return self
                .call(
                    "add remote candidate",
                    self.transport.add_remote_candidate(candidate),
                )
                .await;
        }

        self.buffer.push(candidate);
        debug!(
            "Buffered candidate from {} ({} pending)",
            self.remote,
            self.buffer.len()
        );
        Ok(())
    }

    async fn flush_candidates(&mut self) -> Result<(), Interrupt> {
        if !(self.local_set && self.remote_set) || self.buffer.is_empty() {
            return Ok(());
        }

        let pending = self.buffer.take_all();
        debug!(
            "Applying {} buffered candidates from {}",
            pending.len(),
            self.remote
        );
        for candidate in pending {
            self.call(
                "add buffered candidate",
                self.transport.add_remote_candidate(candidate),
            )
            .await?;
        }
        Ok(())
    }

    async fn on_transport_event(&mut self, event: TransportEvent) -> Result<(), Interrupt> {
        match event {
            TransportEvent::LocalCandidate(candidate) => {
                self.emit(SignalPayload::Candidate(candidate)).await;
            }
            TransportEvent::RemoteMedia(stream) => {
                let _ = self.reports.send(SessionReport::RemoteMedia {
                    session_id: self.id,
                    remote: self.remote.clone(),
                    stream,
                });
            }
            TransportEvent::Connected => {
                if self.state == NegotiationState::AnswerSent {
                    self.set_state(NegotiationState::Connected);
                }
            }
            TransportEvent::Failed(reason) => {
                return Err(Interrupt::Failed(SignalingError::CapabilityFailure(reason)));
            }
        }
        Ok(())
    }

    /// Runs a capability call unless the session is closed first, in which
    /// case the call is dropped along with its result.
    async fn call<T>(
        &self,
        what: &str,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, Interrupt> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("Session with {} closed during {}", self.remote, what);
                Err(Interrupt::Cancelled)
            }
            result = fut => result.map_err(|e| {
                Interrupt::Failed(SignalingError::CapabilityFailure(format!("{what}: {e:#}")))
            }),
        }
    }

    async fn emit(&self, payload: SignalPayload) {
        let kind = payload.kind();
        let msg = ClientMessage::Signal {
            to: self.remote.clone(),
            payload,
        };
        if let Err(e) = self.signaling.send(msg).await {
            error!("Failed to send {} to {}: {}", kind, self.remote, e);
        }
    }

    fn ignore(&self, what: String) {
        warn!("Ignoring {}", SignalingError::ProtocolViolation(what));
    }

    fn set_state(&mut self, next: NegotiationState) {
        if self.state.is_closed() {
            return;
        }
        debug!("Session with {}: {} -> {}", self.remote, self.state, next);
        self.state = next;
        self.state_tx.send_replace(next);
    }

    async fn shutdown(mut self) {
        self.buffer.clear();
        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport to {}: {:#}", self.remote, e);
        }
        self.set_state(NegotiationState::Closed);
        info!("Session with {} closed", self.remote);
    }
}
