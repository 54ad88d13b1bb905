use anyhow::{Result, bail};
use async_trait::async_trait;
use roomlink_client::{MediaTransport, MediaTransportFactory, SessionDescription, TransportEvent};
use roomlink_core::{CandidatePayload, ParticipantId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    CreateOffer,
    CreateAnswer,
    SetLocal(SessionDescription),
    SetRemote(SessionDescription),
    AddCandidate(String),
    Close,
}

/// Capability call a [`MockTransport`] rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    CreateOffer,
    SetRemote,
    AddCandidate,
}

#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    pub fail_on: Option<FailOn>,
    /// `create_offer` never completes.
    pub hang_on_create_offer: bool,
    /// Local candidates gathered after the local description is set.
    pub local_candidates: usize,
    /// Raise `Connected` once both descriptions are set.
    pub auto_connect: bool,
}

impl MockBehavior {
    pub fn connecting() -> Self {
        Self {
            auto_connect: true,
            local_candidates: 2,
            ..Default::default()
        }
    }
}

/// Records every capability call; never touches the network.
pub struct MockTransport {
    owner: String,
    pub remote: ParticipantId,
    behavior: MockBehavior,
    calls: Mutex<Vec<TransportCall>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    local_set: AtomicBool,
    remote_set: AtomicBool,
}

impl MockTransport {
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn applied_candidates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::AddCandidate(candidate) => Some(candidate),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == TransportCall::Close)
            .count()
    }

    pub fn has_call(&self, expected: &TransportCall) -> bool {
        self.calls().iter().any(|call| call == expected)
    }

    /// Raises a transport event as if the peer link produced it.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: FailOn) -> Result<()> {
        if self.behavior.fail_on == Some(op) {
            bail!("{:?} rejected by mock transport", op);
        }
        Ok(())
    }

    fn maybe_connect(&self) {
        if self.behavior.auto_connect
            && self.local_set.load(Ordering::SeqCst)
            && self.remote_set.load(Ordering::SeqCst)
        {
            self.emit(TransportEvent::Connected);
        }
    }
}

#[async_trait]
impl MediaTransport for MockTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(TransportCall::CreateOffer);
        if self.behavior.hang_on_create_offer {
            std::future::pending::<()>().await;
        }
        self.check(FailOn::CreateOffer)?;
        Ok(SessionDescription::offer(format!("offer:{}", self.owner)))
    }

    async fn create_answer(&self, _remote: &SessionDescription) -> Result<SessionDescription> {
        self.record(TransportCall::CreateAnswer);
        Ok(SessionDescription::answer(format!("answer:{}", self.owner)))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.record(TransportCall::SetLocal(description));
        self.local_set.store(true, Ordering::SeqCst);
        for n in 1..=self.behavior.local_candidates {
            self.emit(TransportEvent::LocalCandidate(CandidatePayload {
                candidate: format!("{}-cand-{}", self.owner, n),
                sdp_mid: Some("0".to_owned()),
                sdp_m_line_index: Some(0),
            }));
        }
        self.maybe_connect();
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.record(TransportCall::SetRemote(description));
        self.check(FailOn::SetRemote)?;
        self.remote_set.store(true, Ordering::SeqCst);
        self.maybe_connect();
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: CandidatePayload) -> Result<()> {
        self.record(TransportCall::AddCandidate(candidate.candidate));
        self.check(FailOn::AddCandidate)
    }

    async fn close(&self) -> Result<()> {
        self.record(TransportCall::Close);
        Ok(())
    }
}

/// Hands out [`MockTransport`]s and keeps them for inspection.
pub struct MockTransportFactory {
    owner: String,
    behavior: MockBehavior,
    unreachable: HashSet<ParticipantId>,
    created: Mutex<Vec<Arc<MockTransport>>>,
}

impl MockTransportFactory {
    pub fn new(owner: &str, behavior: MockBehavior) -> Self {
        Self {
            owner: owner.to_owned(),
            behavior,
            unreachable: HashSet::new(),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Creating a transport towards `remote` fails.
    pub fn unreachable(mut self, remote: &str) -> Self {
        self.unreachable.insert(ParticipantId::from(remote));
        self
    }

    pub fn all(&self) -> Vec<Arc<MockTransport>> {
        self.created.lock().unwrap().clone()
    }

    /// Most recent transport towards `remote`.
    pub fn latest(&self, remote: &ParticipantId) -> Option<Arc<MockTransport>> {
        self.all()
            .into_iter()
            .rev()
            .find(|transport| &transport.remote == remote)
    }
}

#[async_trait]
impl MediaTransportFactory for MockTransportFactory {
    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>> {
        if self.unreachable.contains(remote) {
            bail!("no route to {}", remote);
        }

        let transport = Arc::new(MockTransport {
            owner: self.owner.clone(),
            remote: remote.clone(),
            behavior: self.behavior.clone(),
            calls: Mutex::new(Vec::new()),
            events,
            local_set: AtomicBool::new(false),
            remote_set: AtomicBool::new(false),
        });
        self.created.lock().unwrap().push(transport.clone());
        Ok(transport)
    }
}
