pub mod mesh_tests;

use crate::utils::{MockBehavior, MockTransport, MockTransportFactory, RecordingSink};
use roomlink_client::{NegotiationState, PeerSession, SessionContext, SessionReport};
use roomlink_core::{CandidatePayload, ParticipantId, SignalPayload};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::Level;

const WAIT_TIMEOUT_MS: u64 = 2000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn candidate(name: &str) -> SignalPayload {
    SignalPayload::Candidate(CandidatePayload {
        candidate: name.to_owned(),
        sdp_mid: Some("0".to_owned()),
        sdp_m_line_index: Some(0),
    })
}

/// One session wired to a mock transport and a recording sink.
pub struct SessionHarness {
    pub session: PeerSession,
    pub factory: Arc<MockTransportFactory>,
    pub sink: RecordingSink,
    pub reports: mpsc::UnboundedReceiver<SessionReport>,
}

pub fn spawn_session(local: &str, remote: &str, behavior: MockBehavior) -> SessionHarness {
    spawn_session_with(local, remote, MockTransportFactory::new(local, behavior))
}

pub fn spawn_session_with(local: &str, remote: &str, factory: MockTransportFactory) -> SessionHarness {
    let factory = Arc::new(factory);
    let sink = RecordingSink::new();
    let (reports_tx, reports) = mpsc::unbounded_channel();

    let context = SessionContext {
        local: ParticipantId::from(local),
        factory: factory.clone(),
        signaling: Arc::new(sink.clone()),
        reports: reports_tx,
    };
    let session = PeerSession::spawn(1, ParticipantId::from(remote), context);

    SessionHarness {
        session,
        factory,
        sink,
        reports,
    }
}

impl SessionHarness {
    /// The transport, once the session has created it.
    pub async fn transport(&self) -> Arc<MockTransport> {
        let remote = self.session.remote().clone();
        tokio::time::timeout(Duration::from_millis(WAIT_TIMEOUT_MS), async {
            loop {
                if let Some(transport) = self.factory.latest(&remote) {
                    return transport;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("Timeout waiting for transport")
    }

    pub async fn wait_for_state(&self, target: NegotiationState) {
        let mut rx = self.session.subscribe_state();
        tokio::time::timeout(
            Duration::from_millis(WAIT_TIMEOUT_MS),
            rx.wait_for(|state| *state == target),
        )
        .await
        .unwrap_or_else(|_| panic!("Timeout waiting for {target}"))
        .expect("Session state channel closed");
    }

    /// Lets the actor drain anything already queued.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    pub async fn next_report(&mut self) -> SessionReport {
        tokio::time::timeout(Duration::from_millis(WAIT_TIMEOUT_MS), self.reports.recv())
            .await
            .expect("Timeout waiting for session report")
            .expect("Report channel closed")
    }
}
