pub mod membership_tests;

use roomlink_core::ParticipantId;
use roomlink_server::{RelayRouter, TopologyMode};
use std::sync::Arc;
use tracing::Level;

use crate::utils::MockSignalingOutput;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_router(topology: TopologyMode) -> (RelayRouter, MockSignalingOutput) {
    let output = MockSignalingOutput::new();
    let router = RelayRouter::new(Arc::new(output.clone()), topology);
    (router, output)
}

/// Registers `names` as connected participants and returns their ids.
pub async fn connect_all(output: &MockSignalingOutput, names: &[&str]) -> Vec<ParticipantId> {
    let mut ids = Vec::new();
    for name in names {
        let id = ParticipantId::from(*name);
        output.connect(&id).await;
        ids.push(id);
    }
    ids
}
