use crate::model::ParticipantId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalingError {
    /// Empty or malformed room/participant id. Rejected with no state change.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Relay target is not connected or not in the sender's room.
    #[error("participant {0} is unreachable")]
    TargetUnreachable(ParticipantId),

    /// A message that makes no sense in the current negotiation state.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The media/transport capability rejected a description or candidate.
    #[error("capability failure: {0}")]
    CapabilityFailure(String),
}

impl SignalingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignalingError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            SignalingError::TargetUnreachable(_) => ErrorKind::TargetUnreachable,
            SignalingError::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            SignalingError::CapabilityFailure(_) => ErrorKind::CapabilityFailure,
        }
    }
}

/// Wire form of [`SignalingError`], carried by `ServerMessage::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    TargetUnreachable,
    ProtocolViolation,
    CapabilityFailure,
}
