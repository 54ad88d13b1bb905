use crate::error::ErrorKind;
use crate::model::{ParticipantId, RoomId, Roster};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    pub fn default_stun() -> Vec<Self> {
        vec![Self::stun(DEFAULT_STUN_ADDR)]
    }
}

/// One possible network path for a peer link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePayload {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Protocol-opaque negotiation payload. The server never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalPayload {
    Offer { sdp: String },
    Answer { sdp: String },
    Candidate(CandidatePayload),
}

impl SignalPayload {
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalPayload::Offer { .. } => SignalKind::Offer,
            SignalPayload::Answer { .. } => SignalKind::Answer,
            SignalPayload::Candidate(_) => SignalKind::Candidate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
        };
        f.write_str(name)
    }
}

/// Frames a participant sends to the signaling server.
///
/// `Signal` names only the target; the sender is always taken from the
/// connection, so any `from` a client adds is dropped during parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ClientMessage {
    Join {
        room: RoomId,
    },
    Leave {
        room: RoomId,
    },
    Signal {
        to: ParticipantId,
        payload: SignalPayload,
    },
}

/// Frames the signaling server sends to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ServerMessage {
    /// First frame on every connection: the id the server assigned.
    Welcome {
        participant_id: ParticipantId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    Roster(Roster),
    PeerJoined {
        room: RoomId,
        participant_id: ParticipantId,
    },
    PeerLeft {
        room: RoomId,
        participant_id: ParticipantId,
    },
    Signal {
        from: ParticipantId,
        payload: SignalPayload,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}
