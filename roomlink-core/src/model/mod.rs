mod participant;
mod room;
mod signaling;

pub use participant::ParticipantId;
pub use room::{RoomId, Roster};
pub use signaling::{
    CandidatePayload, ClientMessage, DEFAULT_STUN_ADDR, IceServerConfig, ServerMessage, SignalKind,
    SignalPayload,
};
