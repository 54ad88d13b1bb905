mod config;
mod error;
pub mod mesh;
pub mod negotiation;
pub mod signaling;
pub mod transport;

pub use config::*;
pub use error::*;
pub use mesh::{MeshEvent, MeshHandle, MeshObserver, MeshOrchestrator, MeshSnapshot, SessionInfo};
pub use negotiation::{
    CandidateBuffer, NegotiationState, PeerSession, Role, SessionContext, SessionId, SessionReport,
};
pub use signaling::{SignalingConnection, SignalingSink, WsSignalingSink};
pub use transport::{
    MediaTransport, MediaTransportFactory, RtcTransport, RtcTransportFactory, SdpType,
    SessionDescription, StreamHandle, TransportEvent,
};
