use roomlink_core::CandidatePayload;
use std::fmt;

/// Opaque reference to a remote media stream, owned by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamHandle(pub String);

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Events a transport raises for the session that owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A local candidate was gathered and must be sent to the remote peer.
    LocalCandidate(CandidatePayload),

    /// The remote peer started sending media.
    RemoteMedia(StreamHandle),

    /// The peer link is up.
    Connected,

    /// The peer link failed and will not recover.
    Failed(String),
}
