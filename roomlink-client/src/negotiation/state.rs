use roomlink_core::ParticipantId;
use std::fmt;

/// Which side of a peer link sends the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    /// The lexicographically smaller id initiates, so both ends agree
    /// without talking to each other.
    pub fn for_pair(local: &ParticipantId, remote: &ParticipantId) -> Self {
        if local < remote {
            Role::Initiator
        } else {
            Role::Responder
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => f.write_str("initiator"),
            Role::Responder => f.write_str("responder"),
        }
    }
}

/// Progress of a single peer link.
///
/// Initiator: `Idle -> OfferSent -> AnswerPending -> Connected`.
/// Responder: `Idle -> AnswerSent -> Connected`.
/// Any state can move to `Closed`, which is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NegotiationState {
    #[default]
    Idle,
    OfferSent,
    /// Answer received, remote description being applied.
    AnswerPending,
    AnswerSent,
    Connected,
    Closed,
}

impl NegotiationState {
    pub fn is_closed(&self) -> bool {
        matches!(self, NegotiationState::Closed)
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationState::Idle => "idle",
            NegotiationState::OfferSent => "offer-sent",
            NegotiationState::AnswerPending => "answer-pending",
            NegotiationState::AnswerSent => "answer-sent",
            NegotiationState::Connected => "connected",
            NegotiationState::Closed => "closed",
        };
        f.write_str(name)
    }
}
