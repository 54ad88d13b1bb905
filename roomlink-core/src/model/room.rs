use crate::error::SignalingError;
use crate::model::ParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied room name. Only emptiness is checked.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn validate(&self) -> Result<(), SignalingError> {
        if self.0.trim().is_empty() {
            return Err(SignalingError::InvalidArgument(
                "room id must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full membership of a room at one point in time.
///
/// `version` comes from a registry-wide counter, so a client can drop any
/// roster older than the last one it applied for the same room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub room: RoomId,
    pub version: u64,
    pub participants: Vec<ParticipantId>,
}

impl Roster {
    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.participants.contains(participant_id)
    }

    /// Members other than `participant_id`, in join order.
    pub fn others(&self, participant_id: &ParticipantId) -> Vec<ParticipantId> {
        self.participants
            .iter()
            .filter(|p| *p != participant_id)
            .cloned()
            .collect()
    }
}
