use roomlink_core::{ParticipantId, RoomId, Roster};

/// Members of one room, kept in join order.
#[derive(Debug, Default)]
pub(crate) struct Room {
    members: Vec<ParticipantId>,
    version: u64,
}

impl Room {
    pub(crate) fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.members.contains(participant_id)
    }

    /// Returns false if the participant was already a member.
    pub(crate) fn add(&mut self, participant_id: ParticipantId, version: u64) -> bool {
        if self.contains(&participant_id) {
            return false;
        }
        self.members.push(participant_id);
        self.version = version;
        true
    }

    /// Returns false if the participant was not a member.
    pub(crate) fn remove(&mut self, participant_id: &ParticipantId, version: u64) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != participant_id);
        if self.members.len() == before {
            return false;
        }
        self.version = version;
        true
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    pub(crate) fn roster(&self, room_id: &RoomId) -> Roster {
        Roster {
            room: room_id.clone(),
            version: self.version,
            participants: self.members.clone(),
        }
    }
}
