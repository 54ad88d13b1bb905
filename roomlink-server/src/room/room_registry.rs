use crate::room::room::Room;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use roomlink_core::{ParticipantId, RoomId, Roster, SignalingError};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Result of a [`RoomRegistry::join`].
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Members other than the joiner, in join order.
    pub others: Vec<ParticipantId>,
    /// Membership right after the join, joiner included.
    pub roster: Roster,
    /// False when the participant was already in the room.
    pub newly_joined: bool,
}

/// Which participants are in which room.
///
/// Every mutation of a room happens under that room's map entry lock, so
/// concurrent joins and leaves on the same room never interleave. Rooms are
/// dropped as soon as their last member leaves.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Room>,
    versions: AtomicU64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn join(
        &self,
        participant_id: &ParticipantId,
        room_id: &RoomId,
    ) -> Result<JoinOutcome, SignalingError> {
        participant_id.validate()?;
        room_id.validate()?;

        let mut room = self.rooms.entry(room_id.clone()).or_default();

        let newly_joined = !room.contains(participant_id);
        if newly_joined {
            let version = self.next_version();
            room.add(participant_id.clone(), version);
        }

        let roster = room.roster(room_id);
        drop(room);

        if newly_joined {
            info!("Participant {} joined room '{}'", participant_id, room_id);
        } else {
            debug!(
                "Participant {} already in room '{}', join ignored",
                participant_id, room_id
            );
        }

        Ok(JoinOutcome {
            others: roster.others(participant_id),
            roster,
            newly_joined,
        })
    }

    /// Removes the participant from the room.
    ///
    /// Returns the remaining membership, or `None` if the participant was not
    /// a member. An empty roster means the room was deleted.
    pub fn leave(
        &self,
        participant_id: &ParticipantId,
        room_id: &RoomId,
    ) -> Result<Option<Roster>, SignalingError> {
        participant_id.validate()?;
        room_id.validate()?;

        let Entry::Occupied(mut entry) = self.rooms.entry(room_id.clone()) else {
            return Ok(None);
        };

        if !entry.get().contains(participant_id) {
            return Ok(None);
        }

        let version = self.next_version();
        entry.get_mut().remove(participant_id, version);
        let roster = entry.get().roster(room_id);

        if entry.get().is_empty() {
            entry.remove();
            info!("Room '{}' is empty, removed", room_id);
        }

        info!("Participant {} left room '{}'", participant_id, room_id);
        Ok(Some(roster))
    }

    /// Snapshot of the members in join order. Empty if the room does not exist.
    pub fn members_of(&self, room_id: &RoomId) -> Vec<ParticipantId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
            .unwrap_or_default()
    }

    pub fn roster_of(&self, room_id: &RoomId) -> Option<Roster> {
        self.rooms.get(room_id).map(|room| room.roster(room_id))
    }

    pub fn is_member(&self, room_id: &RoomId, participant_id: &ParticipantId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|room| room.contains(participant_id))
    }

    pub fn rooms_of(&self, participant_id: &ParticipantId) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|room| room.value().contains(participant_id))
            .map(|room| room.key().clone())
            .collect()
    }

    /// Leaves every room the participant is in, returning what remains of each.
    pub fn remove_participant_from_all_rooms(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<Roster>, SignalingError> {
        participant_id.validate()?;

        let mut remaining = Vec::new();
        for room_id in self.rooms_of(participant_id) {
            if let Some(roster) = self.leave(participant_id, &room_id)? {
                remaining.push(roster);
            }
        }
        Ok(remaining)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
