use crate::config::TopologyMode;
use crate::room::RoomRegistry;
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use futures::future::join_all;
use roomlink_core::{
    ParticipantId, RoomId, Roster, ServerMessage, SignalKind, SignalPayload, SignalingError,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

struct RouterInner {
    registry: RoomRegistry,
    output: Arc<dyn SignalingOutput>,
    current_rooms: DashMap<ParticipantId, RoomId>,
    topology: TopologyMode,
    dropped: AtomicU64,
}

/// Forwards signaling between members of the same room and announces
/// membership changes.
#[derive(Clone)]
pub struct RelayRouter {
    inner: Arc<RouterInner>,
}

impl RelayRouter {
    pub fn new(output: Arc<dyn SignalingOutput>, topology: TopologyMode) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                registry: RoomRegistry::new(),
                output,
                current_rooms: DashMap::new(),
                topology,
                dropped: AtomicU64::new(0),
            }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn topology(&self) -> TopologyMode {
        self.inner.topology
    }

    pub fn current_room(&self, participant_id: &ParticipantId) -> Option<RoomId> {
        self.inner
            .current_rooms
            .get(participant_id)
            .map(|room| room.value().clone())
    }

    /// Number of relayed signals that never reached their target.
    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Adds the participant to `room_id` and announces it.
    ///
    /// A participant sits in one room at a time: joining another room leaves
    /// the previous one first. Returns the roster the joiner was sent.
    pub async fn on_join(
        &self,
        participant_id: &ParticipantId,
        room_id: &RoomId,
    ) -> Result<Roster, SignalingError> {
        participant_id.validate()?;
        room_id.validate()?;

        if let Some(previous) = self.current_room(participant_id) {
            if &previous != room_id {
                self.on_leave(participant_id, &previous).await?;
            }
        }

        let outcome = self.inner.registry.join(participant_id, room_id)?;
        self.inner
            .current_rooms
            .insert(participant_id.clone(), room_id.clone());

        let roster = outcome.roster;

        if !outcome.newly_joined {
            self.deliver(participant_id, ServerMessage::Roster(roster.clone()))
                .await;
            return Ok(roster);
        }

        // Joiner first, then everyone else.
        self.deliver(participant_id, ServerMessage::Roster(roster.clone()))
            .await;
        let notice = match self.inner.topology {
            TopologyMode::FullRoster => ServerMessage::Roster(roster.clone()),
            TopologyMode::DirectNotify => ServerMessage::PeerJoined {
                room: room_id.clone(),
                participant_id: participant_id.clone(),
            },
        };
        self.broadcast(&outcome.others, notice).await;

        Ok(roster)
    }

    pub async fn on_leave(
        &self,
        participant_id: &ParticipantId,
        room_id: &RoomId,
    ) -> Result<(), SignalingError> {
        let Some(remaining) = self.inner.registry.leave(participant_id, room_id)? else {
            debug!(
                "Participant {} asked to leave '{}' without being a member",
                participant_id, room_id
            );
            return Ok(());
        };

        self.inner
            .current_rooms
            .remove_if(participant_id, |_, current| current == room_id);

        self.announce_departure(participant_id, remaining).await;
        Ok(())
    }

    /// Connection closed: leave every room and tell whoever is left.
    pub async fn on_disconnect(&self, participant_id: &ParticipantId) {
        info!("Participant {} disconnected", participant_id);
        self.inner.current_rooms.remove(participant_id);

        let remaining = match self
            .inner
            .registry
            .remove_participant_from_all_rooms(participant_id)
        {
            Ok(remaining) => remaining,
            Err(e) => {
                warn!("Disconnect of {:?} rejected: {}", participant_id, e);
                return;
            }
        };

        for roster in remaining {
            self.announce_departure(participant_id, roster).await;
        }

        info!(
            "{} rooms active, {} signals dropped so far",
            self.inner.registry.room_count(),
            self.dropped_count()
        );
    }

    /// Forwards `payload` from `from` to `to`, stamped with the real sender.
    ///
    /// An empty target is rejected with `InvalidArgument`. Signals to anyone
    /// outside the sender's current room, or to a participant that is no
    /// longer connected, are dropped and counted.
    pub async fn relay(
        &self,
        from: &ParticipantId,
        to: &ParticipantId,
        payload: SignalPayload,
    ) -> Result<(), SignalingError> {
        to.validate()?;
        let kind = payload.kind();

        let Some(room_id) = self.current_room(from) else {
            self.record_drop(from, to, kind, "sender is not in a room");
            return Ok(());
        };

        if from == to || !self.inner.registry.is_member(&room_id, to) {
            self.record_drop(from, to, kind, "target is not in the sender's room");
            return Ok(());
        }

        let msg = ServerMessage::Signal {
            from: from.clone(),
            payload,
        };
        if !self.inner.output.send(to, msg).await {
            self.record_drop(from, to, kind, "target is not connected");
            return Ok(());
        }

        debug!("Relayed {} from {} to {}", kind, from, to);
        Ok(())
    }

    async fn announce_departure(&self, participant_id: &ParticipantId, remaining: Roster) {
        if remaining.participants.is_empty() {
            return;
        }

        match self.inner.topology {
            TopologyMode::FullRoster => {
                let recipients = remaining.participants.clone();
                self.broadcast(&recipients, ServerMessage::Roster(remaining))
                    .await;
            }
            TopologyMode::DirectNotify => {
                let notice = ServerMessage::PeerLeft {
                    room: remaining.room.clone(),
                    participant_id: participant_id.clone(),
                };
                self.broadcast(&remaining.participants, notice).await;
            }
        }
    }

    async fn deliver(&self, participant_id: &ParticipantId, msg: ServerMessage) {
        if !self.inner.output.send(participant_id, msg).await {
            debug!("Membership notice for {} not delivered", participant_id);
        }
    }

    async fn broadcast(&self, recipients: &[ParticipantId], msg: ServerMessage) {
        join_all(
            recipients
                .iter()
                .map(|recipient| self.deliver(recipient, msg.clone())),
        )
        .await;
    }

    fn record_drop(
        &self,
        from: &ParticipantId,
        to: &ParticipantId,
        kind: SignalKind,
        reason: &str,
    ) {
        let total = self.inner.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(
            "Dropped {} from {} to {}: {} ({} dropped so far)",
            kind, from, to, reason, total
        );
    }
}

impl std::fmt::Debug for RelayRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayRouter")
            .field("topology", &self.inner.topology)
            .field("rooms", &self.inner.registry.room_count())
            .field("dropped", &self.dropped_count())
            .finish()
    }
}
