use crate::transport::{
    MediaTransport, MediaTransportFactory, SdpType, SessionDescription, StreamHandle,
    TransportEvent,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use roomlink_core::{CandidatePayload, IceServerConfig, ParticipantId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds a webrtc-rs peer connection per remote participant.
#[derive(Clone, Default)]
pub struct RtcTransportFactory {
    ice_servers: Vec<IceServerConfig>,
    local_tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl RtcTransportFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            ice_servers,
            local_tracks: Vec::new(),
        }
    }

    /// Adds a track that is sent to every peer. Without local tracks the
    /// transport only receives.
    pub fn with_local_track(mut self, track: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        self.local_tracks.push(track);
        self
    }

    fn rtc_configuration(&self) -> RTCConfiguration {
        let ice_servers = self
            .ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect();

        RTCConfiguration {
            ice_servers,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MediaTransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let peer_connection = Arc::new(
            api.new_peer_connection(self.rtc_configuration())
                .await
                .context("Failed to create peer connection")?,
        );

        for track in &self.local_tracks {
            peer_connection
                .add_track(Arc::clone(track))
                .await
                .context("Failed to add local track")?;
        }

        register_callbacks(&peer_connection, remote, events);

        Ok(Arc::new(RtcTransport {
            remote: remote.clone(),
            peer_connection,
        }))
    }
}

fn register_callbacks(
    peer_connection: &RTCPeerConnection,
    remote: &ParticipantId,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let state_tx = events.clone();
    let state_remote = remote.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |state: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let remote = state_remote.clone();
            Box::pin(async move {
                info!("Peer connection to {} is {:?}", remote, state);
                match state {
                    RTCPeerConnectionState::Connected => {
                        let _ = tx.send(TransportEvent::Connected);
                    }
                    RTCPeerConnectionState::Failed => {
                        let _ = tx.send(TransportEvent::Failed(format!(
                            "peer connection to {remote} failed"
                        )));
                    }
                    _ => {}
                }
            })
        },
    ));

    let ice_tx = events.clone();
    peer_connection.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
        let tx = ice_tx.clone();
        Box::pin(async move {
            let Some(candidate) = candidate else { return };
            let Ok(init) = candidate.to_json() else {
                return;
            };
            let _ = tx.send(TransportEvent::LocalCandidate(CandidatePayload {
                candidate: init.candidate,
                sdp_mid: init.sdp_mid,
                sdp_m_line_index: init.sdp_mline_index,
            }));
        })
    }));

    let track_tx = events;
    let seen_streams = Arc::new(Mutex::new(HashSet::new()));
    peer_connection.on_track(Box::new(
        move |track: Arc<TrackRemote>,
              _receiver: Arc<RTCRtpReceiver>,
              _transceiver: Arc<RTCRtpTransceiver>| {
            let tx = track_tx.clone();
            let stream_id = track.stream_id().to_string();
            let first_track = seen_streams
                .lock()
                .map(|mut seen| seen.insert(stream_id.clone()))
                .unwrap_or(false);
            Box::pin(async move {
                if first_track {
                    debug!("Remote stream {} started", stream_id);
                    let _ = tx.send(TransportEvent::RemoteMedia(StreamHandle(stream_id)));
                }
            })
        },
    ));
}

/// [`MediaTransport`] backed by a webrtc-rs peer connection.
pub struct RtcTransport {
    remote: ParticipantId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcTransport {
    fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
        let rtc = match description.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
        };
        Ok(rtc)
    }

    /// Offers need at least one m-line; receive audio and video when nothing is sent.
    async fn ensure_media_sections(&self) -> Result<()> {
        if !self.peer_connection.get_transceivers().await.is_empty() {
            return Ok(());
        }
        for kind in [RTPCodecType::Audio, RTPCodecType::Video] {
            self.peer_connection
                .add_transceiver_from_kind(kind, None)
                .await
                .context("Failed to add transceiver")?;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaTransport for RtcTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.ensure_media_sections().await?;
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self, _remote: &SessionDescription) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(Self::to_rtc(description)?)
            .await
            .context("Failed to set local description")?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(Self::to_rtc(description)?)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: CandidatePayload) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        debug!("Closing peer connection to {}", self.remote);
        self.peer_connection
            .close()
            .await
            .context("Failed to close peer connection")?;
        Ok(())
    }
}
