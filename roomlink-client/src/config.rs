use roomlink_core::{IceServerConfig, RoomId};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the signaling server, e.g. `ws://host:5000/ws`.
    pub server_url: String,
    /// Room to join right after connecting, if any.
    pub room: Option<RoomId>,
    /// Used when the server does not push its own `IceConfig`.
    pub ice_servers: Vec<IceServerConfig>,
    pub handshake_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:5000/ws".to_owned(),
            room: None,
            ice_servers: IceServerConfig::default_stun(),
            handshake_timeout: Duration::from_secs(5),
        }
    }
}
