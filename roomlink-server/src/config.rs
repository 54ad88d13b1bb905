use roomlink_core::IceServerConfig;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// How membership changes are announced to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopologyMode {
    /// Every member receives the full versioned roster on each change.
    #[default]
    FullRoster,
    /// The joiner receives the roster, everybody else gets `PeerJoined` / `PeerLeft`.
    DirectNotify,
}

impl FromStr for TopologyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full-roster" | "roster" => Ok(TopologyMode::FullRoster),
            "direct-notify" | "notify" => Ok(TopologyMode::DirectNotify),
            other => Err(format!(
                "unknown topology '{other}', expected 'full-roster' or 'direct-notify'"
            )),
        }
    }
}

impl fmt::Display for TopologyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyMode::FullRoster => f.write_str("full-roster"),
            TopologyMode::DirectNotify => f.write_str("direct-notify"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub topology: TopologyMode,
    /// Pushed to every participant right after `Welcome`.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            topology: TopologyMode::default(),
            ice_servers: IceServerConfig::default_stun(),
        }
    }
}
