use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::signaling::SignalingSink;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use roomlink_core::{ClientMessage, IceServerConfig, ParticipantId, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
enum Outbound {
    Frame(ClientMessage),
    Close,
}

/// Queues frames for the WebSocket writer task.
#[derive(Debug, Clone)]
pub struct WsSignalingSink {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl WsSignalingSink {
    /// Closes the socket once every frame queued so far has been written.
    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

#[async_trait]
impl SignalingSink for WsSignalingSink {
    async fn send(&self, msg: ClientMessage) -> Result<(), ClientError> {
        self.tx
            .send(Outbound::Frame(msg))
            .map_err(|_| ClientError::ConnectionClosed)
    }
}

/// An established connection to the signaling server.
pub struct SignalingConnection {
    pub participant_id: ParticipantId,
    /// From the server's `IceConfig`, or the configured fallback.
    pub ice_servers: Vec<IceServerConfig>,
    pub sink: Arc<WsSignalingSink>,
    /// Every server frame after the handshake. Closes with the connection.
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
    /// Finishes when the socket is closed by either side.
    pub task: JoinHandle<()>,
}

impl SignalingConnection {
    /// Connects and waits for the server to assign an id.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let (mut stream, _) = connect_async(config.server_url.as_str())
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;

        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        let participant_id = match next_frame(&mut stream, config.handshake_timeout).await? {
            ServerMessage::Welcome { participant_id } => participant_id,
            other => return Err(ClientError::Handshake(format!("{other:?}"))),
        };

        let ice_servers = match next_frame(&mut stream, config.handshake_timeout).await {
            Ok(ServerMessage::IceConfig { ice_servers }) => ice_servers,
            Ok(other) => {
                let _ = inbound_tx.send(other);
                config.ice_servers.clone()
            }
            Err(e) => {
                debug!("No IceConfig from server ({}), using configured servers", e);
                config.ice_servers.clone()
            }
        };

        info!(
            "Connected to {} as participant {}",
            config.server_url, participant_id
        );

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(stream, outbound_rx, inbound_tx));

        Ok(Self {
            participant_id,
            ice_servers,
            sink: Arc::new(WsSignalingSink { tx: outbound_tx }),
            inbound,
            task,
        })
    }
}

async fn next_frame(stream: &mut WsStream, timeout: Duration) -> Result<ServerMessage, ClientError> {
    loop {
        let frame = tokio::time::timeout(timeout, stream.next())
            .await
            .map_err(|_| ClientError::Handshake("timed out".to_owned()))?
            .ok_or(ClientError::ConnectionClosed)?
            .map_err(|e| ClientError::Connect(e.to_string()))?;

        match frame {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str())
                    .map_err(|e| ClientError::Handshake(e.to_string()));
            }
            Message::Close(_) => return Err(ClientError::ConnectionClosed),
            _ => {}
        }
    }
}

async fn run_connection(
    stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    inbound: mpsc::UnboundedSender<ServerMessage>,
) {
    let (mut ws_sender, mut ws_receiver) = stream.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(Outbound::Frame(msg)) = outbound.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize {:?}: {}", msg, e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = ws_receiver.next().await {
            match frame {
                Message::Text(text) => match serde_json::from_str::<ServerMessage>(text.as_str()) {
                    Ok(msg) => {
                        if inbound.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring malformed server frame: {}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    };

    info!("Signaling connection closed");
}
