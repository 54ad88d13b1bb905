use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use roomlink::client::{
    ClientConfig, MeshEvent, MeshOrchestrator, RtcTransportFactory, SignalingConnection,
};
use roomlink::model::IceServerConfig;
use roomlink::server::{ServerConfig, TopologyMode};
use roomlink::{ParticipantId, RoomId};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roomlink", version, about = "Room-based WebRTC signaling")]
struct Cli {
    /// Tracing filter, e.g. `info` or `roomlink_server=debug`.
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve {
        #[arg(long, env = "ROOMLINK_BIND", default_value = "0.0.0.0:5000")]
        bind: SocketAddr,

        /// `full-roster` or `direct-notify`.
        #[arg(long, env = "ROOMLINK_TOPOLOGY", default_value = "full-roster")]
        topology: TopologyMode,

        /// STUN/TURN urls pushed to clients. Defaults to a public STUN server.
        #[arg(long = "ice-server", env = "ROOMLINK_ICE_SERVERS", value_delimiter = ',')]
        ice_servers: Vec<String>,
    },

    /// Join a room as a headless participant and report what happens.
    Join {
        room: String,

        #[arg(long, env = "ROOMLINK_URL", default_value = "ws://127.0.0.1:5000/ws")]
        url: String,

        /// Overrides the servers the signaling server suggests.
        #[arg(long = "ice-server", value_delimiter = ',')]
        ice_servers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            bind,
            topology,
            ice_servers,
        } => serve(bind, topology, ice_servers).await,
        Commands::Join {
            room,
            url,
            ice_servers,
        } => join(RoomId::from(room), url, ice_servers).await,
    }
}

fn ice_config(urls: Vec<String>) -> Vec<IceServerConfig> {
    if urls.is_empty() {
        IceServerConfig::default_stun()
    } else {
        urls.into_iter().map(IceServerConfig::stun).collect()
    }
}

async fn serve(bind: SocketAddr, topology: TopologyMode, ice_servers: Vec<String>) -> Result<()> {
    let config = ServerConfig {
        bind_addr: bind,
        topology,
        ice_servers: ice_config(ice_servers),
    };

    println!(
        "{}",
        format!("Starting signaling server on {bind} ({topology})")
            .green()
            .bold()
    );
    roomlink::server::run(config).await
}

async fn join(room: RoomId, url: String, ice_servers: Vec<String>) -> Result<()> {
    room.validate()?;

    let config = ClientConfig {
        server_url: url,
        room: Some(room.clone()),
        ..Default::default()
    };

    println!("{}", format!("Connecting to {}...", config.server_url).cyan());
    let connection = SignalingConnection::connect(&config)
        .await
        .context("Failed to reach signaling server")?;

    let local = connection.participant_id.clone();
    println!("{} {}", "Connected as".green(), local.to_string().bold());

    let ice_servers = if ice_servers.is_empty() {
        connection.ice_servers.clone()
    } else {
        ice_config(ice_servers)
    };
    let factory = Arc::new(RtcTransportFactory::new(ice_servers));

    let sink = connection.sink.clone();
    let (events_tx, mut events) = mpsc::unbounded_channel::<MeshEvent>();
    let (handle, mut mesh) = MeshOrchestrator::spawn(
        local.clone(),
        connection.inbound,
        connection.sink,
        factory,
        Arc::new(events_tx),
    );

    if let Some(room) = config.room {
        handle.join_room(room.clone())?;
        println!("{} '{}'", "Joining room".cyan(), room);
    }

    loop {
        tokio::select! {
            Some(event) = events.recv() => print_event(&local, event),

            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Leaving room...".yellow());
                handle.leave_room()?;
                // answered only after the Leave frame is queued
                handle.snapshot().await?;
                sink.close();
                if tokio::time::timeout(config.handshake_timeout, connection.task)
                    .await
                    .is_err()
                {
                    warn!("Signaling connection did not close in time");
                }
                break;
            }

            _ = &mut mesh => {
                println!("{}", "Signaling connection closed".red().bold());
                break;
            }
        }
    }

    info!("Participant {} finished", local);
    Ok(())
}

fn print_event(local: &ParticipantId, event: MeshEvent) {
    match event {
        MeshEvent::ParticipantsChanged(participants) => {
            let names: Vec<String> = participants
                .iter()
                .map(|id| {
                    if id == local {
                        format!("{id} (you)")
                    } else {
                        id.to_string()
                    }
                })
                .collect();
            println!("{} {}", "Participants:".cyan().bold(), names.join(", "));
        }
        MeshEvent::RemoteMedia(participant, stream) => {
            println!("{} stream {} from {}", "Media:".green().bold(), stream, participant);
        }
        MeshEvent::SessionFailed(participant, error) => {
            println!(
                "{} link to {} failed: {}",
                "Error:".red().bold(),
                participant,
                error
            );
        }
    }
}
