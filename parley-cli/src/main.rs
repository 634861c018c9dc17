use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use parley::client::{
    EngineConfig, RoomEvent, RoomRegistry, SignalTransport, WebRtcEngineFactory, WsSignalTransport,
};
use parley::{PeerId, RoomId};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Join a signaling room and negotiate peer-to-peer sessions")]
struct Cli {
    /// Signaling server base URL.
    #[arg(long, default_value = "ws://localhost:8080")]
    url: String,

    /// Room to join (prompted for when omitted).
    #[arg(long)]
    room: Option<String>,

    /// Identity to join as (random when omitted).
    #[arg(long)]
    user: Option<String>,

    /// Peer to call right after connecting.
    #[arg(long)]
    call: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let room = match cli.room {
        Some(room) => room,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Room")
            .interact_text()?,
    };
    let user = match cli.user {
        Some(user) => user,
        None => uuid::Uuid::new_v4().to_string(),
    };

    let room_id = RoomId::new(room).context("Invalid room id")?;
    let user_id = PeerId::new(user).context("Invalid user id")?;

    println!(
        "{}",
        format!("🛰  Joining room {} as {}", room_id, user_id)
            .green()
            .bold()
    );

    let (transport, inbound) = WsSignalTransport::connect(&cli.url, &user_id, &room_id)
        .await
        .context("Could not reach the signaling server")?;
    let transport = Arc::new(transport);
    let engines = Arc::new(WebRtcEngineFactory::new(EngineConfig::default()));

    let (registry, mut events) =
        RoomRegistry::new(user_id, room_id, transport.clone(), engines);

    let runner = registry.clone();
    let registry_task = tokio::spawn(async move { runner.run(inbound).await });

    if let Some(peer) = cli.call {
        let peer_id = PeerId::new(peer).context("Invalid peer id")?;
        let session = registry.create_outbound_session(peer_id).await?;
        session.request_offer().await;
    }

    println!("{}", "Commands: call <peer> | drop <peer> | quit".cyan());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(e) => print_event(e),
                None => break,
            },

            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                if !handle_command(&registry, line.trim()).await {
                    break;
                }
            }
        }
    }

    transport.disconnect().await;
    let _ = registry_task.await;
    println!("{}", "Disconnected.".yellow());
    Ok(())
}

async fn handle_command(registry: &RoomRegistry, line: &str) -> bool {
    match line.split_once(' ') {
        Some(("call", peer)) => match PeerId::new(peer.trim()) {
            Ok(peer_id) => match registry.create_outbound_session(peer_id.clone()).await {
                Ok(session) => {
                    session.request_offer().await;
                    println!("{}", format!("📞 Calling {}...", peer_id).cyan());
                }
                Err(e) => println!("{}", format!("Cannot call {}: {}", peer_id, e).red()),
            },
            Err(e) => println!("{}", format!("Bad peer id: {}", e).red()),
        },

        Some(("drop", peer)) => {
            if let Ok(peer_id) = PeerId::new(peer.trim()) {
                registry.remove_session(&peer_id).await;
                println!("{}", format!("Dropped {}", peer_id).yellow());
            }
        }

        _ if line == "quit" => return false,
        _ if line.is_empty() => {}
        _ => println!("{}", "Commands: call <peer> | drop <peer> | quit".cyan()),
    }
    true
}

fn print_event(event: RoomEvent) {
    match event {
        RoomEvent::PeerConnected(peer_id) => {
            println!("{}", format!("✔ {} connected", peer_id).green().bold());
        }
        RoomEvent::PeerDisconnected(peer_id) => {
            println!("{}", format!("✖ {} disconnected", peer_id).yellow());
        }
        RoomEvent::RemoteChannel { peer_id, channel } => {
            println!(
                "{}",
                format!("⇄ {} opened channel '{}'", peer_id, channel.label()).cyan()
            );
        }
        RoomEvent::ChannelData { peer_id, data } => {
            println!(
                "{}",
                format!("{}: {}", peer_id, String::from_utf8_lossy(&data)).normal()
            );
        }
        RoomEvent::SessionFailed { peer_id, error } => {
            println!(
                "{}",
                format!("✖ Session with {} failed: {}", peer_id, error).red()
            );
        }
    }
}
