use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::UdpSocket;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use croonproto::{HostMessage, SessionDefaults};
use magpie::{Accumulator, BridgeEmitter};

/// Magpie - host-side note collector for Croon
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a config file (overrides the user config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// UDP port to listen on for host messages
    #[arg(long)]
    listen_port: Option<u16>,

    /// Bridge host to emit captures toward
    #[arg(long)]
    bridge_host: Option<String>,

    /// Bridge port to emit captures toward
    #[arg(long)]
    bridge_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = croonconf::CroonConfig::load_with_override(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(port) = cli.listen_port {
        config.udp.listen_port = port;
    }
    if let Some(host) = cli.bridge_host {
        config.udp.bridge_host = host;
    }
    if let Some(port) = cli.bridge_port {
        config.udp.bridge_port = port;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    for file in &sources.files {
        info!(path = %file.display(), "loaded config file");
    }
    for var in &sources.env_overrides {
        info!(var = %var, "applied environment override");
    }

    let listen_addr = format!("0.0.0.0:{}", config.udp.listen_port);
    let socket = UdpSocket::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    info!(addr = %listen_addr, "listening for host messages");

    let emitter = BridgeEmitter::new(&config.udp.bridge_host, config.udp.bridge_port)
        .await
        .context("Failed to set up bridge emitter")?;
    info!(
        host = %config.udp.bridge_host,
        port = config.udp.bridge_port,
        "emitting captures to bridge"
    );

    let defaults = SessionDefaults {
        bpm: config.session.bpm,
        mood: config.session.mood.clone(),
        length_value: config.session.length_value,
        length_unit: config.session.length_unit.clone(),
        adventureness: config.session.adventureness,
    };
    let mut accumulator = Accumulator::new(defaults);
    let mut buf = vec![0u8; 65536];

    loop {
        let (len, peer) = socket
            .recv_from(&mut buf)
            .await
            .context("UDP receive failed")?;
        let text = String::from_utf8_lossy(&buf[..len]);
        debug!(bytes = len, peer = %peer, "received datagram");

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(message) = HostMessage::parse_line(line) else {
                continue;
            };
            if let Some(event) = accumulator.handle(message) {
                emitter.send(&event).await;
            }
        }
    }
}
