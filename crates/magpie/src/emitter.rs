//! Fire-and-forget datagram output toward the bridge.
//!
//! Flushed payloads go out as JSON; reset acknowledgments and the no-notes
//! error signal go out as the short text forms the bridge already knows.
//! Send failures are logged and dropped: the host loop must keep consuming
//! messages whether or not anyone is listening on the other side.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::accumulator::AccumulatorEvent;

/// UDP sender for accumulator output.
pub struct BridgeEmitter {
    socket: UdpSocket,
    target: SocketAddr,
}

impl BridgeEmitter {
    /// Bind an ephemeral local socket aimed at the bridge's listen port.
    pub async fn new(host: &str, port: u16) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .context("Failed to bind outbound UDP socket")?;
        let target: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("Invalid bridge address {}:{}", host, port))?;
        Ok(Self { socket, target })
    }

    /// Serialize and send one accumulator event. Never propagates transport
    /// failures.
    pub async fn send(&self, event: &AccumulatorEvent) {
        let wire: String = match event {
            AccumulatorEvent::ResetAck => "reset".to_string(),
            AccumulatorEvent::NoNotes => "err no_notes".to_string(),
            AccumulatorEvent::Flush(payload) => match serde_json::to_string(payload) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to serialize capture payload");
                    return;
                }
            },
        };

        match self.socket.send_to(wire.as_bytes(), self.target).await {
            Ok(sent) => debug!(bytes = sent, target = %self.target, "emitted event"),
            Err(e) => warn!(error = %e, target = %self.target, "bridge send failed"),
        }
    }
}
