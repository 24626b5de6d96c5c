//! UDP frame sender (producer side of the wire format)

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use skelbridge_core::{BridgeError, BridgeResult, Frame};
use skelbridge_wire::{JointNaming, WirePacket, MAX_PACKET_SIZE};

use crate::ingest::DEFAULT_PORT;

#[derive(Clone, Debug)]
pub struct SenderConfig {
    pub dest: SocketAddr,
    pub naming: JointNaming,
}

impl Default for SenderConfig {
    fn default() -> Self {
        SenderConfig {
            dest: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            naming: JointNaming::Full,
        }
    }
}

/// Sends frames as one JSON datagram each
pub struct UdpFrameSender {
    socket: UdpSocket,
    config: SenderConfig,
}

impl UdpFrameSender {
    /// Bind an ephemeral local port of the destination's address family
    pub async fn bind(config: SenderConfig) -> BridgeResult<Self> {
        let local: IpAddr = match config.dest {
            SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
            SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
        };
        let addr = SocketAddr::new(local, 0);
        let socket = UdpSocket::bind(addr).await.map_err(|e| BridgeError::Bind {
            addr,
            reason: e.to_string(),
        })?;

        tracing::info!(dest = %config.dest, "UDP sender initialized");
        Ok(UdpFrameSender { socket, config })
    }

    pub fn dest(&self) -> SocketAddr {
        self.config.dest
    }

    /// Send a frame. Frames without skeletons are skipped; returns whether
    /// a datagram went out.
    pub async fn send(&self, frame: &Frame) -> BridgeResult<bool> {
        if frame.is_empty() {
            return Ok(false);
        }

        let payload = WirePacket::from_frame(frame, self.config.naming).encode()?;
        if payload.len() > MAX_PACKET_SIZE {
            return Err(BridgeError::Transport(format!(
                "Datagram too large: {} > {}",
                payload.len(),
                MAX_PACKET_SIZE
            )));
        }

        self.send_bytes(&payload).await?;
        Ok(true)
    }

    /// Send raw bytes
    pub async fn send_bytes(&self, bytes: &[u8]) -> BridgeResult<()> {
        self.socket
            .send_to(bytes, self.config.dest)
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        Ok(())
    }
}
