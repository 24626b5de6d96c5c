//! Diagnostic listener
//!
//! Test harness for producers: receives for a bounded time (or packet
//! count) and reports whether each datagram decodes and what it contains.
//! Nothing is transformed or published.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{timeout, Instant};

use skelbridge_core::{BridgeError, BridgeResult};
use skelbridge_wire::{PacketShape, MAX_PACKET_SIZE};

use crate::ingest::DEFAULT_PORT;

/// Diagnostic listener configuration
#[derive(Clone, Debug)]
pub struct DiagnosticConfig {
    pub bind_addr: SocketAddr,
    /// Total listening time
    pub duration: Duration,
    /// Upper bound for a single wait
    pub read_timeout: Duration,
    /// Stop after this many datagrams
    pub max_packets: Option<usize>,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            duration: Duration::from_secs(15),
            read_timeout: Duration::from_secs(2),
            max_packets: None,
        }
    }
}

/// One received datagram
#[derive(Clone, Debug)]
pub struct PacketReport {
    /// 1-based arrival index
    pub index: usize,
    pub from: SocketAddr,
    pub bytes: usize,
    pub shape: PacketShape,
}

#[derive(Clone, Debug, Default)]
pub struct DiagnosticReport {
    pub packets: Vec<PacketReport>,
    /// Failed socket reads
    pub read_errors: usize,
}

impl DiagnosticReport {
    pub fn total(&self) -> usize {
        self.packets.len()
    }

    /// Datagrams that parsed as JSON
    pub fn json_count(&self) -> usize {
        self.packets.iter().filter(|p| p.shape.is_json()).count()
    }

    /// Datagrams that failed to parse
    pub fn invalid_count(&self) -> usize {
        self.total() - self.json_count()
    }

    /// Datagrams that meet the frame wire contract
    pub fn conforming_count(&self) -> usize {
        self.packets
            .iter()
            .filter(|p| matches!(p.shape, PacketShape::Json { conforms: true, .. }))
            .count()
    }
}

/// Bound diagnostic socket
pub struct DiagnosticListener {
    socket: UdpSocket,
    config: DiagnosticConfig,
}

impl DiagnosticListener {
    pub async fn bind(config: DiagnosticConfig) -> BridgeResult<Self> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|e| BridgeError::Bind {
                addr: config.bind_addr,
                reason: e.to_string(),
            })?;
        Ok(DiagnosticListener { socket, config })
    }

    /// Get local address
    pub fn local_addr(&self) -> BridgeResult<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| BridgeError::Transport(e.to_string()))
    }

    /// Listen until the duration elapses or the packet limit is reached.
    /// The socket is closed on return.
    pub async fn run(self) -> DiagnosticReport {
        let deadline = Instant::now() + self.config.duration;
        let mut report = DiagnosticReport::default();
        let mut buf = vec![0u8; MAX_PACKET_SIZE];

        tracing::info!(addr = ?self.socket.local_addr().ok(), "diagnostic listener running");

        loop {
            if self
                .config
                .max_packets
                .is_some_and(|max| report.total() >= max)
            {
                break;
            }

            let Some(wait) = next_wait(self.config.read_timeout, deadline, Instant::now()) else {
                break;
            };

            let (len, from) = match timeout(wait, self.socket.recv_from(&mut buf)).await {
                Ok(Ok(received)) => received,
                Ok(Err(e)) => {
                    report.read_errors += 1;
                    tracing::warn!("UDP receive error: {}", e);
                    // Back off for one read period so a failing socket does not spin
                    tokio::time::sleep(wait).await;
                    continue;
                }
                // Read timeout, check the deadline again
                Err(_) => continue,
            };

            let packet = PacketReport {
                index: report.total() + 1,
                from,
                bytes: len,
                shape: PacketShape::probe(&buf[..len]),
            };
            log_packet(&packet);
            report.packets.push(packet);
        }

        tracing::info!(
            total = report.total(),
            json = report.json_count(),
            invalid = report.invalid_count(),
            conforming = report.conforming_count(),
            read_errors = report.read_errors,
            "diagnostic listener finished"
        );
        report
    }
}

/// Longest single wait before `deadline`, `None` once it has passed
fn next_wait(read_timeout: Duration, deadline: Instant, now: Instant) -> Option<Duration> {
    if now >= deadline {
        return None;
    }
    Some(read_timeout.min(deadline - now))
}

fn log_packet(packet: &PacketReport) {
    match &packet.shape {
        PacketShape::Json {
            skeletons,
            joints,
            conforms,
        } => tracing::info!(
            index = packet.index,
            from = %packet.from,
            bytes = packet.bytes,
            skeletons = ?skeletons,
            joints,
            conforms,
            "received JSON"
        ),
        PacketShape::InvalidJson { preview } => tracing::warn!(
            index = packet.index,
            from = %packet.from,
            bytes = packet.bytes,
            "received invalid JSON: {}...",
            preview
        ),
        PacketShape::NotUtf8 => tracing::warn!(
            index = packet.index,
            from = %packet.from,
            bytes = packet.bytes,
            "received non UTF-8 payload"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(duration: Duration, max_packets: Option<usize>) -> DiagnosticConfig {
        DiagnosticConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            duration,
            read_timeout: Duration::from_millis(50),
            max_packets,
        }
    }

    #[test]
    fn test_next_wait_bounded_by_deadline() {
        let now = Instant::now();
        let read_timeout = Duration::from_millis(50);

        assert_eq!(
            next_wait(read_timeout, now + Duration::from_secs(1), now),
            Some(read_timeout)
        );
        assert_eq!(
            next_wait(read_timeout, now + Duration::from_millis(20), now),
            Some(Duration::from_millis(20))
        );
        assert_eq!(next_wait(read_timeout, now, now), None);
        assert_eq!(next_wait(read_timeout, now, now + Duration::from_millis(1)), None);
    }

    #[tokio::test]
    async fn test_reports_shapes_until_packet_limit() {
        let listener = DiagnosticListener::bind(config(Duration::from_secs(5), Some(3)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender
            .send_to(br#"{"skeletons":[{"id":0,"joints":{}},{"id":1,"joints":{}}]}"#, addr)
            .await
            .unwrap();
        sender.send_to(b"not json at all", addr).await.unwrap();
        sender.send_to(br#"{"other":true}"#, addr).await.unwrap();

        let report = listener.run().await;
        assert_eq!(report.total(), 3);
        assert_eq!(report.json_count(), 2);
        assert_eq!(report.invalid_count(), 1);

        assert_eq!(report.packets[0].index, 1);
        assert!(matches!(
            report.packets[0].shape,
            PacketShape::Json {
                skeletons: Some(2),
                ..
            }
        ));
        assert!(matches!(report.packets[1].shape, PacketShape::InvalidJson { .. }));
        assert!(matches!(
            report.packets[2].shape,
            PacketShape::Json { skeletons: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_stops_after_duration_without_traffic() {
        let listener = DiagnosticListener::bind(config(Duration::from_millis(200), None))
            .await
            .unwrap();

        let started = std::time::Instant::now();
        let report = listener.run().await;
        assert_eq!(report.total(), 0);
        assert_eq!(report.read_errors, 0);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
