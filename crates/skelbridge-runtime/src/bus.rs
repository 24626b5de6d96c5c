//! Bus pump
//!
//! Drains published collections on its own task, separate from the
//! receive loop. Each collection is logged and, when configured, forwarded
//! as an encoded payload over UDP and appended to a sequential log. Sink
//! failures are logged and counted; the pump keeps draining.

use std::fs::File;
use std::io::BufWriter;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use skelbridge_core::{BridgeError, BridgeResult};
use skelbridge_marker::{MarkerCodec, Published, PublishedReceiver};
use skelbridge_record::{LogWriter, TopicMetadata};

/// Largest UDP payload deliverable over IPv4
pub const MAX_FORWARD_PAYLOAD: usize = 65_507;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BusStats {
    pub collections: u64,
    pub markers: u64,
    pub forwarded: u64,
    pub recorded: u64,
    pub sink_errors: u64,
}

struct Forwarder {
    socket: UdpSocket,
    dest: SocketAddr,
}

/// Consumer side of the publish channel
pub struct BusPump {
    rx: PublishedReceiver,
    forward: Option<Forwarder>,
    log: Option<LogWriter<BufWriter<File>>>,
    stats: BusStats,
}

impl BusPump {
    pub fn new(rx: PublishedReceiver) -> Self {
        BusPump {
            rx,
            forward: None,
            log: None,
            stats: BusStats::default(),
        }
    }

    /// Forward each encoded collection as one datagram to `dest`
    pub async fn with_forwarding(mut self, dest: SocketAddr) -> BridgeResult<Self> {
        let local = match dest {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local).await.map_err(|e| BridgeError::Bind {
            addr: local,
            reason: e.to_string(),
        })?;
        tracing::info!(%dest, "forwarding marker collections");
        self.forward = Some(Forwarder { socket, dest });
        Ok(self)
    }

    /// Append each collection to a new log at `path`
    pub fn with_log(mut self, path: &Path) -> BridgeResult<Self> {
        self.log = Some(LogWriter::create(path)?);
        tracing::info!(path = %path.display(), "recording marker collections");
        Ok(self)
    }

    pub fn spawn(self) -> JoinHandle<BridgeResult<BusStats>> {
        tokio::spawn(self.run())
    }

    /// Run until every publisher is dropped, then flush the log
    pub async fn run(mut self) -> BridgeResult<BusStats> {
        while let Some(message) = self.rx.recv().await {
            self.deliver(message).await;
        }

        if let Some(log) = self.log.take() {
            log.finish()?;
        }

        tracing::info!(
            collections = self.stats.collections,
            markers = self.stats.markers,
            forwarded = self.stats.forwarded,
            recorded = self.stats.recorded,
            sink_errors = self.stats.sink_errors,
            "bus pump stopped"
        );
        Ok(self.stats)
    }

    async fn deliver(&mut self, message: Published) {
        self.stats.collections += 1;
        self.stats.markers += message.markers.len() as u64;
        tracing::debug!(
            topic = %message.topic,
            timestamp = message.timestamp.as_millis(),
            markers = message.markers.len(),
            "marker collection"
        );

        if self.forward.is_none() && self.log.is_none() {
            return;
        }
        let payload = MarkerCodec::encode(&message.markers);

        if let Some(forward) = &self.forward {
            if payload.len() > MAX_FORWARD_PAYLOAD {
                self.stats.sink_errors += 1;
                tracing::warn!(
                    dest = %forward.dest,
                    markers = message.markers.len(),
                    "collection too large to forward: {} > {} bytes",
                    payload.len(),
                    MAX_FORWARD_PAYLOAD
                );
            } else {
                match forward.socket.send_to(&payload, forward.dest).await {
                    Ok(_) => self.stats.forwarded += 1,
                    Err(e) => {
                        self.stats.sink_errors += 1;
                        tracing::warn!(dest = %forward.dest, "forward failed: {}", e);
                    }
                }
            }
        }

        if let Some(log) = &mut self.log {
            let result = log
                .create_topic(&TopicMetadata::marker_array(message.topic.clone()))
                .and_then(|_| log.write(&message.topic, message.timestamp.as_nanos(), &payload));
            match result {
                Ok(()) => self.stats.recorded += 1,
                Err(e) => {
                    self.stats.sink_errors += 1;
                    tracing::warn!(topic = %message.topic, "log write failed: {}", e);
                }
            }
        }
    }
}
