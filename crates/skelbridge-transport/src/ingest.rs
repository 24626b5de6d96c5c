//! Live UDP ingestion service
//!
//! The receive loop runs on its own task, separate from the bus. Each
//! datagram goes through the [`FramePipeline`] before the next read, so
//! collections are published in arrival order. Lost datagrams are not
//! recovered and failed publishes are not retried.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use skelbridge_core::{BridgeError, BridgeResult, Timestamp};
use skelbridge_marker::{MarkerEncoder, Publisher, DEFAULT_TOPIC};
use skelbridge_wire::MAX_PACKET_SIZE;

use crate::FramePipeline;

/// Default UDP listen port
pub const DEFAULT_PORT: u16 = 8888;

/// Ingestion service configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Address to listen on
    pub bind_addr: SocketAddr,
    /// Topic collections are published on
    pub topic: String,
    /// Receive buffer, one datagram
    pub recv_buffer_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            topic: DEFAULT_TOPIC.to_string(),
            recv_buffer_size: MAX_PACKET_SIZE,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub packets_received: u64,
    pub frames_published: u64,
    pub markers_published: u64,
    /// Malformed or schema-violating datagrams
    pub packets_discarded: u64,
    pub read_errors: u64,
    pub publish_errors: u64,
}

/// Handle to a running ingestion service
///
/// Dropping the handle stops the loop; [`IngestService::stop`] also waits
/// for it to exit.
pub struct IngestService {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    stats: Arc<Mutex<IngestStats>>,
}

impl IngestService {
    /// Bind the socket and spawn the receive loop. Bind failure is fatal.
    pub async fn start<P>(config: IngestConfig, encoder: MarkerEncoder, publisher: P) -> BridgeResult<Self>
    where
        P: Publisher + 'static,
    {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|e| BridgeError::Bind {
                addr: config.bind_addr,
                reason: e.to_string(),
            })?;

        let local_addr = socket
            .local_addr()
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        let running = Arc::new(AtomicBool::new(true));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(IngestStats::default()));

        let receive_loop = ReceiveLoop {
            socket,
            buffer_size: config.recv_buffer_size.max(1),
            pipeline: FramePipeline::new(config.topic, encoder, publisher),
            running: Arc::clone(&running),
            shutdown: shutdown_rx,
            stats: Arc::clone(&stats),
        };

        let task = tokio::spawn(receive_loop.run());
        tracing::info!(%local_addr, "UDP ingestion started");

        Ok(IngestService {
            local_addr,
            running,
            shutdown,
            task: Some(task),
            stats,
        })
    }

    /// Get local address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> IngestStats {
        self.stats.lock().clone()
    }

    /// Stop the loop and wait for it to exit. The socket is closed when
    /// this returns.
    pub async fn stop(mut self) -> IngestStats {
        self.signal_stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("UDP receive loop ended abnormally: {}", e);
            }
        }

        let stats = self.stats();
        tracing::info!(
            received = stats.packets_received,
            published = stats.frames_published,
            discarded = stats.packets_discarded,
            read_errors = stats.read_errors,
            publish_errors = stats.publish_errors,
            "UDP ingestion stopped"
        );
        stats
    }

    fn signal_stop(&self) {
        self.running.store(false, Ordering::Release);
        // Receiver gone means the loop already exited
        let _ = self.shutdown.send(true);
    }
}

impl Drop for IngestService {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.signal_stop();
            task.abort();
        }
    }
}

struct ReceiveLoop<P> {
    socket: UdpSocket,
    buffer_size: usize,
    pipeline: FramePipeline<P>,
    running: Arc<AtomicBool>,
    shutdown: watch::Receiver<bool>,
    stats: Arc<Mutex<IngestStats>>,
}

impl<P: Publisher> ReceiveLoop<P> {
    async fn run(mut self) {
        let mut buf = vec![0u8; self.buffer_size];

        while self.running.load(Ordering::Acquire) {
            tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                result = self.socket.recv_from(&mut buf) => match result {
                    Ok((len, from)) => self.handle_datagram(&buf[..len], from),
                    Err(e) => {
                        self.stats.lock().read_errors += 1;
                        tracing::warn!("UDP receive error: {}", e);
                    }
                },
            }
        }

        self.running.store(false, Ordering::Release);
        tracing::debug!("UDP receive loop exited");
    }

    fn handle_datagram(&self, datagram: &[u8], from: SocketAddr) {
        self.stats.lock().packets_received += 1;

        match self.pipeline.process(datagram, Timestamp::now()) {
            Ok(markers) => {
                let mut stats = self.stats.lock();
                stats.frames_published += 1;
                stats.markers_published += markers as u64;
            }
            Err(e) if e.is_discardable() => {
                self.stats.lock().packets_discarded += 1;
                tracing::debug!(%from, "discarding datagram: {}", e);
            }
            Err(e) => {
                self.stats.lock().publish_errors += 1;
                tracing::warn!(topic = self.pipeline.topic(), "publish failed: {}", e);
            }
        }
    }
}
