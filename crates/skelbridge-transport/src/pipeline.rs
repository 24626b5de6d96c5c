//! Per-datagram processing
//!
//! decode -> frame (stamped with receive time) -> markers -> publish.
//! One datagram is processed to completion before the next one.

use skelbridge_core::{BridgeResult, Timestamp};
use skelbridge_marker::{MarkerEncoder, Published, Publisher};
use skelbridge_wire::WirePacket;

/// Stateless datagram processor bound to one topic and publisher
pub struct FramePipeline<P> {
    topic: String,
    encoder: MarkerEncoder,
    publisher: P,
}

impl<P: Publisher> FramePipeline<P> {
    pub fn new(topic: impl Into<String>, encoder: MarkerEncoder, publisher: P) -> Self {
        Self {
            topic: topic.into(),
            encoder,
            publisher,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Process one datagram. Returns the number of markers published.
    ///
    /// Decode errors are returned before anything is published, so a
    /// malformed datagram never yields a partial collection.
    pub fn process(&self, datagram: &[u8], received_at: Timestamp) -> BridgeResult<usize> {
        let frame = WirePacket::decode(datagram)?.into_frame(received_at);
        let markers = self.encoder.encode(&frame);
        let count = markers.len();

        tracing::debug!(
            skeletons = frame.skeleton_count(),
            markers = count,
            "frame encoded"
        );

        self.publisher.publish(Published {
            topic: self.topic.clone(),
            timestamp: frame.timestamp,
            markers,
        })?;

        Ok(count)
    }
}
