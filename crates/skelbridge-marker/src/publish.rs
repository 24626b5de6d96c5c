//! Publisher seam towards the visualization bus
//!
//! The bus runs in its own execution context. Publishing is fire-and-forget:
//! a publisher never blocks the caller and never retries.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use skelbridge_core::{BridgeError, BridgeResult, Timestamp};

use crate::MarkerArray;

/// One marker collection addressed to a topic
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topic: String,
    /// Timestamp of the originating frame
    pub timestamp: Timestamp,
    pub markers: MarkerArray,
}

/// Publishes one marker collection per frame
pub trait Publisher: Send + Sync {
    /// Hand a collection to the bus. Must not block.
    fn publish(&self, message: Published) -> BridgeResult<()>;
}

impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    fn publish(&self, message: Published) -> BridgeResult<()> {
        (**self).publish(message)
    }
}

/// Receiving end of a [`ChannelPublisher`], drained by the bus context
pub type PublishedReceiver = mpsc::Receiver<Published>;

/// Publisher backed by a bounded channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<Published>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiver the bus drains
    pub fn channel(capacity: usize) -> (Self, PublishedReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ChannelPublisher { tx }, rx)
    }
}

impl Publisher for ChannelPublisher {
    fn publish(&self, message: Published) -> BridgeResult<()> {
        match self.tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(dropped)) => Err(BridgeError::Publish(format!(
                "bus queue full, dropped {} markers on {}",
                dropped.markers.len(),
                dropped.topic
            ))),
            Err(TrySendError::Closed(_)) => Err(BridgeError::BusClosed),
        }
    }
}
