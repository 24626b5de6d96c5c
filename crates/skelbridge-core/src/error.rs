//! Error types for skelbridge

use std::net::SocketAddr;

use thiserror::Error;

/// Core skelbridge errors
#[derive(Error, Debug)]
pub enum BridgeError {
    // Transport errors
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    // Decode errors
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Invalid CSV row {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    // Schema errors
    #[error("Schema violation: {0}")]
    Schema(String),

    // Output errors
    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Bus closed")]
    BusClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log format: {0}")]
    LogFormat(String),

    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
}

impl BridgeError {
    /// Decode-class errors discard one unit of input and never stop processing.
    pub fn is_discardable(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidPacket(_) | BridgeError::InvalidRow { .. } | BridgeError::Schema(_)
        )
    }
}

/// Result type for skelbridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
