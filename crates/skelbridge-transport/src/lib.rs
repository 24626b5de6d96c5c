//! skelbridge transport - UDP ingestion and diagnostics
//!
//! This crate provides:
//! - The frame pipeline (decode -> frame -> transform/encode -> publish)
//! - The live UDP ingestion service with an explicit start/stop lifecycle
//! - A diagnostic listener that checks a producer against the wire contract
//! - A UDP frame sender (producer side)

pub mod diagnostic;
pub mod ingest;
pub mod pipeline;
pub mod sender;

pub use diagnostic::{DiagnosticConfig, DiagnosticListener, DiagnosticReport, PacketReport};
pub use ingest::{IngestConfig, IngestService, IngestStats};
pub use pipeline::FramePipeline;
pub use sender::{SenderConfig, UdpFrameSender};
