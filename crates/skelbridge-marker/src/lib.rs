//! skelbridge markers - Frames as visualization marker collections
//!
//! This crate provides:
//! - Marker and marker collection types (sphere per joint)
//! - Stable marker id schemes for vocabulary and free-form joints
//! - The marker collection encoder
//! - A binary payload codec for persisted and forwarded collections
//! - The publisher seam towards the visualization bus

pub mod codec;
pub mod encoder;
pub mod id;
pub mod marker;
pub mod publish;

pub use codec::*;
pub use encoder::*;
pub use id::*;
pub use marker::*;
pub use publish::*;
