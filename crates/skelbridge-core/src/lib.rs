//! skelbridge core - Fundamental types and primitives
//!
//! This crate defines the types shared by the live and offline paths:
//! - Joint vocabulary (17 COCO landmarks) and joint keys
//! - Skeletons and frames, with the joint validity rule
//! - Camera space to bus space coordinate transform
//! - Timestamps and bus time
//! - Error taxonomy

pub mod error;
pub mod frame;
pub mod joint;
pub mod time;
pub mod transform;

pub use error::*;
pub use frame::*;
pub use joint::*;
pub use time::*;
pub use transform::*;
