//! skelbridge wire - Live skeleton frame wire format
//!
//! Each UDP datagram is one self-contained UTF-8 JSON document:
//!
//! ```text
//! { "skeletons": [ { "id": <int>,
//!                    "joints": { "<name>": { "x": .., "y": .., "z": .., "conf": .. } } } ] }
//! ```
//!
//! `conf` is optional and defaults to 1.0.

pub mod packet;
pub mod shape;

pub use packet::*;
pub use shape::*;
