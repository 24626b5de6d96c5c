//! skelbridge runtime - Process wiring for the bridge tools
//!
//! This crate provides:
//! - Configuration and command line arguments
//! - Tracing initialisation
//! - The bus pump draining published marker collections
//! - CSV replay over UDP

pub mod bus;
pub mod config;
pub mod logging;
pub mod replay;

pub use bus::*;
pub use config::*;
pub use logging::*;
pub use replay::*;
