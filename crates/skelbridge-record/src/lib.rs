//! skelbridge record - Offline conversion of recorded pose logs
//!
//! Flow: CSV rows -> group by contiguous timestamp -> frame -> markers ->
//! sequential marker log.
//!
//! Rows of one timestamp must be contiguous. Rows are grouped in a single
//! left-to-right pass; out-of-order timestamps split groups rather than
//! being merged.

pub mod convert;
pub mod csv_log;
pub mod group;
pub mod log;

pub use convert::*;
pub use csv_log::*;
pub use group::*;
pub use log::*;
