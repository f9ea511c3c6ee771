//! nestwatch-core: Pure geofence + ledger library for the no-fly-zone monitor.
//!
//! No async, no I/O — just types and algorithms. This crate is the shared
//! core used by `nestwatch-server` (poller + web server).

pub mod feed;
pub mod geofence;
pub mod ledger;
pub mod types;

// Re-export commonly used types at crate root
pub use feed::decode_feed;
pub use geofence::NoFlyZone;
pub use ledger::{ViolationLedger, ViolationRecord, RETENTION_MS, STALENESS_WINDOW_MS};
pub use types::*;
