//! Per-destination route cache ("Route entry", "Routing table").

pub mod entry;
pub mod table;

pub use entry::{RetryOutcome, RouteEntry};
pub use table::{RouteState, RouteTable};
