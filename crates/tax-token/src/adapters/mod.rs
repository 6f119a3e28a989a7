//! # Adapters
//!
//! In-memory implementations of the outbound ports. Hosts embedding the
//! ledger supply their own adapters for persistent roles, observers and
//! asset custody.

pub mod access_control;
pub mod clock;
pub mod event_log;
pub mod vault;

pub use access_control::InMemoryAccessControl;
pub use clock::{ManualClock, SystemClock};
pub use event_log::InMemoryEventLog;
pub use vault::InMemoryVault;
