//! Append-only audit trail.
//!
//! Every governance log is a JSON array of records. Writers never patch a file
//! in place: they read the whole sequence, append, and write the whole
//! sequence back. Anything unreadable on the way in counts as an empty log.

mod backend;
mod names;
mod store;

pub use backend::{FileBackend, MemoryBackend, StoreBackend};
pub use names::LogName;
pub use store::AuditStore;
