//! Append-only event journal and subscriber feed.
//!
//! The journal is the audit trail of the ledger: one immutable record per
//! committed mutation, in exact commit order, replayable from any sequence
//! number. The bus is the delivery mechanism for live subscribers and sits
//! strictly after commit; it never participates in the transactional write
//! path.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod journal;
pub mod record;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
pub use journal::EventJournal;
pub use record::EventRecord;
