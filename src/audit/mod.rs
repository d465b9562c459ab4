//! Audit Ledger
//!
//! Hash-chained, append-only record of every inventory-affecting action
//! of a brewery. Each brewery owns an independent chain.

pub mod chain;
pub mod digest;
pub mod entry;
pub mod events;
pub mod logger;
pub mod verify;

pub use chain::{append, append_at, create_genesis, create_genesis_at, GENESIS_PREVIOUS_HASH};
pub use digest::digest;
pub use entry::{ActionData, ActionKind, Block};
pub use events::DomainEvent;
pub use logger::AuditLogger;
pub use verify::{check_link, verify, verify_decoded, BreakReason, ValidationResult};
