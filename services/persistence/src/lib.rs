//! Audit persistence for the simulated exchange
//!
//! Append-only record of orders, trades, and user state changes. The engine
//! never writes here; the caller of `place_order` / `cancel_order` builds an
//! [`records::AuditEvent`] batch from the engine's report and commits it as
//! a single transaction via [`journal::Journal::commit`].

pub mod journal;
pub mod reader;
pub mod records;

pub use journal::{Journal, JournalConfig, JournalEntry, JournalError};
pub use reader::JournalReader;
pub use records::{AuditEvent, OrderRecord, TradeRecord, UserRecord};
