//! # PagePilot Coordinator
//!
//! Owns the Project, Chat, Message and Image aggregates and turns UI
//! commands into automation actions.
//!
//! ## Features
//!
//! - Idempotent command handling keyed by correlation id
//! - At most one page action in flight per chat
//! - Per-action-class deadlines with late outcomes discarded
//! - Write-through persistence over any [`KeyValueStore`](pagepilot_protocol::KeyValueStore)

pub mod coordinator;
pub mod error;
pub mod events;
pub mod kv;
pub mod ledger;
pub mod link;
pub mod locks;
pub mod store;
pub mod validation;

pub use coordinator::Coordinator;
pub use error::CoordinatorError;
pub use events::EventBus;
pub use kv::{FileKvStore, MemoryKvStore};
pub use ledger::{Admission, LedgerSlot, OutcomeLedger};
pub use link::{AutomationEndpoint, AutomationLink};
pub use locks::{ChatGuard, ChatLocks};
pub use store::{AggregateStore, Appended};
