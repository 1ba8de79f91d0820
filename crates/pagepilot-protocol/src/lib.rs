//! # PagePilot Protocol
//!
//! Shared vocabulary of the three PagePilot contexts (UI, Coordinator,
//! Automation). Nothing in this crate performs I/O; it only defines what
//! crosses a context boundary and what the Coordinator owns.
//!
//! ## Contents
//!
//! - [`Envelope`] / [`ResultEnvelope`] - the single wire shape used for
//!   commands, forwarded actions and their outcomes
//! - [`Command`] - UI → Coordinator command surface
//! - [`Action`] / [`ActionOutcome`] - Coordinator ↔ Automation actions
//! - [`ErrorKind`] - the error taxonomy visible to the UI
//! - [`Project`], [`Chat`], [`Message`], [`Image`] - aggregates
//! - [`KeyValueStore`] - the persistence collaborator

pub mod action;
pub mod command;
pub mod envelope;
pub mod error;
pub mod event;
pub mod store;
pub mod types;

pub use action::{
    Action, ActionClass, ActionOutcome, ImageResolution, ResolutionStrategy, ResponseBaseline,
    StrategyAttempt,
};
pub use command::{Command, CommandResult, Exchange, InterfaceStatus};
pub use envelope::{Envelope, ErrorBody, ResultEnvelope, Status};
pub use error::{ErrorKind, ProtocolError, StoreError};
pub use event::DomainEvent;
pub use store::KeyValueStore;
pub use types::*;
