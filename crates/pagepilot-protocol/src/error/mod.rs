//! Error types for the PagePilot protocol layer.

mod kind;
mod protocol;
mod store;

pub use kind::*;
pub use protocol::*;
pub use store::*;
