//! Aggregate and identifier types owned by the Coordinator.

mod aggregate;
mod ids;
mod record;

pub use aggregate::*;
pub use ids::*;
pub use record::*;
