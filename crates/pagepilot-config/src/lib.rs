//! # PagePilot Config
//!
//! Configuration management for PagePilot: browser endpoint, per-action
//! deadlines, polling cadence, page selectors, image resolution rules,
//! growth limits, storage and logging.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
