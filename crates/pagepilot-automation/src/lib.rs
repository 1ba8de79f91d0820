//! # PagePilot Automation
//!
//! The automation context: drives one browser tab of the target chat site.
//!
//! ```text
//! ┌──────────────┐  Envelope{Action}   ┌───────────────────┐   CDP    ┌────────┐
//! │ Coordinator  │ ──────────────────► │ AutomationService │ ───────► │ Chrome │
//! │              │ ◄────────────────── │  ActionExecutor   │          │  tab   │
//! └──────────────┘  ResultEnvelope     └───────────────────┘          └────────┘
//! ```
//!
//! Page access goes through the [`Page`] trait. [`CdpPage`] implements it
//! over the Chrome DevTools Protocol; [`ScriptedPage`] is an in-memory
//! stand-in used by tests and demos.

pub mod cdp;
mod error;
mod executor;
mod page;
mod poll;
mod resolve;
mod scripted;
mod service;

pub use cdp::{CdpClient, CdpError, CdpPage};
pub use error::AutomationFailure;
pub use executor::{ActionExecutor, ResponseSample, StabilityTracker};
pub use page::{count_matches, first_match, last_match, matching_selector, ElementRef, Page, PageError};
pub use poll::{poll_until, PollPolicy, Polled};
pub use resolve::{largest_srcset_candidate, ImageResolver, ResolutionReport};
pub use scripted::{PageModel, PageOp, ScriptedElement, ScriptedPage};
pub use service::AutomationService;
