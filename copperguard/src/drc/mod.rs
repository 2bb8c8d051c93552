//! Design Rule Check pipeline
//!
//! - [`item`]: violations and error codes
//! - [`reporter`]: sinks receiving phases, progress and violations
//! - [`provider`]: the provider trait and the per-run context
//! - [`providers`]: the bundled checks
//! - [`engine`]: runs providers in order

pub mod engine;
pub mod item;
pub mod provider;
pub mod providers;
pub mod reporter;

pub use engine::{DrcEngine, DrcSummary, RunOutcome};
pub use item::{DrcViolation, ErrorCode, ViolationBuilder};
pub use provider::{DrcContext, DrcTestProvider};
pub use reporter::{CollectingReporter, DrcReporter, LogReporter};
