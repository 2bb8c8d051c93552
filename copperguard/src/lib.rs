//! CopperGuard - PCB design rule check engine
//!
//! This library checks manufacturing and electrical constraints on a PCB
//! layout: annular ring width, hole size, via diameter, track width and
//! copper clearance. Constraints come from a priority-ordered rule set;
//! the board is a read-only JSON snapshot.
//!
//! # Quick Start
//!
//! ```no_run
//! use copperguard::{DrcCore, DrcOptions};
//! use std::path::Path;
//!
//! let report = DrcCore::check_files(
//!     Path::new("board.json"),
//!     Some(Path::new("rules.json")),
//!     None,
//! ).unwrap();
//!
//! for violation in &report.violations {
//!     println!("{:?}: {}", violation.severity, violation.message);
//! }
//! # let _ = DrcOptions::default();
//! ```
//!
//! # Features
//!
//! - **Annular width**: analytic, polygon and multi-pad aggregate methods
//! - **Clearance**: R-tree prefiltered copper-to-copper distances
//! - **Rules**: JSON rule sets with conditions and board defaults
//! - **Host integration**: progress reporting and cooperative cancellation

pub mod board;
pub mod core;
pub mod drc;
pub mod geometry;
pub mod rules;

// Re-export main types
pub use board::{Board, BoardItem, ItemKind};
pub use core::{DrcCore, DrcError, DrcOptions, DrcReport, ViolationStats};
pub use drc::{
    CollectingReporter, DrcContext, DrcEngine, DrcReporter, DrcSummary, DrcTestProvider,
    DrcViolation, ErrorCode, LogReporter, RunOutcome,
};
pub use rules::{
    generate_sample_rules, Constraint, ConstraintKind, ConstraintResolver, RuleResolver, RuleSet,
    Severity,
};

/// Load a board snapshot (convenience wrapper).
pub fn load_board(path: &std::path::Path) -> Result<Board, DrcError> {
    DrcCore::load_board(path)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Board, ConstraintResolver, DrcCore, DrcEngine, DrcError, DrcOptions, DrcReport,
        DrcViolation, ErrorCode, RuleResolver, RuleSet, Severity,
    };
}
