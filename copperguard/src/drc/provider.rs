//! Provider contract and per-run context

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::item::{DrcViolation, ErrorCode};
use super::reporter::DrcReporter;
use crate::board::Board;
use crate::core::DrcOptions;
use crate::rules::{ConstraintResolver, Severity};

/// One category of checks (annular width, clearance, ...)
pub trait DrcTestProvider: Send + Sync {
    /// Short identifier used to enable or disable the provider
    fn name(&self) -> &str;

    /// Phase text announced before the provider runs
    fn description(&self) -> &str;

    fn error_codes(&self) -> &[ErrorCode];

    /// Run every check. Returns `false` only when cancelled.
    fn run(&self, ctx: &mut DrcContext<'_>) -> bool;
}

/// Everything a provider sees during one run: the board, the resolver and
/// the reporting sink, plus the run-wide bookkeeping (progress throttling,
/// cancellation, error limits, severity overrides).
pub struct DrcContext<'a> {
    board: &'a Board,
    resolver: &'a dyn ConstraintResolver,
    options: &'a DrcOptions,
    reporter: &'a mut dyn DrcReporter,
    cancelled: bool,
    next_progress: usize,
    last_done: usize,
    by_code: BTreeMap<ErrorCode, usize>,
    by_severity: BTreeMap<Severity, usize>,
}

impl<'a> DrcContext<'a> {
    pub fn new(
        board: &'a Board,
        resolver: &'a dyn ConstraintResolver,
        options: &'a DrcOptions,
        reporter: &'a mut dyn DrcReporter,
    ) -> Self {
        Self {
            board,
            resolver,
            options,
            reporter,
            cancelled: false,
            next_progress: 0,
            last_done: 0,
            by_code: BTreeMap::new(),
            by_severity: BTreeMap::new(),
        }
    }

    pub fn board(&self) -> &'a Board {
        self.board
    }

    pub fn resolver(&self) -> &'a dyn ConstraintResolver {
        self.resolver
    }

    pub fn options(&self) -> &'a DrcOptions {
        self.options
    }

    /// Maximum polygon approximation error (mm)
    pub fn max_error(&self) -> f64 {
        self.options.max_error
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn report_phase(&mut self, message: &str) -> bool {
        if self.cancelled {
            return false;
        }
        self.next_progress = 0;
        self.last_done = 0;
        if !self.reporter.report_phase(message) {
            self.cancel();
        }
        !self.cancelled
    }

    pub fn report_aux(&mut self, message: &str) {
        self.reporter.report_aux(message);
    }

    /// Forward progress to the sink every `progress_delta` effort units.
    /// Returns `false` once the run has been cancelled.
    pub fn report_progress(&mut self, done: usize, total: usize) -> bool {
        if self.cancelled {
            return false;
        }

        // A new pass restarted its count
        if done < self.last_done {
            self.next_progress = 0;
        }
        self.last_done = done;

        if done < self.next_progress && done < total {
            return true;
        }

        self.next_progress = done + self.options.progress_delta.max(1);
        if !self.reporter.report_progress(done, total) {
            self.cancel();
        }
        !self.cancelled
    }

    fn cancel(&mut self) {
        warn!("DRC run cancelled by host");
        self.cancelled = true;
    }

    /// True once `code` has been reported as often as the error limit allows
    pub fn is_error_limit_exceeded(&self, code: ErrorCode) -> bool {
        match self.options.error_limit {
            Some(limit) => self.count(code) >= limit,
            None => false,
        }
    }

    pub fn count(&self, code: ErrorCode) -> usize {
        self.by_code.get(&code).copied().unwrap_or(0)
    }

    /// Apply severity overrides and the error limit, then hand the violation
    /// to the sink
    pub fn report_violation(&mut self, violation: DrcViolation) {
        let severity = self
            .options
            .severity_overrides
            .get(&violation.code)
            .copied()
            .unwrap_or(violation.severity);

        if severity == Severity::Ignore {
            debug!(code = %violation.code, "Violation ignored by severity override");
            return;
        }

        if self.is_error_limit_exceeded(violation.code) {
            return;
        }

        *self.by_code.entry(violation.code).or_insert(0) += 1;
        *self.by_severity.entry(severity).or_insert(0) += 1;

        let violation = if severity != violation.severity {
            violation.with_severity(severity)
        } else {
            violation
        };
        self.reporter.report_violation(violation);
    }

    pub fn counts_by_code(&self) -> &BTreeMap<ErrorCode, usize> {
        &self.by_code
    }

    pub fn counts_by_severity(&self) -> &BTreeMap<Severity, usize> {
        &self.by_severity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drc::reporter::CollectingReporter;
    use crate::rules::{RuleResolver, RuleSet};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_progress_is_throttled() {
        let board = Board::default();
        let rules = RuleSet::default();
        let resolver = RuleResolver::new(&rules, &board);
        let options = DrcOptions {
            progress_delta: 10,
            ..DrcOptions::default()
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut reporter = CollectingReporter::with_progress(move |done, _| {
            sink.lock().unwrap().push(done);
            true
        });

        let mut ctx = DrcContext::new(&board, &resolver, &options, &mut reporter);
        for done in 0..25 {
            assert!(ctx.report_progress(done, 25));
        }
        assert!(ctx.report_progress(25, 25));

        assert_eq!(*seen.lock().unwrap(), vec![0, 10, 20, 25]);
    }

    #[test]
    fn test_cancellation_latches() {
        let board = Board::default();
        let rules = RuleSet::default();
        let resolver = RuleResolver::new(&rules, &board);
        let options = DrcOptions {
            progress_delta: 1,
            ..DrcOptions::default()
        };
        let mut reporter = CollectingReporter::with_progress(|_, _| false);

        let mut ctx = DrcContext::new(&board, &resolver, &options, &mut reporter);
        assert!(!ctx.report_progress(0, 5));
        assert!(ctx.is_cancelled());
        assert!(!ctx.report_phase("next"));
    }

    #[test]
    fn test_error_limit_and_overrides() {
        let board = Board::default();
        let rules = RuleSet::default();
        let resolver = RuleResolver::new(&rules, &board);
        let mut options = DrcOptions {
            error_limit: Some(1),
            ..DrcOptions::default()
        };
        options
            .severity_overrides
            .insert(ErrorCode::TrackWidth, Severity::Warning);
        options
            .severity_overrides
            .insert(ErrorCode::Clearance, Severity::Ignore);
        let mut reporter = CollectingReporter::new();

        {
            let mut ctx = DrcContext::new(&board, &resolver, &options, &mut reporter);
            for x in 0..3 {
                ctx.report_violation(
                    DrcViolation::builder(ErrorCode::TrackWidth)
                        .position(crate::board::Position::new(x as f64, 0.0))
                        .build(),
                );
            }
            ctx.report_violation(DrcViolation::builder(ErrorCode::Clearance).build());

            assert!(ctx.is_error_limit_exceeded(ErrorCode::TrackWidth));
            assert!(!ctx.is_error_limit_exceeded(ErrorCode::Clearance));
            assert_eq!(ctx.counts_by_severity().get(&Severity::Warning), Some(&1));
        }

        assert_eq!(reporter.violations.len(), 1);
        assert_eq!(reporter.violations[0].severity, Severity::Warning);
    }
}
