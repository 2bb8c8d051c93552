//! Reporting sinks
//!
//! The engine pushes phases, progress, violations and auxiliary messages
//! into a [`DrcReporter`]. Returning `false` from a phase or progress report
//! asks the run to stop.

use tracing::{debug, info, warn};

use super::item::DrcViolation;
use crate::rules::Severity;

pub trait DrcReporter {
    /// A provider is starting; `false` cancels the run
    fn report_phase(&mut self, message: &str) -> bool;

    /// Effort done so far out of `total`; `false` cancels the run
    fn report_progress(&mut self, done: usize, total: usize) -> bool;

    fn report_violation(&mut self, violation: DrcViolation);

    /// Informational message that is not a violation
    fn report_aux(&mut self, message: &str);
}

type ProgressCallback = Box<dyn FnMut(usize, usize) -> bool + Send>;

/// Keeps everything it is given
#[derive(Default)]
pub struct CollectingReporter {
    pub violations: Vec<DrcViolation>,
    pub phases: Vec<String>,
    pub messages: Vec<String>,
    pub progress_reports: usize,
    progress: Option<ProgressCallback>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward progress to `callback`, which may cancel by returning false
    pub fn with_progress<F>(callback: F) -> Self
    where
        F: FnMut(usize, usize) -> bool + Send + 'static,
    {
        Self {
            progress: Some(Box::new(callback)),
            ..Self::default()
        }
    }

    pub fn into_violations(self) -> Vec<DrcViolation> {
        self.violations
    }
}

impl DrcReporter for CollectingReporter {
    fn report_phase(&mut self, message: &str) -> bool {
        self.phases.push(message.to_string());
        true
    }

    fn report_progress(&mut self, done: usize, total: usize) -> bool {
        self.progress_reports += 1;
        match self.progress.as_mut() {
            Some(callback) => callback(done, total),
            None => true,
        }
    }

    fn report_violation(&mut self, violation: DrcViolation) {
        self.violations.push(violation);
    }

    fn report_aux(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Logs every event through `tracing` before passing it on
pub struct LogReporter<R> {
    inner: R,
}

impl<R: DrcReporter> LogReporter<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: DrcReporter> DrcReporter for LogReporter<R> {
    fn report_phase(&mut self, message: &str) -> bool {
        info!("{}", message);
        let keep_going = self.inner.report_phase(message);
        if !keep_going {
            warn!("Cancelled during phase: {}", message);
        }
        keep_going
    }

    fn report_progress(&mut self, done: usize, total: usize) -> bool {
        debug!("Progress {}/{}", done, total);
        self.inner.report_progress(done, total)
    }

    fn report_violation(&mut self, violation: DrcViolation) {
        match violation.severity {
            Severity::Error => warn!(code = %violation.code, "{}", violation.message),
            _ => info!(code = %violation.code, "{}", violation.message),
        }
        self.inner.report_violation(violation);
    }

    fn report_aux(&mut self, message: &str) {
        info!("{}", message);
        self.inner.report_aux(message);
    }
}
