//! DRC orchestration
//!
//! The engine owns an ordered list of providers and runs them one after the
//! other against a board, stopping early if the host cancels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::item::ErrorCode;
use super::provider::{DrcContext, DrcTestProvider};
use super::providers::{
    AnnularWidthProvider, CopperClearanceProvider, HoleSizeProvider, TrackWidthProvider,
    ViaDiameterProvider,
};
use super::reporter::DrcReporter;
use crate::board::Board;
use crate::core::DrcOptions;
use crate::rules::{ConstraintResolver, Severity};

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Cancelled,
    Clean,
    Violations(usize),
}

/// What happened during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrcSummary {
    /// False when the host cancelled
    pub completed: bool,
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub by_code: BTreeMap<ErrorCode, usize>,
    pub providers_run: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DrcSummary {
    pub fn outcome(&self) -> RunOutcome {
        if !self.completed {
            RunOutcome::Cancelled
        } else if self.total == 0 {
            RunOutcome::Clean
        } else {
            RunOutcome::Violations(self.total)
        }
    }

    pub fn count(&self, code: ErrorCode) -> usize {
        self.by_code.get(&code).copied().unwrap_or(0)
    }
}

pub struct DrcEngine {
    providers: Vec<Arc<dyn DrcTestProvider>>,
    options: DrcOptions,
}

impl DrcEngine {
    pub fn new(options: DrcOptions) -> Self {
        Self {
            providers: Vec::new(),
            options,
        }
    }

    pub fn with_default_providers(options: DrcOptions) -> Self {
        let mut engine = Self::new(options);
        engine.add_provider(Arc::new(TrackWidthProvider));
        engine.add_provider(Arc::new(ViaDiameterProvider));
        engine.add_provider(Arc::new(HoleSizeProvider));
        engine.add_provider(Arc::new(AnnularWidthProvider));
        engine.add_provider(Arc::new(CopperClearanceProvider));
        engine
    }

    pub fn add_provider(&mut self, provider: Arc<dyn DrcTestProvider>) {
        self.providers.push(provider);
    }

    pub fn providers(&self) -> &[Arc<dyn DrcTestProvider>] {
        &self.providers
    }

    pub fn options(&self) -> &DrcOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut DrcOptions {
        &mut self.options
    }

    fn is_enabled(&self, provider: &dyn DrcTestProvider) -> bool {
        self.options.providers.is_empty()
            || self.options.providers.iter().any(|p| p == provider.name())
    }

    /// Run every enabled provider in order. The board must already be
    /// validated.
    pub fn run(
        &self,
        board: &Board,
        resolver: &dyn ConstraintResolver,
        reporter: &mut dyn DrcReporter,
    ) -> DrcSummary {
        let started_at = Utc::now();
        let mut ctx = DrcContext::new(board, resolver, &self.options, reporter);
        let mut providers_run = Vec::new();
        let mut completed = true;

        for provider in &self.providers {
            if !self.is_enabled(provider.as_ref()) {
                debug!("Provider {} disabled", provider.name());
                continue;
            }

            if !ctx.report_phase(provider.description()) {
                completed = false;
                break;
            }

            providers_run.push(provider.name().to_string());

            if !provider.run(&mut ctx) {
                completed = false;
                break;
            }
        }

        if !completed {
            warn!("DRC cancelled after {} provider(s)", providers_run.len());
        }

        let by_code = ctx.counts_by_code().clone();
        let by_severity = ctx.counts_by_severity();
        let errors = by_severity.get(&Severity::Error).copied().unwrap_or(0);
        let warnings = by_severity.get(&Severity::Warning).copied().unwrap_or(0);
        let total = by_code.values().sum();

        info!(
            "DRC {}: {} violation(s) ({} errors, {} warnings)",
            if completed { "finished" } else { "cancelled" },
            total,
            errors,
            warnings
        );

        DrcSummary {
            completed,
            total,
            errors,
            warnings,
            by_code,
            providers_run,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

impl Default for DrcEngine {
    fn default() -> Self {
        Self::with_default_providers(DrcOptions::default())
    }
}
