//! Core DRC API shared by the CLI and embedding hosts.
//! Loads inputs, runs the engine and packages the results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::board::Board;
use crate::drc::{CollectingReporter, DrcEngine, DrcSummary, DrcViolation, ErrorCode, LogReporter};
use crate::rules::{RuleResolver, RuleSet, Severity};

#[derive(Debug, thiserror::Error)]
pub enum DrcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Rule set error: {0}")]
    Rules(String),
    #[error("Board error: {0}")]
    Board(String),
    #[error("{0}")]
    Other(String),
}

/// Engine settings. Usually embedded in a rule set as `settings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrcOptions {
    /// Maximum violations reported per error code
    #[serde(default)]
    pub error_limit: Option<usize>,
    /// Effort units between progress reports
    #[serde(default = "default_progress_delta")]
    pub progress_delta: usize,
    /// Maximum polygon approximation error (mm)
    #[serde(default = "default_max_error")]
    pub max_error: f64,
    /// Providers to run by name; empty runs all
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub severity_overrides: BTreeMap<ErrorCode, Severity>,
}

fn default_progress_delta() -> usize {
    500
}

fn default_max_error() -> f64 {
    crate::geometry::DEFAULT_MAX_ERROR
}

impl DrcOptions {
    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), DrcError> {
        if !self.max_error.is_finite() || self.max_error < crate::geometry::MIN_MAX_ERROR {
            return Err(DrcError::Rules(format!(
                "max_error must be a finite value of at least {} mm, got {}",
                crate::geometry::MIN_MAX_ERROR,
                self.max_error
            )));
        }
        Ok(())
    }
}

impl Default for DrcOptions {
    fn default() -> Self {
        Self {
            error_limit: None,
            progress_delta: default_progress_delta(),
            max_error: default_max_error(),
            providers: vec![],
            severity_overrides: BTreeMap::new(),
        }
    }
}

/// Result of checking one board
#[derive(Debug, Clone, Serialize)]
pub struct DrcReport {
    pub board: String,
    pub rule_set: String,
    pub summary: DrcSummary,
    pub violations: Vec<DrcViolation>,
    /// Informational messages, e.g. checks skipped for lack of rules
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ViolationStats {
    pub errors: usize,
    pub warnings: usize,
}

impl DrcReport {
    pub fn stats(&self) -> ViolationStats {
        ViolationStats {
            errors: self.summary.errors,
            warnings: self.summary.warnings,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    pub fn has_warnings_or_errors(&self) -> bool {
        self.summary.errors > 0 || self.summary.warnings > 0
    }

    pub fn total_violations(&self) -> usize {
        self.violations.len()
    }
}

/// Core DRC API used by the CLI.
pub struct DrcCore;

impl DrcCore {
    /// Read and validate a board snapshot
    pub fn load_board(path: &Path) -> Result<Board, DrcError> {
        let content = std::fs::read_to_string(path)?;
        let mut board = Board::from_json_str(&content)?;
        if board.filename.is_empty() {
            board.filename = path.display().to_string();
        }
        Ok(board)
    }

    pub fn load_rules(path: &Path) -> Result<RuleSet, DrcError> {
        RuleSet::from_file(path)
    }

    /// Check a board against a rule set with the given options
    pub fn check_board(
        board: &Board,
        rules: &RuleSet,
        options: DrcOptions,
    ) -> Result<DrcReport, DrcError> {
        board.validate()?;
        options.validate()?;

        info!(
            "Checking {} against '{}' ({} rules)",
            board.filename,
            rules.name,
            rules.rules.len()
        );

        let engine = DrcEngine::with_default_providers(options);
        let resolver = RuleResolver::new(rules, board);
        let mut reporter = LogReporter::new(CollectingReporter::new());
        let summary = engine.run(board, &resolver, &mut reporter);
        let collected = reporter.into_inner();

        Ok(DrcReport {
            board: board.filename.clone(),
            rule_set: rules.name.clone(),
            summary,
            violations: collected.violations,
            messages: collected.messages,
        })
    }

    /// Load both files and check. Without a rule file there are no
    /// constraints and every provider skips. `options` replaces the rule
    /// set's own settings when given.
    pub fn check_files(
        board_path: &Path,
        rules_path: Option<&Path>,
        options: Option<DrcOptions>,
    ) -> Result<DrcReport, DrcError> {
        let board = Self::load_board(board_path)?;
        let rules = match rules_path {
            Some(path) => Self::load_rules(path)?,
            None => RuleSet::default(),
        };
        let options = options.unwrap_or_else(|| rules.settings.clone());
        Self::check_board(&board, &rules, options)
    }
}
